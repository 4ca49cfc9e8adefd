//! In-memory implementation of OrganizationStore.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, Timestamp};
use crate::domain::organization::{Organization, SubscriptionStatus};
use crate::ports::OrganizationStore;

/// In-memory organization store.
pub struct InMemoryOrganizationStore {
    records: RwLock<HashMap<OrganizationId, Organization>>,
}

impl InMemoryOrganizationStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryOrganizationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrganizationStore for InMemoryOrganizationStore {
    async fn insert(&self, organization: &Organization) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        records.insert(organization.id, organization.clone());
        Ok(())
    }

    async fn get(&self, id: &OrganizationId) -> Result<Option<Organization>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn find_by_billing_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Organization>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|o| o.billing_subscription_id.as_deref() == Some(billing_subscription_id))
            .cloned())
    }

    async fn update(&self, organization: &Organization) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        if !records.contains_key(&organization.id) {
            return Err(DomainError::new(
                ErrorCode::OrganizationNotFound,
                "Organization not found",
            ));
        }
        records.insert(organization.id, organization.clone());
        Ok(())
    }

    async fn set_subscription(
        &self,
        id: &OrganizationId,
        status: SubscriptionStatus,
        plan: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        let org = records.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrganizationNotFound, "Organization not found")
        })?;
        org.set_subscription_status(status);
        if let Some(plan) = plan {
            org.subscription_plan = Some(plan.to_string());
        }
        Ok(())
    }

    async fn adjust_member_count(
        &self,
        id: &OrganizationId,
        delta: i32,
    ) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        let org = records.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrganizationNotFound, "Organization not found")
        })?;
        org.member_count = org.member_count.saturating_add_signed(delta);
        org.updated_at = Timestamp::now();
        Ok(())
    }

    async fn reserve_member_slot(
        &self,
        id: &OrganizationId,
        cap: Option<u32>,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let org = records.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrganizationNotFound, "Organization not found")
        })?;
        if matches!(cap, Some(cap) if org.member_count >= cap) {
            return Ok(false);
        }
        org.member_count += 1;
        org.updated_at = Timestamp::now();
        Ok(true)
    }
}
