//! In-memory implementation of MembershipStore.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, EmailAddress, ErrorCode, MembershipId, OrganizationId};
use crate::domain::membership::{InviteToken, Membership, MembershipStatus};
use crate::ports::{CommitOutcome, MembershipStore};

/// In-memory membership store.
///
/// `commit_if_status` performs its compare-and-swap under a single write
/// lock, so concurrent redemptions of the same token resolve exactly like
/// the conditional UPDATE in the PostgreSQL adapter: one winner.
pub struct InMemoryMembershipStore {
    records: RwLock<HashMap<MembershipId, Membership>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryMembershipStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn insert(&self, membership: &Membership) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        let duplicate = records.values().any(|m| {
            m.organization_id == membership.organization_id && m.email == membership.email
        });
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::AlreadyMember,
                "A membership already exists for this email",
            ));
        }
        records.insert(membership.id, membership.clone());
        Ok(())
    }

    async fn get(
        &self,
        organization_id: &OrganizationId,
        membership_id: &MembershipId,
    ) -> Result<Option<Membership>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .get(membership_id)
            .filter(|m| &m.organization_id == organization_id)
            .cloned())
    }

    async fn find_by_token(&self, token: &InviteToken) -> Result<Option<Membership>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|m| m.invite_token.as_ref() == Some(token))
            .cloned())
    }

    async fn find_by_email(
        &self,
        organization_id: &OrganizationId,
        email: &EmailAddress,
    ) -> Result<Option<Membership>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|m| &m.organization_id == organization_id && &m.email == email)
            .cloned())
    }

    async fn list_active(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Membership>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|m| {
                &m.organization_id == organization_id && m.status == MembershipStatus::Active
            })
            .cloned()
            .collect())
    }

    async fn count_live(&self, organization_id: &OrganizationId) -> Result<u32, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|m| &m.organization_id == organization_id && m.status.is_live())
            .count() as u32)
    }

    async fn update(&self, membership: &Membership) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        if !records.contains_key(&membership.id) {
            return Err(DomainError::new(
                ErrorCode::MembershipNotFound,
                "Membership not found",
            ));
        }
        records.insert(membership.id, membership.clone());
        Ok(())
    }

    async fn commit_if_status(
        &self,
        membership: &Membership,
        expected: MembershipStatus,
    ) -> Result<CommitOutcome, DomainError> {
        let mut records = self.records.write().await;
        match records.get(&membership.id) {
            Some(current) if current.status == expected => {
                records.insert(membership.id, membership.clone());
                Ok(CommitOutcome::Committed)
            }
            _ => Ok(CommitOutcome::Conflict),
        }
    }

    async fn commit_if_token(
        &self,
        membership: &Membership,
        expected: &InviteToken,
    ) -> Result<CommitOutcome, DomainError> {
        let mut records = self.records.write().await;
        match records.get(&membership.id) {
            Some(current) if current.invite_token.as_ref() == Some(expected) => {
                records.insert(membership.id, membership.clone());
                Ok(CommitOutcome::Committed)
            }
            _ => Ok(CommitOutcome::Conflict),
        }
    }
}
