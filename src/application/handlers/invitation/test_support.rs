//! Shared in-memory fixtures for invitation handler tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::enrollment::Enrollment;
use crate::domain::foundation::{
    Actor, CourseId, DomainError, EmailAddress, EnrollmentId, MembershipId, OrganizationId,
    Timestamp, UserId,
};
use crate::domain::membership::{InviteToken, Membership, MembershipStatus};
use crate::domain::organization::{Organization, OrganizationKind, SubscriptionStatus};
use crate::ports::{
    CommitOutcome, EmailError, EnrollmentStore, InviteEmail, InviteEmailSender, MembershipStore,
    OrganizationStore,
};

pub const OWNER_USER: &str = "user-owner";
pub const OWNER_EMAIL: &str = "owner@acme.test";

pub fn owner_actor() -> Actor {
    Actor::new(OWNER_USER, OWNER_EMAIL).unwrap()
}

pub fn company() -> Organization {
    Organization::create(
        OrganizationId::new(),
        "Acme Corp",
        OrganizationKind::Company,
        UserId::new(OWNER_USER).unwrap(),
    )
}

pub fn team() -> Organization {
    let mut organization = Organization::create(
        OrganizationId::new(),
        "Acme Team",
        OrganizationKind::Team,
        UserId::new(OWNER_USER).unwrap(),
    );
    organization.set_subscription_status(SubscriptionStatus::Active);
    organization
}

pub struct InMemoryOrganizationStore {
    organizations: RwLock<HashMap<OrganizationId, Organization>>,
}

impl InMemoryOrganizationStore {
    pub fn empty() -> Self {
        Self {
            organizations: RwLock::new(HashMap::new()),
        }
    }

    pub fn with(organization: Organization) -> Self {
        let mut map = HashMap::new();
        map.insert(organization.id, organization);
        Self {
            organizations: RwLock::new(map),
        }
    }

    pub async fn member_count(&self, id: &OrganizationId) -> u32 {
        self.organizations.read().await[id].member_count
    }
}

#[async_trait]
impl OrganizationStore for InMemoryOrganizationStore {
    async fn insert(&self, organization: &Organization) -> Result<(), DomainError> {
        self.organizations
            .write()
            .await
            .insert(organization.id, organization.clone());
        Ok(())
    }

    async fn get(&self, id: &OrganizationId) -> Result<Option<Organization>, DomainError> {
        Ok(self.organizations.read().await.get(id).cloned())
    }

    async fn find_by_billing_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Organization>, DomainError> {
        Ok(self
            .organizations
            .read()
            .await
            .values()
            .find(|o| o.billing_subscription_id.as_deref() == Some(billing_subscription_id))
            .cloned())
    }

    async fn update(&self, organization: &Organization) -> Result<(), DomainError> {
        self.organizations
            .write()
            .await
            .insert(organization.id, organization.clone());
        Ok(())
    }

    async fn set_subscription(
        &self,
        id: &OrganizationId,
        status: SubscriptionStatus,
        plan: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut organizations = self.organizations.write().await;
        let organization = organizations
            .get_mut(id)
            .ok_or_else(|| DomainError::internal("organization missing"))?;
        organization.set_subscription_status(status);
        if let Some(plan) = plan {
            organization.subscription_plan = Some(plan.to_string());
        }
        Ok(())
    }

    async fn adjust_member_count(
        &self,
        id: &OrganizationId,
        delta: i32,
    ) -> Result<(), DomainError> {
        let mut organizations = self.organizations.write().await;
        let organization = organizations
            .get_mut(id)
            .ok_or_else(|| DomainError::internal("organization missing"))?;
        organization.member_count = organization.member_count.saturating_add_signed(delta);
        Ok(())
    }

    async fn reserve_member_slot(
        &self,
        id: &OrganizationId,
        cap: Option<u32>,
    ) -> Result<bool, DomainError> {
        let mut organizations = self.organizations.write().await;
        let organization = organizations
            .get_mut(id)
            .ok_or_else(|| DomainError::internal("organization missing"))?;
        if matches!(cap, Some(cap) if organization.member_count >= cap) {
            return Ok(false);
        }
        organization.member_count += 1;
        Ok(true)
    }
}

pub struct InMemoryMembershipStore {
    memberships: RwLock<HashMap<MembershipId, Membership>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self {
            memberships: RwLock::new(HashMap::new()),
        }
    }

    pub async fn by_id(&self, id: &MembershipId) -> Option<Membership> {
        self.memberships.read().await.get(id).cloned()
    }

    pub async fn record_count(&self) -> usize {
        self.memberships.read().await.len()
    }

    pub async fn seed_invited(
        &self,
        organization: &Organization,
        email: &str,
        token: InviteToken,
        expires_at: Timestamp,
    ) -> Membership {
        let membership = Membership::invite(
            MembershipId::new(),
            organization.id,
            EmailAddress::parse(email).unwrap(),
            token,
            expires_at,
        );
        self.memberships
            .write()
            .await
            .insert(membership.id, membership.clone());
        membership
    }

    pub async fn seed_active(&self, organization: &Organization, email: &str) -> Membership {
        let mut membership = Membership::invite(
            MembershipId::new(),
            organization.id,
            EmailAddress::parse(email).unwrap(),
            InviteToken::generate(),
            Timestamp::now().add_days(7),
        );
        let acting_email = membership.email.clone();
        membership
            .redeem(
                UserId::new(format!("user-{email}")).unwrap(),
                &acting_email,
                organization.effective_access(),
                Timestamp::now(),
            )
            .unwrap();
        self.memberships
            .write()
            .await
            .insert(membership.id, membership.clone());
        membership
    }

    pub async fn seed_removed(&self, organization: &Organization, email: &str) -> Membership {
        let mut membership = self.seed_active(organization, email).await;
        membership.remove().unwrap();
        self.memberships
            .write()
            .await
            .insert(membership.id, membership.clone());
        membership
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn insert(&self, membership: &Membership) -> Result<(), DomainError> {
        self.memberships
            .write()
            .await
            .insert(membership.id, membership.clone());
        Ok(())
    }

    async fn get(
        &self,
        organization_id: &OrganizationId,
        membership_id: &MembershipId,
    ) -> Result<Option<Membership>, DomainError> {
        Ok(self
            .memberships
            .read()
            .await
            .get(membership_id)
            .filter(|m| m.organization_id == *organization_id)
            .cloned())
    }

    async fn find_by_token(&self, token: &InviteToken) -> Result<Option<Membership>, DomainError> {
        Ok(self
            .memberships
            .read()
            .await
            .values()
            .find(|m| m.invite_token.as_ref() == Some(token))
            .cloned())
    }

    async fn find_by_email(
        &self,
        organization_id: &OrganizationId,
        email: &EmailAddress,
    ) -> Result<Option<Membership>, DomainError> {
        Ok(self
            .memberships
            .read()
            .await
            .values()
            .find(|m| m.organization_id == *organization_id && m.email == *email)
            .cloned())
    }

    async fn list_active(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Membership>, DomainError> {
        Ok(self
            .memberships
            .read()
            .await
            .values()
            .filter(|m| {
                m.organization_id == *organization_id && m.status == MembershipStatus::Active
            })
            .cloned()
            .collect())
    }

    async fn count_live(&self, organization_id: &OrganizationId) -> Result<u32, DomainError> {
        Ok(self
            .memberships
            .read()
            .await
            .values()
            .filter(|m| m.organization_id == *organization_id && m.status.is_live())
            .count() as u32)
    }

    async fn update(&self, membership: &Membership) -> Result<(), DomainError> {
        self.memberships
            .write()
            .await
            .insert(membership.id, membership.clone());
        Ok(())
    }

    async fn commit_if_status(
        &self,
        membership: &Membership,
        expected: MembershipStatus,
    ) -> Result<CommitOutcome, DomainError> {
        let mut memberships = self.memberships.write().await;
        match memberships.get(&membership.id) {
            Some(current) if current.status == expected => {
                memberships.insert(membership.id, membership.clone());
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
        let mut memberships = self.memberships.write().await;
        match memberships.get(&membership.id) {
            Some(current) if current.invite_token.as_ref() == Some(expected) => {
                memberships.insert(membership.id, membership.clone());
                Ok(CommitOutcome::Committed)
            }
            _ => Ok(CommitOutcome::Conflict),
        }
    }
}

pub struct InMemoryEnrollmentStore {
    enrollments: RwLock<HashMap<EnrollmentId, Enrollment>>,
    counters: RwLock<HashMap<CourseId, u64>>,
}

impl InMemoryEnrollmentStore {
    pub fn new() -> Self {
        Self {
            enrollments: RwLock::new(HashMap::new()),
            counters: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn insert_if_absent(&self, enrollment: &Enrollment) -> Result<bool, DomainError> {
        let mut enrollments = self.enrollments.write().await;
        if enrollments.contains_key(&enrollment.id) {
            Ok(false)
        } else {
            enrollments.insert(enrollment.id, enrollment.clone());
            Ok(true)
        }
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Enrollment>, DomainError> {
        Ok(self
            .enrollments
            .read()
            .await
            .values()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn increment_enrolled_count(&self, course_id: &CourseId) -> Result<(), DomainError> {
        *self.counters.write().await.entry(*course_id).or_insert(0) += 1;
        Ok(())
    }

    async fn enrolled_count(&self, course_id: &CourseId) -> Result<u64, DomainError> {
        Ok(self.counters.read().await.get(course_id).copied().unwrap_or(0))
    }
}

pub struct RecordingEmailSender {
    sent: RwLock<Vec<InviteEmail>>,
    fail: bool,
}

impl RecordingEmailSender {
    pub fn succeeding() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<InviteEmail> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl InviteEmailSender for RecordingEmailSender {
    async fn send(&self, email: &InviteEmail) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::ServiceUnavailable("simulated outage".to_string()));
        }
        self.sent.write().await.push(email.clone());
        Ok(())
    }
}
