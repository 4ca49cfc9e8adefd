//! Organization store port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrganizationId};
use crate::domain::organization::{Organization, SubscriptionStatus};

/// Repository port for organization persistence.
///
/// Counter adjustments and the subscription-status write are separate,
/// single-field operations rather than whole-record saves: the status write
/// is a pure assignment (safe to replay), and the counter adjustment is
/// atomic so concurrent membership changes cannot lose updates.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Inserts a new organization.
    async fn insert(&self, organization: &Organization) -> Result<(), DomainError>;

    /// Fetches an organization by id.
    async fn get(&self, id: &OrganizationId) -> Result<Option<Organization>, DomainError>;

    /// Resolves an organization from the payment provider's
    /// billing-subscription identifier.
    ///
    /// Returns `None` when no organization has recorded that identifier yet -
    /// callers treat this as retryable, since the webhook can arrive before
    /// the identifier finishes being written.
    async fn find_by_billing_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Organization>, DomainError>;

    /// Unconditionally updates an existing organization record.
    async fn update(&self, organization: &Organization) -> Result<(), DomainError>;

    /// Assigns the subscription status (and optionally the plan) on an
    /// organization.
    ///
    /// A pure assignment, never an increment: applying the same event twice
    /// leaves the record identical to applying it once.
    async fn set_subscription(
        &self,
        id: &OrganizationId,
        status: SubscriptionStatus,
        plan: Option<&str>,
    ) -> Result<(), DomainError>;

    /// Atomically adjusts the member counter by `delta`.
    ///
    /// The counter never drops below zero.
    async fn adjust_member_count(
        &self,
        id: &OrganizationId,
        delta: i32,
    ) -> Result<(), DomainError>;

    /// Atomically claims one member slot: increments the counter, but only
    /// while it is below `cap` when a cap is given.
    ///
    /// Returns `false` when the cap is already reached and nothing was
    /// written. The check and the increment are one atomic operation, so
    /// concurrent claims against the last slot resolve to a single winner.
    /// A claim that is not followed through (the membership write failed)
    /// is released with `adjust_member_count(-1)`.
    async fn reserve_member_slot(
        &self,
        id: &OrganizationId,
        cap: Option<u32>,
    ) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn OrganizationStore) {}
    }
}
