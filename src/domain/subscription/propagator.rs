//! Subscription status propagation.
//!
//! When a payment event lands, the propagator resolves the affected
//! organization by its billing-subscription id, assigns the new status, and
//! fans the recomputed access flag out to every active membership's cached
//! copy. The status write is a pure assignment and the fan-out only touches
//! flags that actually changed, so replaying an event is a no-op.

use std::sync::Arc;

use futures::future::join_all;

use super::webhook_errors::WebhookError;
use crate::domain::foundation::OrganizationId;
use crate::domain::membership::MembershipStatus;
use crate::domain::organization::SubscriptionStatus;
use crate::ports::{CommitOutcome, MembershipStore, OrganizationStore};

/// What a propagation pass did.
#[derive(Debug, Clone)]
pub struct PropagationOutcome {
    /// Organization the event resolved to.
    pub organization_id: OrganizationId,

    /// Status after the assignment.
    pub status: SubscriptionStatus,

    /// Effective access implied by the new status.
    pub access: bool,

    /// How many membership flags were actually rewritten.
    pub members_updated: u32,

    /// True when this event flipped the organization from no-access to
    /// access. Callers use this to trigger enrollment provisioning.
    pub access_gained: bool,
}

/// Applies a provider-reported subscription status to an organization and
/// its members.
pub struct SubscriptionPropagator {
    organizations: Arc<dyn OrganizationStore>,
    memberships: Arc<dyn MembershipStore>,
}

impl SubscriptionPropagator {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        memberships: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            organizations,
            memberships,
        }
    }

    /// Resolves the organization for `billing_subscription_id` and applies
    /// `provider_status` to it and its active members.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotLinked` when no organization has recorded the
    ///   billing id yet (retryable; the event may have raced checkout)
    /// - `Database` on store failures
    pub async fn apply(
        &self,
        billing_subscription_id: &str,
        provider_status: &str,
        plan: Option<&str>,
    ) -> Result<PropagationOutcome, WebhookError> {
        let organization = self
            .organizations
            .find_by_billing_subscription(billing_subscription_id)
            .await?
            .ok_or_else(|| {
                WebhookError::SubscriptionNotLinked(billing_subscription_id.to_string())
            })?;

        let had_access = organization.effective_access();
        let status = SubscriptionStatus::from_provider(provider_status);
        let access = status.effective_access();

        self.organizations
            .set_subscription(&organization.id, status, plan)
            .await?;

        let members_updated = self.fan_out(&organization.id, access).await?;

        tracing::info!(
            organization_id = %organization.id,
            status = %status.as_str(),
            access,
            members_updated,
            "subscription status propagated"
        );

        Ok(PropagationOutcome {
            organization_id: organization.id,
            status,
            access,
            members_updated,
            access_gained: !had_access && access,
        })
    }

    /// Rewrites the cached access flag on every active membership whose flag
    /// disagrees with `access`. Returns how many records were written.
    ///
    /// Each write is conditioned on the record still being `active`: a member
    /// removed between the snapshot and the write conflicts and is skipped,
    /// instead of being overwritten back to the snapshot's state.
    async fn fan_out(
        &self,
        organization_id: &OrganizationId,
        access: bool,
    ) -> Result<u32, WebhookError> {
        let members = self.memberships.list_active(organization_id).await?;

        let writes = members
            .into_iter()
            .filter_map(|mut member| {
                if member.set_access(access) {
                    Some(async move {
                        self.memberships
                            .commit_if_status(&member, MembershipStatus::Active)
                            .await
                    })
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        let mut updated = 0;
        for result in join_all(writes).await {
            if result? == CommitOutcome::Committed {
                updated += 1;
            }
        }

        Ok(updated)
    }
}
