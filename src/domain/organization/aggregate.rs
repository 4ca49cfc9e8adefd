//! Organization aggregate entity.
//!
//! An Organization is a company or subscribing team. It owns a subscription
//! status (the source of truth for member access), a member counter, and the
//! set of purchased courses. Memberships reference it; they never own it.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, OrganizationId, Timestamp, UserId};

use super::SubscriptionStatus;

/// Which invitation flow an organization belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationKind {
    /// A company inviting employees.
    Company,
    /// A subscription team inviting members.
    Team,
}

impl OrganizationKind {
    /// Stable string form, used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationKind::Company => "company",
            OrganizationKind::Team => "team",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "company" => Some(OrganizationKind::Company),
            "team" => Some(OrganizationKind::Team),
            _ => None,
        }
    }
}

/// Organization aggregate - the parent record of all memberships.
///
/// # Invariants
///
/// - `subscription_status` is mutated only by the subscription propagator
///   (a pure assignment, so replayed events are no-ops)
/// - `member_count` is adjusted only through atomic store operations in the
///   same transaction as the triggering membership change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier.
    pub id: OrganizationId,

    /// Display name.
    pub name: String,

    /// Company or subscribing team.
    pub kind: OrganizationKind,

    /// User who created (and exclusively owns) this organization.
    pub owner_user_id: UserId,

    /// Current subscription lifecycle status - the source of truth for access.
    pub subscription_status: SubscriptionStatus,

    /// Plan identifier from the payment provider, if subscribed.
    pub subscription_plan: Option<String>,

    /// External billing-subscription identifier used to resolve webhook events.
    pub billing_subscription_id: Option<String>,

    /// Count of invited-or-active memberships.
    pub member_count: u32,

    /// Courses this organization has purchased or been assigned.
    pub purchased_course_ids: Vec<CourseId>,

    /// When the organization was created.
    pub created_at: Timestamp,

    /// When the organization was last updated.
    pub updated_at: Timestamp,
}

impl Organization {
    /// Creates a new organization with no subscription.
    pub fn create(
        id: OrganizationId,
        name: impl Into<String>,
        kind: OrganizationKind,
        owner_user_id: UserId,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            name: name.into(),
            kind,
            owner_user_id,
            subscription_status: SubscriptionStatus::None,
            subscription_plan: None,
            billing_subscription_id: None,
            member_count: 0,
            purchased_course_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the organization's subscription currently grants member access.
    pub fn effective_access(&self) -> bool {
        self.subscription_status.effective_access()
    }

    /// Assigns a new subscription status.
    ///
    /// A pure assignment: applying the same status twice is a no-op, which is
    /// what makes webhook replays safe. Returns true if the status changed.
    pub fn set_subscription_status(&mut self, status: SubscriptionStatus) -> bool {
        if self.subscription_status == status {
            return false;
        }
        self.subscription_status = status;
        self.updated_at = Timestamp::now();
        true
    }

    /// Links the external billing-subscription identifier.
    pub fn link_billing_subscription(&mut self, subscription_id: impl Into<String>) {
        self.billing_subscription_id = Some(subscription_id.into());
        self.updated_at = Timestamp::now();
    }

    /// Whether the given user owns this organization.
    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.owner_user_id == user_id
    }
}
