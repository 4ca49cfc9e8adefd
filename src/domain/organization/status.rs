//! Subscription status for organizations.
//!
//! `SubscriptionStatus` is the source of truth for access. Each membership
//! carries a cached `has_access` flag derived from it; the propagator keeps
//! those flags converged after every status change.

use serde::{Deserialize, Serialize};

/// Subscription lifecycle status of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No subscription on record.
    None,
    /// In a trial period; members have access.
    Trialing,
    /// Paid and current; members have access.
    Active,
    /// Last payment failed; access is withdrawn until payment recovers.
    PastDue,
    /// Subscription ended or was cancelled by the provider.
    Canceled,
}

impl SubscriptionStatus {
    /// Whether this status grants members access to purchased content.
    pub fn effective_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }

    /// Maps the payment provider's status vocabulary onto the engine's.
    ///
    /// Anything not explicitly recognized (transitional states like
    /// `incomplete`, or future vocabulary) maps to `None` conservatively:
    /// unknown never grants access.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "trialing" => SubscriptionStatus::Trialing,
            "active" => SubscriptionStatus::Active,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" | "cancelled" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::None,
        }
    }

    /// Stable string form, used for persistence and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(SubscriptionStatus::None),
            "trialing" => Some(SubscriptionStatus::Trialing),
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }
}
