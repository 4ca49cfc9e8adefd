//! Membership lifecycle status.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Status of a membership record.
///
/// `Invited -> Active` happens exactly once, through the redemption
/// transaction. `Removed -> Invited` is the re-invite branch: the same record
/// is reset rather than a duplicate being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Invitation issued; token is live until redeemed or expired.
    Invited,
    /// Invitation redeemed; a user is bound to this record.
    Active,
    /// Removed by the owner, or invitation declined.
    Removed,
}

impl MembershipStatus {
    /// Whether this record counts toward the organization's live membership.
    pub fn is_live(&self) -> bool {
        matches!(self, MembershipStatus::Invited | MembershipStatus::Active)
    }

    /// Stable string form, used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Invited => "invited",
            MembershipStatus::Active => "active",
            MembershipStatus::Removed => "removed",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invited" => Some(MembershipStatus::Invited),
            "active" => Some(MembershipStatus::Active),
            "removed" => Some(MembershipStatus::Removed),
            _ => None,
        }
    }
}

impl StateMachine for MembershipStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use MembershipStatus::*;
        matches!(
            (self, target),
            (Invited, Active) | (Invited, Removed) | (Active, Removed) | (Removed, Invited)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MembershipStatus::*;
        match self {
            Invited => vec![Active, Removed],
            Active => vec![Removed],
            Removed => vec![Invited],
        }
    }
}
