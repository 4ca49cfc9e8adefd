//! Membership-specific error types.
//!
//! All invitation, redemption, and removal conflicts surface through
//! `MembershipError`. Domain-state conflicts are permanent and reported
//! verbatim to the caller; only `Infrastructure` is retryable.
//!
//! Redemption failures stay distinguishable on purpose: "already used",
//! "expired", and "never existed" drive different guidance for the invitee.

use crate::domain::foundation::{
    DomainError, ErrorCode, MembershipId, OrganizationId, ValidationError,
};

/// Errors raised by invitation and membership operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    /// No acting identity was supplied.
    Unauthenticated,

    /// An active membership already exists for this (organization, email).
    AlreadyMember(String),

    /// The invitation behind this token was already redeemed.
    AlreadyRedeemed,

    /// The invitation deadline has passed.
    InviteExpired,

    /// No live invitation matches the supplied token.
    InvalidToken,

    /// The organization's concurrent member cap would be exceeded.
    CapacityExceeded { limit: u32 },

    /// The organization owner cannot be removed.
    CannotRemoveOwner,

    /// Organization was not found.
    OrganizationNotFound(OrganizationId),

    /// Membership was not found.
    MembershipNotFound(MembershipId),

    /// The acting identity is not allowed to perform this operation.
    PermissionDenied(String),

    /// A supplied argument was malformed.
    ValidationFailed { field: String, message: String },

    /// Requested operation is not legal in the record's current state.
    InvalidState { current: String, attempted: String },

    /// Store or collaborator failure; safe for the caller to retry.
    Infrastructure(String),
}

impl MembershipError {
    pub fn already_member(email: impl Into<String>) -> Self {
        MembershipError::AlreadyMember(email.into())
    }

    pub fn capacity_exceeded(limit: u32) -> Self {
        MembershipError::CapacityExceeded { limit }
    }

    pub fn organization_not_found(id: OrganizationId) -> Self {
        MembershipError::OrganizationNotFound(id)
    }

    pub fn membership_not_found(id: MembershipId) -> Self {
        MembershipError::MembershipNotFound(id)
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        MembershipError::PermissionDenied(reason.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MembershipError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        MembershipError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        MembershipError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            MembershipError::Unauthenticated => ErrorCode::Unauthenticated,
            MembershipError::AlreadyMember(_) => ErrorCode::AlreadyMember,
            MembershipError::AlreadyRedeemed => ErrorCode::AlreadyRedeemed,
            MembershipError::InviteExpired => ErrorCode::InviteExpired,
            MembershipError::InvalidToken => ErrorCode::InvalidToken,
            MembershipError::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            MembershipError::CannotRemoveOwner => ErrorCode::CannotRemoveOwner,
            MembershipError::OrganizationNotFound(_) => ErrorCode::OrganizationNotFound,
            MembershipError::MembershipNotFound(_) => ErrorCode::MembershipNotFound,
            MembershipError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            MembershipError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            MembershipError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            MembershipError::Infrastructure(_) => ErrorCode::Internal,
        }
    }

    /// Returns a user-displayable message.
    pub fn message(&self) -> String {
        match self {
            MembershipError::Unauthenticated => "Authentication required".to_string(),
            MembershipError::AlreadyMember(email) => {
                format!("{} is already an active member", email)
            }
            MembershipError::AlreadyRedeemed => {
                "This invitation link was already used".to_string()
            }
            MembershipError::InviteExpired => "This invitation link has expired".to_string(),
            MembershipError::InvalidToken => {
                "No invitation matches this link".to_string()
            }
            MembershipError::CapacityExceeded { limit } => {
                format!("Member limit of {} reached", limit)
            }
            MembershipError::CannotRemoveOwner => {
                "The organization owner cannot be removed".to_string()
            }
            MembershipError::OrganizationNotFound(id) => {
                format!("Organization not found: {}", id)
            }
            MembershipError::MembershipNotFound(id) => format!("Membership not found: {}", id),
            MembershipError::PermissionDenied(reason) => {
                format!("Permission denied: {}", reason)
            }
            MembershipError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            MembershipError::InvalidState { current, attempted } => {
                format!("Cannot {} a membership in {} state", attempted, current)
            }
            MembershipError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if the caller may safely retry.
    ///
    /// Domain-state conflicts are permanent; only infrastructure failures
    /// are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MembershipError::Infrastructure(_))
    }
}

impl std::fmt::Display for MembershipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MembershipError {}

impl From<ValidationError> for MembershipError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => {
                MembershipError::validation(field, "cannot be empty")
            }
            ValidationError::InvalidFormat { field, reason } => {
                MembershipError::validation(field, reason)
            }
        }
    }
}

impl From<DomainError> for MembershipError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::AlreadyRedeemed => MembershipError::AlreadyRedeemed,
            ErrorCode::InviteExpired => MembershipError::InviteExpired,
            ErrorCode::InvalidToken => MembershipError::InvalidToken,
            ErrorCode::ValidationFailed => MembershipError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => MembershipError::Infrastructure(err.to_string()),
        }
    }
}

impl From<MembershipError> for DomainError {
    fn from(err: MembershipError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
