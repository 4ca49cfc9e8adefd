//! Email address value object.
//!
//! Invitations key on (organization, email), so the address must be normalized
//! once at the boundary: trimmed and lower-cased. Two invitations for
//! `Alice@X.com` and `alice@x.com` target the same membership record.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A validated, normalized (lower-case) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and normalizes an email address.
    ///
    /// Validation is intentionally basic: non-empty local part and domain with
    /// a dot, no whitespace. Deliverability is the email collaborator's problem.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format("email", "contains whitespace"));
        }

        let (local, domain) = normalized
            .split_once('@')
            .ok_or_else(|| ValidationError::invalid_format("email", "missing @ symbol"))?;

        if local.is_empty() {
            return Err(ValidationError::invalid_format("email", "empty local part"));
        }
        if domain.is_empty() || !domain.contains('.') || domain.starts_with('.') {
            return Err(ValidationError::invalid_format("email", "invalid domain"));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
