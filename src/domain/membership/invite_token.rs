//! Single-use invitation token.
//!
//! The token is the sole security boundary of the redemption flow, so it
//! carries 256 bits of OS randomness, hex-encoded. It lives only while the
//! membership is `invited`; redemption and expiry both clear it.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Number of random bytes in a token (256 bits).
const TOKEN_BYTES: usize = 32;

/// A high-entropy single-use invitation secret.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteToken(String);

impl InviteToken {
    /// Generates a fresh token from OS randomness.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parses a token supplied by a redemption caller.
    ///
    /// Only the shape is checked here; whether the token matches a live
    /// invitation is the store's question.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.len() != TOKEN_BYTES * 2 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::invalid_format(
                "invite_token",
                "expected 64 hex characters",
            ));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the encoded token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Debug output is redacted: tokens are secrets and must not leak into logs.
impl fmt::Debug for InviteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InviteToken({}..)", &self.0[..8.min(self.0.len())])
    }
}
