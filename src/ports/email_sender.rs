//! Invitation email port.
//!
//! Email delivery is an external collaborator: a send failure is logged by
//! the caller and never unwinds the invitation record - the link can always
//! be resent.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{EmailAddress, Timestamp};

/// Parameters for one invitation email.
#[derive(Debug, Clone)]
pub struct InviteEmail {
    /// Recipient address.
    pub to: EmailAddress,

    /// Display name of the inviting organization.
    pub organization_name: String,

    /// Full redemption link containing the invite token.
    pub invite_link: String,

    /// When the invitation expires.
    pub expires_at: Timestamp,
}

/// Errors from the email collaborator.
#[derive(Debug, Clone, Error)]
pub enum EmailError {
    /// The provider rejected or failed the send.
    #[error("email send failed: {0}")]
    SendFailed(String),

    /// The provider could not be reached.
    #[error("email service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Port for sending invitation emails.
#[async_trait]
pub trait InviteEmailSender: Send + Sync {
    /// Sends one invitation email.
    async fn send(&self, email: &InviteEmail) -> Result<(), EmailError>;
}
