//! Webhook processing error types.

use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors raised while verifying and processing payment webhooks.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Event is older than the acceptance window (replay protection).
    #[error("webhook timestamp outside acceptance window")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock-skew tolerance.
    #[error("webhook timestamp in the future")]
    InvalidTimestamp,

    /// Header or payload could not be parsed.
    #[error("webhook parse error: {0}")]
    ParseError(String),

    /// Event acknowledged but intentionally not acted on.
    #[error("webhook ignored: {0}")]
    Ignored(String),

    /// No organization has recorded this billing-subscription id yet.
    ///
    /// Retryable: the event may have raced the checkout flow that records
    /// the identifier. The provider's redelivery will find it.
    #[error("no organization linked to billing subscription {0}")]
    SubscriptionNotLinked(String),

    /// Store failure. Retryable.
    #[error("webhook store error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Whether the provider should redeliver this event.
    ///
    /// Retryable errors are never recorded in the idempotency table, so a
    /// redelivery gets a full reprocessing pass.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::SubscriptionNotLinked(_) | WebhookError::Database(_)
        )
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}
