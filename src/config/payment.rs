//! Payment provider configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment provider configuration.
///
/// Only the webhook side is configured here; the engine never calls the
/// provider's API, it only consumes signed events.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Webhook signing secret from the provider dashboard.
    pub webhook_secret: SecretString,
}

impl PaymentConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret = self.webhook_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_WEBHOOK_SECRET"));
        }
        if !secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        Ok(())
    }
}
