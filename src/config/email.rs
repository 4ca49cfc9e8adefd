//! Email delivery configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Email delivery configuration (Resend).
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key.
    pub resend_api_key: SecretString,

    /// Sender address for invitation emails.
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

fn default_from_address() -> String {
    "invites@skillbridge.example".to_string()
}

impl EmailConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.resend_api_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL_RESEND_API_KEY"));
        }
        if !self.resend_api_key.expose_secret().starts_with("re_") {
            return Err(ValidationError::InvalidEmailApiKey);
        }
        if !self.from_address.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config_passes() {
        let config = EmailConfig {
            resend_api_key: SecretString::from("re_live_key"),
            from_address: "invites@skillbridge.example".to_string(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_api_key_prefix() {
        let config = EmailConfig {
            resend_api_key: SecretString::from("sk_wrong"),
            from_address: default_from_address(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_from_address_without_at() {
        let config = EmailConfig {
            resend_api_key: SecretString::from("re_key"),
            from_address: "not-an-address".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidFromEmail)
        ));
    }
}
