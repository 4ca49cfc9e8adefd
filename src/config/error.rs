//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Invalid webhook secret format")]
    InvalidWebhookSecret,

    #[error("Invalid email API key format")]
    InvalidEmailApiKey,

    #[error("Invalid from email address")]
    InvalidFromEmail,

    #[error("Invite lifetime must be at least one day")]
    InvalidInviteLifetime,

    #[error("Team member cap must be at least one")]
    InvalidMemberCap,

    #[error("Invite link base must be an absolute http(s) URL")]
    InvalidInviteLinkBase,
}
