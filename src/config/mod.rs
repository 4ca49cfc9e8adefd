//! Application configuration module.
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `ACCESS_ENGINE`
//! prefix and `__` as the nesting separator.
//!
//! # Example
//!
//! ```no_run
//! use access_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod email;
mod error;
mod invites;
mod payment;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use invites::InviteConfig;
pub use payment::PaymentConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration (PostgreSQL connection).
    pub database: DatabaseConfig,

    /// Payment webhook configuration.
    pub payment: PaymentConfig,

    /// Email configuration (Resend).
    pub email: EmailConfig,

    /// Invitation lifetimes and limits.
    #[serde(default)]
    pub invites: InviteConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Reads a `.env` file first when present, then environment variables
    /// with the `ACCESS_ENGINE` prefix:
    ///
    /// - `ACCESS_ENGINE__DATABASE__URL=...` -> `database.url`
    /// - `ACCESS_ENGINE__INVITES__TEAM_MEMBER_CAP=25` -> `invites.team_member_cap`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ACCESS_ENGINE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates all configuration sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.payment.validate()?;
        self.email.validate()?;
        self.invites.validate()?;
        Ok(())
    }
}
