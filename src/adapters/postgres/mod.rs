//! PostgreSQL adapters - database implementations of the store ports.
//!
//! - `PostgresMembershipStore` - membership records with conditional commits
//! - `PostgresOrganizationStore` - organizations with atomic counter updates
//! - `PostgresEnrollmentStore` - enrollments with insert-if-absent semantics
//! - `PostgresWebhookEventRepository` - webhook dedup keyed on the event id

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

mod enrollment_store;
mod membership_store;
mod organization_store;
mod webhook_event_repository;

pub use enrollment_store::PostgresEnrollmentStore;
pub use membership_store::PostgresMembershipStore;
pub use organization_store::PostgresOrganizationStore;
pub use webhook_event_repository::PostgresWebhookEventRepository;

/// Opens a connection pool per the database configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}
