//! In-memory adapters - non-durable implementations of the store ports.
//!
//! Used in integration tests and local development. Each mirrors the
//! concurrency semantics of its PostgreSQL counterpart (conditional commit,
//! first-insert-wins dedup, clamped counters) so behavior under races is
//! the same in both.

mod enrollment_store;
mod membership_store;
mod organization_store;
mod webhook_event_repository;

pub use enrollment_store::InMemoryEnrollmentStore;
pub use membership_store::InMemoryMembershipStore;
pub use organization_store::InMemoryOrganizationStore;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
