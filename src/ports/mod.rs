//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store Ports
//!
//! - `MembershipStore` - membership records, token index, conditional commits
//! - `OrganizationStore` - organization records, billing lookup, atomic counters
//! - `EnrollmentStore` - enrollment records with insert-if-absent semantics
//!
//! ## Collaborator Ports
//!
//! - `InviteEmailSender` - outbound invitation email
//! - `WebhookEventRepository` - payment webhook idempotency tracking

mod email_sender;
mod enrollment_store;
mod membership_store;
mod organization_store;
mod webhook_event_repository;

pub use email_sender::{EmailError, InviteEmail, InviteEmailSender};
pub use enrollment_store::EnrollmentStore;
pub use membership_store::{CommitOutcome, MembershipStore};
pub use organization_store::OrganizationStore;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};
