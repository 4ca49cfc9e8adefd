//! Adapters - implementations of the port interfaces.
//!
//! - `postgres` - durable stores backed by PostgreSQL
//! - `memory` - in-memory stores for tests and local development
//! - `email` - outbound invitation email via Resend

pub mod email;
pub mod memory;
pub mod postgres;
