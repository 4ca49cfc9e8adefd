//! Organization domain - the parent record of all memberships.

mod aggregate;
mod status;

pub use aggregate::{Organization, OrganizationKind};
pub use status::SubscriptionStatus;
