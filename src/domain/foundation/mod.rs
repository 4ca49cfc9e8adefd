//! Foundation types shared across the domain.

mod actor;
mod email;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use actor::Actor;
pub use email::EmailAddress;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CourseId, EnrollmentId, MembershipId, OrganizationId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
