//! Enrollment domain - course access records provisioned for members.

mod aggregate;

pub use aggregate::Enrollment;
