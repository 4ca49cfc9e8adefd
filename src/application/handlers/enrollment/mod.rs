//! Enrollment flow handlers - idempotent course-access provisioning.

mod provision_for_member;

pub use provision_for_member::{
    ProvisionCourseAccessCommand, ProvisionCourseAccessHandler, ProvisionCourseAccessResult,
};
