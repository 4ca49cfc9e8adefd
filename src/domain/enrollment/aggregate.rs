//! Enrollment aggregate entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, EnrollmentId, OrganizationId, Timestamp, UserId};

/// One user's enrollment in one course.
///
/// The id is derived from the (user, course) pair, so provisioning the same
/// pair twice produces the same record identity. Inserts go through the
/// store's `insert_if_absent`, which makes provisioning passes idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Derived identity; stable for the (user, course) pair.
    pub id: EnrollmentId,

    /// Enrolled user.
    pub user_id: UserId,

    /// Enrolled course.
    pub course_id: CourseId,

    /// The organization whose membership granted this enrollment, when it
    /// was provisioned through one.
    pub organization_id: Option<OrganizationId>,

    /// Whether the enrollment currently counts.
    pub active: bool,

    /// When the enrollment was provisioned.
    pub enrolled_at: Timestamp,
}

impl Enrollment {
    /// Provisions an active enrollment attributed to an organization.
    pub fn provision(
        user_id: UserId,
        course_id: CourseId,
        organization_id: OrganizationId,
    ) -> Self {
        Self {
            id: EnrollmentId::derive(&user_id, &course_id),
            user_id,
            course_id,
            organization_id: Some(organization_id),
            active: true,
            enrolled_at: Timestamp::now(),
        }
    }
}
