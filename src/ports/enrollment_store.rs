//! Enrollment store port.

use async_trait::async_trait;

use crate::domain::foundation::{CourseId, DomainError, UserId};
use crate::domain::enrollment::Enrollment;

/// Repository port for enrollment persistence.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Inserts an enrollment unless one with the same identity exists.
    ///
    /// Enrollment ids are derived deterministically from (user, course), so
    /// this is the idempotency primitive for provisioning: a retried pass
    /// simply gets `false` back for records that already landed.
    ///
    /// Returns `true` if the record was inserted.
    async fn insert_if_absent(&self, enrollment: &Enrollment) -> Result<bool, DomainError>;

    /// Lists all enrollments for a user.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Enrollment>, DomainError>;

    /// Atomically increments a course's enrollment counter.
    ///
    /// Called only when `insert_if_absent` actually inserted, so the counter
    /// stays in step with the record count.
    async fn increment_enrolled_count(&self, course_id: &CourseId) -> Result<(), DomainError>;

    /// Reads a course's enrollment counter.
    async fn enrolled_count(&self, course_id: &CourseId) -> Result<u64, DomainError>;
}
