//! PostgreSQL implementation of EnrollmentStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::enrollment::Enrollment;
use crate::domain::foundation::{
    CourseId, DomainError, EnrollmentId, ErrorCode, OrganizationId, Timestamp, UserId,
};
use crate::ports::EnrollmentStore;

/// PostgreSQL-backed enrollment store.
///
/// `insert_if_absent` is ON CONFLICT DO NOTHING on the primary key; since
/// the key is derived from (user, course), the row count is the idempotency
/// signal provisioning relies on.
pub struct PostgresEnrollmentStore {
    pool: PgPool,
}

impl PostgresEnrollmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EnrollmentRow {
    id: Uuid,
    user_id: String,
    course_id: Uuid,
    organization_id: Option<Uuid>,
    active: bool,
    enrolled_at: DateTime<Utc>,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = DomainError;

    fn try_from(row: EnrollmentRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
        })?;

        Ok(Enrollment {
            id: EnrollmentId::from_uuid(row.id),
            user_id,
            course_id: CourseId::from_uuid(row.course_id),
            organization_id: row.organization_id.map(OrganizationId::from_uuid),
            active: row.active,
            enrolled_at: Timestamp::from_datetime(row.enrolled_at),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl EnrollmentStore for PostgresEnrollmentStore {
    async fn insert_if_absent(&self, enrollment: &Enrollment) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO enrollments (id, user_id, course_id, organization_id, active, enrolled_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(enrollment.id.as_uuid())
        .bind(enrollment.user_id.as_str())
        .bind(enrollment.course_id.as_uuid())
        .bind(enrollment.organization_id.map(|o| *o.as_uuid()))
        .bind(enrollment.active)
        .bind(*enrollment.enrolled_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert enrollment", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Enrollment>, DomainError> {
        let rows: Vec<EnrollmentRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, course_id, organization_id, active, enrolled_at
            FROM enrollments
            WHERE user_id = $1
            ORDER BY enrolled_at
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list enrollments", e))?;

        rows.into_iter().map(Enrollment::try_from).collect()
    }

    async fn increment_enrolled_count(&self, course_id: &CourseId) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO course_enrollment_counts (course_id, enrolled_count)
            VALUES ($1, 1)
            ON CONFLICT (course_id) DO UPDATE
            SET enrolled_count = course_enrollment_counts.enrolled_count + 1
            "#,
        )
        .bind(course_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to increment enrolled count", e))?;

        Ok(())
    }

    async fn enrolled_count(&self, course_id: &CourseId) -> Result<u64, DomainError> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT enrolled_count FROM course_enrollment_counts WHERE course_id = $1",
        )
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read enrolled count", e))?;

        Ok(count.unwrap_or(0).max(0) as u64)
    }
}
