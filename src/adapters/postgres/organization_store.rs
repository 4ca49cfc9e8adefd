//! PostgreSQL implementation of OrganizationStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{CourseId, DomainError, ErrorCode, OrganizationId, Timestamp, UserId};
use crate::domain::organization::{Organization, OrganizationKind, SubscriptionStatus};
use crate::ports::OrganizationStore;

/// PostgreSQL-backed organization store.
///
/// The member counter is adjusted with a single atomic UPDATE clamped at
/// zero, and the subscription write touches only the status/plan columns so
/// replayed webhook events cannot clobber unrelated fields.
pub struct PostgresOrganizationStore {
    pool: PgPool,
}

impl PostgresOrganizationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    kind: String,
    owner_user_id: String,
    subscription_status: String,
    subscription_plan: Option<String>,
    billing_subscription_id: Option<String>,
    member_count: i32,
    purchased_course_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = DomainError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        let kind = parse_kind(&row.kind)?;
        let subscription_status = parse_subscription_status(&row.subscription_status)?;
        let owner_user_id = UserId::new(row.owner_user_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid owner: {}", e))
        })?;

        Ok(Organization {
            id: OrganizationId::from_uuid(row.id),
            name: row.name,
            kind,
            owner_user_id,
            subscription_status,
            subscription_plan: row.subscription_plan,
            billing_subscription_id: row.billing_subscription_id,
            member_count: row.member_count.max(0) as u32,
            purchased_course_ids: row
                .purchased_course_ids
                .into_iter()
                .map(CourseId::from_uuid)
                .collect(),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_kind(s: &str) -> Result<OrganizationKind, DomainError> {
    OrganizationKind::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid organization kind: {}", s),
        )
    })
}

fn parse_subscription_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    SubscriptionStatus::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status: {}", s),
        )
    })
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, kind, owner_user_id, subscription_status, subscription_plan,
           billing_subscription_id, member_count, purchased_course_ids,
           created_at, updated_at
    FROM organizations
"#;

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl OrganizationStore for PostgresOrganizationStore {
    async fn insert(&self, organization: &Organization) -> Result<(), DomainError> {
        let course_ids: Vec<Uuid> = organization
            .purchased_course_ids
            .iter()
            .map(|c| *c.as_uuid())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO organizations (
                id, name, kind, owner_user_id, subscription_status, subscription_plan,
                billing_subscription_id, member_count, purchased_course_ids,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(organization.id.as_uuid())
        .bind(&organization.name)
        .bind(organization.kind.as_str())
        .bind(organization.owner_user_id.as_str())
        .bind(organization.subscription_status.as_str())
        .bind(&organization.subscription_plan)
        .bind(&organization.billing_subscription_id)
        .bind(organization.member_count as i32)
        .bind(&course_ids)
        .bind(*organization.created_at.as_datetime())
        .bind(*organization.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert organization", e))?;

        Ok(())
    }

    async fn get(&self, id: &OrganizationId) -> Result<Option<Organization>, DomainError> {
        let row: Option<OrganizationRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch organization", e))?;

        row.map(Organization::try_from).transpose()
    }

    async fn find_by_billing_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Organization>, DomainError> {
        let row: Option<OrganizationRow> = sqlx::query_as(&format!(
            "{} WHERE billing_subscription_id = $1",
            SELECT_COLUMNS
        ))
        .bind(billing_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to resolve billing subscription", e))?;

        row.map(Organization::try_from).transpose()
    }

    async fn update(&self, organization: &Organization) -> Result<(), DomainError> {
        let course_ids: Vec<Uuid> = organization
            .purchased_course_ids
            .iter()
            .map(|c| *c.as_uuid())
            .collect();

        let result = sqlx::query(
            r#"
            UPDATE organizations SET
                name = $2,
                kind = $3,
                owner_user_id = $4,
                subscription_status = $5,
                subscription_plan = $6,
                billing_subscription_id = $7,
                member_count = $8,
                purchased_course_ids = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(organization.id.as_uuid())
        .bind(&organization.name)
        .bind(organization.kind.as_str())
        .bind(organization.owner_user_id.as_str())
        .bind(organization.subscription_status.as_str())
        .bind(&organization.subscription_plan)
        .bind(&organization.billing_subscription_id)
        .bind(organization.member_count as i32)
        .bind(&course_ids)
        .bind(*organization.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update organization", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::OrganizationNotFound,
                "Organization not found",
            ));
        }

        Ok(())
    }

    async fn set_subscription(
        &self,
        id: &OrganizationId,
        status: SubscriptionStatus,
        plan: Option<&str>,
    ) -> Result<(), DomainError> {
        // Plan is only overwritten when the event carried one.
        let result = sqlx::query(
            r#"
            UPDATE organizations SET
                subscription_status = $2,
                subscription_plan = COALESCE($3, subscription_plan),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(plan)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to set subscription status", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::OrganizationNotFound,
                "Organization not found",
            ));
        }

        Ok(())
    }

    async fn adjust_member_count(
        &self,
        id: &OrganizationId,
        delta: i32,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE organizations SET
                member_count = GREATEST(0, member_count + $2),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(delta)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to adjust member count", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::OrganizationNotFound,
                "Organization not found",
            ));
        }

        Ok(())
    }

    async fn reserve_member_slot(
        &self,
        id: &OrganizationId,
        cap: Option<u32>,
    ) -> Result<bool, DomainError> {
        // Row-level locking serializes concurrent claims; the cap guard is
        // re-evaluated under the lock, so the last slot has a single winner.
        let result = sqlx::query(
            r#"
            UPDATE organizations SET
                member_count = member_count + 1,
                updated_at = NOW()
            WHERE id = $1 AND ($2::int IS NULL OR member_count < $2)
            "#,
        )
        .bind(id.as_uuid())
        .bind(cap.map(|c| c as i32))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to reserve member slot", e))?;

        if result.rows_affected() == 1 {
            Ok(true)
        } else if cap.is_some() {
            Ok(false)
        } else {
            Err(DomainError::new(
                ErrorCode::OrganizationNotFound,
                "Organization not found",
            ))
        }
    }
}
