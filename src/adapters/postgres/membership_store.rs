//! PostgreSQL implementation of MembershipStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, EmailAddress, ErrorCode, MembershipId, OrganizationId, Timestamp, UserId,
};
use crate::domain::membership::{InviteToken, Membership, MembershipStatus};
use crate::ports::{CommitOutcome, MembershipStore};

/// PostgreSQL-backed membership store.
///
/// The `memberships` table carries a unique index on `invite_token` (partial,
/// where not null) and a unique index on `(organization_id, email)`.
/// `commit_if_status` relies on a conditional UPDATE whose row count tells
/// the winner from the loser.
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    organization_id: Uuid,
    email: String,
    status: String,
    invite_token: Option<String>,
    invite_expires_at: Option<DateTime<Utc>>,
    user_id: Option<String>,
    has_access: bool,
    accepted_email_mismatch: bool,
    invited_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = DomainError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        let status = parse_status(&row.status)?;
        let email = EmailAddress::parse(&row.email).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid email: {}", e))
        })?;
        let invite_token = row
            .invite_token
            .as_deref()
            .map(InviteToken::parse)
            .transpose()
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid token: {}", e))
            })?;
        let user_id = row
            .user_id
            .map(UserId::new)
            .transpose()
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?;

        Ok(Membership {
            id: MembershipId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            email,
            status,
            invite_token,
            invite_expires_at: row.invite_expires_at.map(Timestamp::from_datetime),
            user_id,
            has_access: row.has_access,
            accepted_email_mismatch: row.accepted_email_mismatch,
            invited_at: Timestamp::from_datetime(row.invited_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<MembershipStatus, DomainError> {
    MembershipStatus::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid membership status: {}", s),
        )
    })
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, organization_id, email, status, invite_token, invite_expires_at,
           user_id, has_access, accepted_email_mismatch, invited_at, updated_at
    FROM memberships
"#;

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    async fn insert(&self, membership: &Membership) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO memberships (
                id, organization_id, email, status, invite_token, invite_expires_at,
                user_id, has_access, accepted_email_mismatch, invited_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(membership.organization_id.as_uuid())
        .bind(membership.email.as_str())
        .bind(membership.status.as_str())
        .bind(membership.invite_token.as_ref().map(InviteToken::as_str))
        .bind(membership.invite_expires_at.map(|t| *t.as_datetime()))
        .bind(membership.user_id.as_ref().map(UserId::as_str))
        .bind(membership.has_access)
        .bind(membership.accepted_email_mismatch)
        .bind(*membership.invited_at.as_datetime())
        .bind(*membership.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("memberships_organization_id_email_key") {
                    return DomainError::new(
                        ErrorCode::AlreadyMember,
                        "A membership already exists for this email",
                    );
                }
            }
            db_error("Failed to insert membership", e)
        })?;

        Ok(())
    }

    async fn get(
        &self,
        organization_id: &OrganizationId,
        membership_id: &MembershipId,
    ) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "{} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS
        ))
        .bind(organization_id.as_uuid())
        .bind(membership_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch membership", e))?;

        row.map(Membership::try_from).transpose()
    }

    async fn find_by_token(&self, token: &InviteToken) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> =
            sqlx::query_as(&format!("{} WHERE invite_token = $1", SELECT_COLUMNS))
                .bind(token.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to look up invite token", e))?;

        row.map(Membership::try_from).transpose()
    }

    async fn find_by_email(
        &self,
        organization_id: &OrganizationId,
        email: &EmailAddress,
    ) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "{} WHERE organization_id = $1 AND email = $2",
            SELECT_COLUMNS
        ))
        .bind(organization_id.as_uuid())
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to look up membership by email", e))?;

        row.map(Membership::try_from).transpose()
    }

    async fn list_active(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Membership>, DomainError> {
        let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
            "{} WHERE organization_id = $1 AND status = 'active' ORDER BY invited_at",
            SELECT_COLUMNS
        ))
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list active memberships", e))?;

        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn count_live(&self, organization_id: &OrganizationId) -> Result<u32, DomainError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE organization_id = $1 AND status IN ('invited', 'active')
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count live memberships", e))?;

        Ok(count as u32)
    }

    async fn update(&self, membership: &Membership) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE memberships SET
                status = $2,
                invite_token = $3,
                invite_expires_at = $4,
                user_id = $5,
                has_access = $6,
                accepted_email_mismatch = $7,
                invited_at = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(membership.status.as_str())
        .bind(membership.invite_token.as_ref().map(InviteToken::as_str))
        .bind(membership.invite_expires_at.map(|t| *t.as_datetime()))
        .bind(membership.user_id.as_ref().map(UserId::as_str))
        .bind(membership.has_access)
        .bind(membership.accepted_email_mismatch)
        .bind(*membership.invited_at.as_datetime())
        .bind(*membership.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update membership", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::MembershipNotFound,
                "Membership not found",
            ));
        }

        Ok(())
    }

    async fn commit_if_status(
        &self,
        membership: &Membership,
        expected: MembershipStatus,
    ) -> Result<CommitOutcome, DomainError> {
        // The status guard in the WHERE clause is what makes the write
        // at-most-once: the row count distinguishes the winner.
        let result = sqlx::query(
            r#"
            UPDATE memberships SET
                status = $3,
                invite_token = $4,
                invite_expires_at = $5,
                user_id = $6,
                has_access = $7,
                accepted_email_mismatch = $8,
                updated_at = $9
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(expected.as_str())
        .bind(membership.status.as_str())
        .bind(membership.invite_token.as_ref().map(InviteToken::as_str))
        .bind(membership.invite_expires_at.map(|t| *t.as_datetime()))
        .bind(membership.user_id.as_ref().map(UserId::as_str))
        .bind(membership.has_access)
        .bind(membership.accepted_email_mismatch)
        .bind(*membership.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to commit membership", e))?;

        if result.rows_affected() == 1 {
            Ok(CommitOutcome::Committed)
        } else {
            Ok(CommitOutcome::Conflict)
        }
    }

    async fn commit_if_token(
        &self,
        membership: &Membership,
        expected: &InviteToken,
    ) -> Result<CommitOutcome, DomainError> {
        // Guarded on the token column: a concurrently rotated token makes
        // this write miss instead of clobbering the fresh token.
        let result = sqlx::query(
            r#"
            UPDATE memberships SET
                status = $3,
                invite_token = $4,
                invite_expires_at = $5,
                user_id = $6,
                has_access = $7,
                accepted_email_mismatch = $8,
                updated_at = $9
            WHERE id = $1 AND invite_token = $2
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(expected.as_str())
        .bind(membership.status.as_str())
        .bind(membership.invite_token.as_ref().map(InviteToken::as_str))
        .bind(membership.invite_expires_at.map(|t| *t.as_datetime()))
        .bind(membership.user_id.as_ref().map(UserId::as_str))
        .bind(membership.has_access)
        .bind(membership.accepted_email_mismatch)
        .bind(*membership.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to commit membership", e))?;

        if result.rows_affected() == 1 {
            Ok(CommitOutcome::Committed)
        } else {
            Ok(CommitOutcome::Conflict)
        }
    }
}
