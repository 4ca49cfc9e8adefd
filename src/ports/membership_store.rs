//! Membership store port.
//!
//! Persistence contract for membership records. Two requirements here carry
//! the engine's correctness:
//!
//! - `find_by_token` looks up across **all** organizations (the token alone
//!   identifies the record before the caller knows which organization it
//!   belongs to); implementations maintain a token -> record index updated in
//!   the same transaction as the membership write
//! - `commit_if_status` is a conditional write: it lands only if the stored
//!   record still has the expected status. This is the check-and-set that
//!   makes redemption at-most-once under concurrent attempts.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EmailAddress, MembershipId, OrganizationId};
use crate::domain::membership::{InviteToken, Membership, MembershipStatus};

/// Result of a conditional commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The stored status matched and the write landed.
    Committed,
    /// Another writer got there first; nothing was written.
    Conflict,
}

/// Repository port for membership persistence.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Inserts a new membership record.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate id
    async fn insert(&self, membership: &Membership) -> Result<(), DomainError>;

    /// Fetches a membership by its (organization, membership) key.
    async fn get(
        &self,
        organization_id: &OrganizationId,
        membership_id: &MembershipId,
    ) -> Result<Option<Membership>, DomainError>;

    /// Finds the membership holding this live invite token, across all
    /// organizations.
    ///
    /// Returns `None` if no record carries the token (never issued, already
    /// redeemed, or cleared on expiry).
    async fn find_by_token(&self, token: &InviteToken) -> Result<Option<Membership>, DomainError>;

    /// Finds the membership for an (organization, normalized email) pair.
    ///
    /// At most one record exists per pair; re-invites reuse it.
    async fn find_by_email(
        &self,
        organization_id: &OrganizationId,
        email: &EmailAddress,
    ) -> Result<Option<Membership>, DomainError>;

    /// Lists all `active` memberships under an organization.
    async fn list_active(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Membership>, DomainError>;

    /// Counts memberships currently `invited` or `active` under an
    /// organization. Used for the concurrent-member cap.
    async fn count_live(&self, organization_id: &OrganizationId) -> Result<u32, DomainError>;

    /// Unconditionally updates an existing record.
    ///
    /// For writes where last-writer-wins is acceptable (access-flag
    /// assignments, token clearing). State transitions that must be
    /// at-most-once go through `commit_if_status` instead.
    async fn update(&self, membership: &Membership) -> Result<(), DomainError>;

    /// Writes `membership` only if the stored record's status still equals
    /// `expected`. The comparison and the write are one atomic operation.
    async fn commit_if_status(
        &self,
        membership: &Membership,
        expected: MembershipStatus,
    ) -> Result<CommitOutcome, DomainError>;

    /// Writes `membership` only if the stored record still carries `expected`
    /// as its invite token.
    ///
    /// Clearing an expired token goes through this guard: a resend that
    /// rotated the token in the meantime keeps its fresh token, and the late
    /// clear conflicts instead of wiping it. Status alone cannot arbitrate
    /// this race, since both writers see an `invited` record.
    async fn commit_if_token(
        &self,
        membership: &Membership,
        expected: &InviteToken,
    ) -> Result<CommitOutcome, DomainError>;
}
