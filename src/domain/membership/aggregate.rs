//! Membership aggregate entity.
//!
//! A Membership is one invitation/acceptance record, scoped to its parent
//! Organization and an invitee email. The same record is reused across
//! re-invites: at most one membership per (organization, normalized email)
//! is ever `invited` or `active`.
//!
//! # Design Decisions
//!
//! - **Token lives with the record**: `invite_token` is present only while
//!   `invited`; redemption and expiry both clear it, so a token can never be
//!   redeemed twice or late
//! - **Cached access flag**: `has_access` is derived from the organization's
//!   subscription status and recomputed by the propagator; it is never
//!   authoritative on its own
//! - **Email mismatch is advisory**: redemption with a different account email
//!   proceeds but records the mismatch (account-merge support)

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    EmailAddress, MembershipId, OrganizationId, StateMachine, Timestamp, UserId,
};

use super::{InviteToken, MembershipError, MembershipStatus};

/// Membership aggregate - one invite/accept record under an organization.
///
/// # Invariants
///
/// - `invite_token` and `invite_expires_at` are `Some` exactly while a live
///   invitation exists (status `Invited`, token not yet expired-and-cleared)
/// - `user_id` is `Some` exactly while `Active`
/// - `Invited -> Active` happens at most once per issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Unique identifier within the organization.
    pub id: MembershipId,

    /// Owning organization.
    pub organization_id: OrganizationId,

    /// Normalized invitee email; identifies the record before acceptance.
    pub email: EmailAddress,

    /// Current lifecycle status.
    pub status: MembershipStatus,

    /// Live invitation secret, present only while `Invited`.
    pub invite_token: Option<InviteToken>,

    /// Absolute invitation deadline, present only while `Invited`.
    pub invite_expires_at: Option<Timestamp>,

    /// Bound user identity, present only once `Active`.
    pub user_id: Option<UserId>,

    /// Cached access flag derived from the organization's subscription status.
    pub has_access: bool,

    /// Set when the redeeming account's email differed from the invitee email.
    pub accepted_email_mismatch: bool,

    /// When the current invitation was issued.
    pub invited_at: Timestamp,

    /// When the record was last updated.
    pub updated_at: Timestamp,
}

impl Membership {
    /// Creates a fresh invitation record.
    pub fn invite(
        id: MembershipId,
        organization_id: OrganizationId,
        email: EmailAddress,
        token: InviteToken,
        expires_at: Timestamp,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            organization_id,
            email,
            status: MembershipStatus::Invited,
            invite_token: Some(token),
            invite_expires_at: Some(expires_at),
            user_id: None,
            has_access: false,
            accepted_email_mismatch: false,
            invited_at: now,
            updated_at: now,
        }
    }

    /// Re-issues an invitation on this record.
    ///
    /// This is the explicit reuse branch: a `removed` member is invited again
    /// (or a still-pending invitation is replaced) on the same record, keeping
    /// the (organization, email) pair unique. Any previous token dies here.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the record is `Active`.
    pub fn reissue(
        &mut self,
        token: InviteToken,
        expires_at: Timestamp,
    ) -> Result<(), MembershipError> {
        match self.status {
            MembershipStatus::Active => {
                Err(MembershipError::invalid_state("active", "re-invite"))
            }
            MembershipStatus::Removed => {
                self.status = self
                    .status
                    .transition_to(MembershipStatus::Invited)
                    .map_err(|e| MembershipError::invalid_state(self.status.as_str(), e.to_string()))?;
                self.reset_invitation(token, expires_at);
                Ok(())
            }
            MembershipStatus::Invited => {
                // Replacing a pending invitation keeps the status; only the
                // secret and deadline change.
                self.reset_invitation(token, expires_at);
                Ok(())
            }
        }
    }

    fn reset_invitation(&mut self, token: InviteToken, expires_at: Timestamp) {
        let now = Timestamp::now();
        self.invite_token = Some(token);
        self.invite_expires_at = Some(expires_at);
        self.user_id = None;
        self.has_access = false;
        self.accepted_email_mismatch = false;
        self.invited_at = now;
        self.updated_at = now;
    }

    /// Redeems this invitation for the acting identity.
    ///
    /// Pure state transition; the caller is responsible for committing the
    /// result under a conditional write so that concurrent redemptions of the
    /// same token cannot both land.
    ///
    /// # Errors
    ///
    /// - `AlreadyRedeemed` if the record is not `Invited`
    /// - `InviteExpired` if `now` is past the deadline
    pub fn redeem(
        &mut self,
        user_id: UserId,
        acting_email: &EmailAddress,
        organization_access: bool,
        now: Timestamp,
    ) -> Result<(), MembershipError> {
        if self.status != MembershipStatus::Invited {
            return Err(MembershipError::AlreadyRedeemed);
        }

        let deadline = self
            .invite_expires_at
            .ok_or(MembershipError::InvalidToken)?;
        if now.is_after(&deadline) {
            return Err(MembershipError::InviteExpired);
        }

        // The token itself is the security boundary; a differing account
        // email is recorded, not rejected.
        self.accepted_email_mismatch = acting_email != &self.email;

        self.status = self
            .status
            .transition_to(MembershipStatus::Active)
            .map_err(|e| MembershipError::invalid_state(self.status.as_str(), e.to_string()))?;
        self.user_id = Some(user_id);
        self.invite_token = None;
        self.invite_expires_at = None;
        self.has_access = organization_access;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Clears an expired token so it can never be redeemed late.
    ///
    /// The record stays `Invited`; a resend or re-issue revives it.
    pub fn clear_expired_token(&mut self) {
        self.invite_token = None;
        self.invite_expires_at = None;
        self.updated_at = Timestamp::now();
    }

    /// Marks this membership removed, clearing the user binding and access.
    ///
    /// Covers owner removal of a member and invitee decline alike.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already `Removed`.
    pub fn remove(&mut self) -> Result<(), MembershipError> {
        self.status = self
            .status
            .transition_to(MembershipStatus::Removed)
            .map_err(|_| MembershipError::invalid_state(self.status.as_str(), "remove"))?;
        self.user_id = None;
        self.invite_token = None;
        self.invite_expires_at = None;
        self.has_access = false;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Extends the invitation deadline, keeping the existing token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless a live invitation exists.
    pub fn extend_invite(&mut self, new_deadline: Timestamp) -> Result<(), MembershipError> {
        if self.status != MembershipStatus::Invited || self.invite_token.is_none() {
            return Err(MembershipError::invalid_state(self.status.as_str(), "resend"));
        }
        self.invite_expires_at = Some(new_deadline);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Assigns the cached access flag.
    ///
    /// A pure assignment so propagation passes can be replayed safely.
    /// Returns true if the flag changed.
    pub fn set_access(&mut self, access: bool) -> bool {
        if self.has_access == access {
            return false;
        }
        self.has_access = access;
        self.updated_at = Timestamp::now();
        true
    }

    /// Whether a live (unexpired) invitation exists at `now`.
    pub fn invite_is_live(&self, now: Timestamp) -> bool {
        self.status == MembershipStatus::Invited
            && self.invite_token.is_some()
            && self
                .invite_expires_at
                .map(|deadline| !now.is_after(&deadline))
                .unwrap_or(false)
    }
}
