//! DeclineInviteHandler - invitee-initiated refusal of a pending invitation.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, OrganizationId};
use crate::domain::membership::{InviteToken, MembershipError, MembershipStatus};
use crate::ports::{MembershipStore, OrganizationStore};

/// Command to decline a pending invitation by its token.
#[derive(Debug, Clone)]
pub struct DeclineInviteCommand {
    pub token: String,
}

/// Result of declining an invitation.
#[derive(Debug, Clone)]
pub struct DeclineInviteResult {
    pub organization_id: OrganizationId,
    pub membership_id: MembershipId,
}

/// Declines a pending invitation.
///
/// The token alone authorizes the decline, so an invitee can refuse without
/// ever creating an account. The record moves to `removed` and the token
/// dies; the owner can re-invite later on the same record.
pub struct DeclineInviteHandler {
    organizations: Arc<dyn OrganizationStore>,
    memberships: Arc<dyn MembershipStore>,
}

impl DeclineInviteHandler {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        memberships: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            organizations,
            memberships,
        }
    }

    pub async fn handle(
        &self,
        command: DeclineInviteCommand,
    ) -> Result<DeclineInviteResult, MembershipError> {
        let token = InviteToken::parse(&command.token).map_err(|_| MembershipError::InvalidToken)?;

        let mut membership = self
            .memberships
            .find_by_token(&token)
            .await?
            .ok_or(MembershipError::InvalidToken)?;

        membership.remove()?;

        // The same conditional write as redemption: if the invitee declined
        // while someone raced a redemption, exactly one of them lands.
        match self
            .memberships
            .commit_if_status(&membership, MembershipStatus::Invited)
            .await?
        {
            crate::ports::CommitOutcome::Committed => {}
            crate::ports::CommitOutcome::Conflict => return Err(MembershipError::AlreadyRedeemed),
        }

        self.organizations
            .adjust_member_count(&membership.organization_id, -1)
            .await?;

        tracing::info!(
            organization_id = %membership.organization_id,
            membership_id = %membership.id,
            "invitation declined"
        );

        Ok(DeclineInviteResult {
            organization_id: membership.organization_id,
            membership_id: membership.id,
        })
    }
}
