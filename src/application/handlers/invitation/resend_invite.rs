//! ResendInviteHandler - re-sending a pending invitation.

use std::sync::Arc;

use crate::config::InviteConfig;
use crate::domain::foundation::{Actor, MembershipId, OrganizationId, Timestamp};
use crate::domain::membership::{InviteToken, MembershipError, MembershipStatus};
use crate::domain::organization::OrganizationKind;
use crate::ports::{InviteEmail, InviteEmailSender, MembershipStore, OrganizationStore};

/// Command to resend a pending invitation.
#[derive(Debug, Clone)]
pub struct ResendInviteCommand {
    pub actor: Actor,
    pub organization_id: OrganizationId,
    pub membership_id: MembershipId,
}

/// Result of resending an invitation.
#[derive(Debug, Clone)]
pub struct ResendInviteResult {
    pub expires_at: Timestamp,
    /// Whether a fresh token was minted (the previous one had expired).
    pub token_rotated: bool,
}

/// Resends a pending invitation's email and pushes its deadline out.
///
/// A still-live token is kept, so the originally mailed link continues to
/// work. Once the token has been cleared by expiry, a fresh one is minted
/// on the same record.
pub struct ResendInviteHandler {
    organizations: Arc<dyn OrganizationStore>,
    memberships: Arc<dyn MembershipStore>,
    email_sender: Arc<dyn InviteEmailSender>,
    config: InviteConfig,
}

impl ResendInviteHandler {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        memberships: Arc<dyn MembershipStore>,
        email_sender: Arc<dyn InviteEmailSender>,
        config: InviteConfig,
    ) -> Self {
        Self {
            organizations,
            memberships,
            email_sender,
            config,
        }
    }

    pub async fn handle(
        &self,
        command: ResendInviteCommand,
    ) -> Result<ResendInviteResult, MembershipError> {
        let organization = self
            .organizations
            .get(&command.organization_id)
            .await?
            .ok_or(MembershipError::organization_not_found(
                command.organization_id,
            ))?;

        if !organization.is_owner(&command.actor.user_id) {
            return Err(MembershipError::permission_denied(
                "only the organization owner can resend invitations",
            ));
        }

        let mut membership = self
            .memberships
            .get(&command.organization_id, &command.membership_id)
            .await?
            .ok_or(MembershipError::membership_not_found(command.membership_id))?;

        if membership.status != MembershipStatus::Invited {
            return Err(MembershipError::invalid_state(
                membership.status.as_str(),
                "resend",
            ));
        }

        let ttl_days = match organization.kind {
            OrganizationKind::Company => i64::from(self.config.employee_ttl_days),
            OrganizationKind::Team => i64::from(self.config.team_ttl_days),
        };
        let expires_at = Timestamp::now().add_days(ttl_days);

        let token_rotated = if membership.invite_is_live(Timestamp::now()) {
            membership.extend_invite(expires_at)?;
            false
        } else {
            membership.reissue(InviteToken::generate(), expires_at)?;
            true
        };

        self.memberships.update(&membership).await?;

        let token = membership
            .invite_token
            .as_ref()
            .ok_or_else(|| MembershipError::infrastructure("token missing after resend"))?;
        let invite = InviteEmail {
            to: membership.email.clone(),
            organization_name: organization.name.clone(),
            invite_link: format!("{}/invites/{}", self.config.link_base, token.as_str()),
            expires_at,
        };
        if let Err(e) = self.email_sender.send(&invite).await {
            tracing::warn!(error = %e, "invitation email delivery failed on resend");
        }

        tracing::info!(
            organization_id = %organization.id,
            membership_id = %membership.id,
            token_rotated,
            "invitation resent"
        );

        Ok(ResendInviteResult {
            expires_at,
            token_rotated,
        })
    }
}
