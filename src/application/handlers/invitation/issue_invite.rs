//! IssueInviteHandler - issuing and re-issuing invitations.

use std::sync::Arc;

use crate::config::InviteConfig;
use crate::domain::foundation::{Actor, EmailAddress, MembershipId, OrganizationId, Timestamp};
use crate::domain::membership::{InviteToken, Membership, MembershipError, MembershipStatus};
use crate::domain::organization::OrganizationKind;
use crate::ports::{CommitOutcome, InviteEmail, InviteEmailSender, MembershipStore, OrganizationStore};

/// Command to invite an email address into an organization.
#[derive(Debug, Clone)]
pub struct IssueInviteCommand {
    pub actor: Actor,
    pub organization_id: OrganizationId,
    pub email: String,
}

/// Result of issuing an invitation.
#[derive(Debug, Clone)]
pub struct IssueInviteResult {
    pub membership_id: MembershipId,
    pub expires_at: Timestamp,
    /// Whether an existing record was revived rather than a new one created.
    pub reissued: bool,
}

/// Issues an invitation under an organization.
///
/// One record per (organization, normalized email) pair: inviting an address
/// that already has a record revives that record with a fresh token instead
/// of creating a duplicate. Email delivery is best-effort; a send failure is
/// logged and the invitation stands.
pub struct IssueInviteHandler {
    organizations: Arc<dyn OrganizationStore>,
    memberships: Arc<dyn MembershipStore>,
    email_sender: Arc<dyn InviteEmailSender>,
    config: InviteConfig,
}

impl IssueInviteHandler {
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
        command: IssueInviteCommand,
    ) -> Result<IssueInviteResult, MembershipError> {
        let email = EmailAddress::parse(&command.email)?;

        let organization = self
            .organizations
            .get(&command.organization_id)
            .await?
            .ok_or(MembershipError::organization_not_found(
                command.organization_id,
            ))?;

        if !organization.is_owner(&command.actor.user_id) {
            return Err(MembershipError::permission_denied(
                "only the organization owner can invite members",
            ));
        }

        if email == command.actor.email {
            return Err(MembershipError::validation(
                "email",
                "the owner cannot invite themselves",
            ));
        }

        let existing = self
            .memberships
            .find_by_email(&organization.id, &email)
            .await?;

        if matches!(&existing, Some(m) if m.status == MembershipStatus::Active) {
            return Err(MembershipError::already_member(email.as_str()));
        }

        // A revived removed record or a brand-new one both add a live slot, a
        // replaced pending invite does not. The slot is claimed atomically
        // against the member counter, so two concurrent invites racing for the
        // last seat of a team resolve to a single winner.
        let adds_live_slot = !matches!(&existing, Some(m) if m.status == MembershipStatus::Invited);
        if adds_live_slot {
            let cap = (organization.kind == OrganizationKind::Team)
                .then_some(self.config.team_member_cap);
            let claimed = self
                .organizations
                .reserve_member_slot(&organization.id, cap)
                .await?;
            if !claimed {
                return Err(MembershipError::capacity_exceeded(
                    self.config.team_member_cap,
                ));
            }
        }

        let token = InviteToken::generate();
        let expires_at = Timestamp::now().add_days(self.ttl_days(organization.kind));

        let (membership, reissued) = match self
            .persist_invite(existing, &organization.id, email.clone(), token.clone(), expires_at)
            .await
        {
            Ok(written) => written,
            Err(e) => {
                if adds_live_slot {
                    self.release_member_slot(&organization.id).await;
                }
                return Err(e);
            }
        };

        self.send_invite_email(&organization.name, &email, &token, expires_at)
            .await;

        tracing::info!(
            organization_id = %organization.id,
            membership_id = %membership.id,
            reissued,
            "invitation issued"
        );

        Ok(IssueInviteResult {
            membership_id: membership.id,
            expires_at,
            reissued,
        })
    }

    /// Writes the invitation record. Reviving a removed record is conditioned
    /// on it still being `removed`, so a write that lost a race (say, the
    /// member was re-invited from another session) surfaces as a retryable
    /// failure instead of silently overwriting the newer record.
    async fn persist_invite(
        &self,
        existing: Option<Membership>,
        organization_id: &OrganizationId,
        email: EmailAddress,
        token: InviteToken,
        expires_at: Timestamp,
    ) -> Result<(Membership, bool), MembershipError> {
        match existing {
            Some(mut membership) => {
                let revived = membership.status == MembershipStatus::Removed;
                membership.reissue(token, expires_at)?;
                if revived {
                    match self
                        .memberships
                        .commit_if_status(&membership, MembershipStatus::Removed)
                        .await?
                    {
                        CommitOutcome::Committed => {}
                        CommitOutcome::Conflict => {
                            return Err(MembershipError::infrastructure(
                                "membership record changed concurrently",
                            ));
                        }
                    }
                } else {
                    self.memberships.update(&membership).await?;
                }
                Ok((membership, true))
            }
            None => {
                let membership = Membership::invite(
                    MembershipId::new(),
                    *organization_id,
                    email,
                    token,
                    expires_at,
                );
                self.memberships.insert(&membership).await?;
                Ok((membership, false))
            }
        }
    }

    /// Returns a claimed slot after a failed record write.
    async fn release_member_slot(&self, organization_id: &OrganizationId) {
        if let Err(e) = self
            .organizations
            .adjust_member_count(organization_id, -1)
            .await
        {
            tracing::warn!(error = %e, "failed to release claimed member slot");
        }
    }

    fn ttl_days(&self, kind: OrganizationKind) -> i64 {
        match kind {
            OrganizationKind::Company => i64::from(self.config.employee_ttl_days),
            OrganizationKind::Team => i64::from(self.config.team_ttl_days),
        }
    }

    /// Best-effort delivery: the invitation record stands regardless, and the
    /// link can be resent.
    async fn send_invite_email(
        &self,
        organization_name: &str,
        email: &EmailAddress,
        token: &InviteToken,
        expires_at: Timestamp,
    ) {
        let invite = InviteEmail {
            to: email.clone(),
            organization_name: organization_name.to_string(),
            invite_link: format!("{}/invites/{}", self.config.link_base, token.as_str()),
            expires_at,
        };

        if let Err(e) = self.email_sender.send(&invite).await {
            tracing::warn!(error = %e, "invitation email delivery failed");
        }
    }
}
