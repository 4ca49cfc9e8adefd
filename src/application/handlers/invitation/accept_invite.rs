//! AcceptInviteHandler - at-most-once token redemption.

use std::sync::Arc;

use crate::application::handlers::enrollment::{
    ProvisionCourseAccessCommand, ProvisionCourseAccessHandler,
};
use crate::domain::foundation::{Actor, MembershipId, OrganizationId, Timestamp};
use crate::domain::membership::{InviteToken, MembershipError, MembershipStatus};
use crate::ports::{CommitOutcome, MembershipStore, OrganizationStore};

/// Command to redeem an invitation token.
#[derive(Debug, Clone)]
pub struct AcceptInviteCommand {
    pub actor: Actor,
    pub token: String,
}

/// Result of a successful redemption.
#[derive(Debug, Clone)]
pub struct AcceptInviteResult {
    pub organization_id: OrganizationId,
    pub membership_id: MembershipId,
    pub has_access: bool,
}

/// Redeems an invitation token and activates the membership.
///
/// The redemption itself is a pure state transition on the aggregate; what
/// makes it at-most-once is the conditional commit against the stored
/// status. Two concurrent redemptions of the same token both pass the
/// in-memory checks, but only one conditional write lands; the loser gets
/// `AlreadyRedeemed` and no partial state.
///
/// Enrollment provisioning after the commit is best-effort: the membership
/// stands even if provisioning fails, and the idempotent provisioning pass
/// fills the gap on a later trigger.
pub struct AcceptInviteHandler {
    organizations: Arc<dyn OrganizationStore>,
    memberships: Arc<dyn MembershipStore>,
    provisioner: Arc<ProvisionCourseAccessHandler>,
}

impl AcceptInviteHandler {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        memberships: Arc<dyn MembershipStore>,
        provisioner: Arc<ProvisionCourseAccessHandler>,
    ) -> Self {
        Self {
            organizations,
            memberships,
            provisioner,
        }
    }

    pub async fn handle(
        &self,
        command: AcceptInviteCommand,
    ) -> Result<AcceptInviteResult, MembershipError> {
        let token = InviteToken::parse(&command.token).map_err(|_| MembershipError::InvalidToken)?;

        let mut membership = self
            .memberships
            .find_by_token(&token)
            .await?
            .ok_or(MembershipError::InvalidToken)?;

        let organization = self
            .organizations
            .get(&membership.organization_id)
            .await?
            .ok_or(MembershipError::organization_not_found(
                membership.organization_id,
            ))?;

        let now = Timestamp::now();
        match membership.redeem(
            command.actor.user_id.clone(),
            &command.actor.email,
            organization.effective_access(),
            now,
        ) {
            Ok(()) => {}
            Err(MembershipError::InviteExpired) => {
                // Kill the late token so the record needs an explicit resend.
                // The write is conditioned on the token we read: if a resend
                // rotated it in the meantime, the fresh token stays untouched.
                membership.clear_expired_token();
                match self.memberships.commit_if_token(&membership, &token).await {
                    Ok(CommitOutcome::Committed) => {}
                    Ok(CommitOutcome::Conflict) => {
                        tracing::debug!(
                            membership_id = %membership.id,
                            "expired token already rotated by a resend"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to clear expired invite token");
                    }
                }
                return Err(MembershipError::InviteExpired);
            }
            Err(e) => return Err(e),
        }

        if membership.accepted_email_mismatch {
            tracing::warn!(
                membership_id = %membership.id,
                "invitation redeemed with a different account email"
            );
        }

        match self
            .memberships
            .commit_if_status(&membership, MembershipStatus::Invited)
            .await?
        {
            CommitOutcome::Committed => {}
            CommitOutcome::Conflict => return Err(MembershipError::AlreadyRedeemed),
        }

        tracing::info!(
            organization_id = %organization.id,
            membership_id = %membership.id,
            has_access = membership.has_access,
            "invitation redeemed"
        );

        self.provision_best_effort(&organization.id, &command.actor)
            .await;

        Ok(AcceptInviteResult {
            organization_id: organization.id,
            membership_id: membership.id,
            has_access: membership.has_access,
        })
    }

    async fn provision_best_effort(&self, organization_id: &OrganizationId, actor: &Actor) {
        let command = ProvisionCourseAccessCommand {
            organization_id: *organization_id,
            user_id: actor.user_id.clone(),
        };
        if let Err(e) = self.provisioner.handle(command).await {
            tracing::warn!(
                organization_id = %organization_id,
                error = %e,
                "enrollment provisioning after redemption failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::invitation::test_support::{
        company, InMemoryEnrollmentStore, InMemoryMembershipStore, InMemoryOrganizationStore,
    };
    use crate::domain::foundation::{CourseId, DomainError, EmailAddress};
    use crate::ports::EnrollmentStore;

    fn invitee_actor(email: &str) -> Actor {
        Actor::new(format!("user-{email}"), email).unwrap()
    }

    struct Fixture {
        organizations: Arc<InMemoryOrganizationStore>,
        memberships: Arc<InMemoryMembershipStore>,
        enrollments: Arc<InMemoryEnrollmentStore>,
        handler: AcceptInviteHandler,
    }

    fn fixture(organization: crate::domain::organization::Organization) -> Fixture {
        let organizations = Arc::new(InMemoryOrganizationStore::with(organization));
        let memberships = Arc::new(InMemoryMembershipStore::new());
        let enrollments = Arc::new(InMemoryEnrollmentStore::new());
        let provisioner = Arc::new(ProvisionCourseAccessHandler::new(
            Arc::clone(&organizations) as Arc<dyn OrganizationStore>,
            Arc::clone(&enrollments) as Arc<dyn EnrollmentStore>,
        ));
        let handler = AcceptInviteHandler::new(
            Arc::clone(&organizations) as Arc<dyn OrganizationStore>,
            Arc::clone(&memberships) as Arc<dyn MembershipStore>,
            provisioner,
        );
        Fixture {
            organizations,
            memberships,
            enrollments,
            handler,
        }
    }

    #[tokio::test]
    async fn redeeming_a_live_token_activates_the_membership() {
        let organization = company();
        let fx = fixture(organization.clone());
        let token = InviteToken::generate();
        let seeded = fx
            .memberships
            .seed_invited(
                &organization,
                "alice@acme.test",
                token.clone(),
                Timestamp::now().add_days(7),
            )
            .await;

        let result = fx
            .handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("alice@acme.test"),
                token: token.as_str().to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.membership_id, seeded.id);
        assert_eq!(result.organization_id, organization.id);
        let stored = fx.memberships.by_id(&seeded.id).await.unwrap();
        assert_eq!(stored.status, MembershipStatus::Active);
        assert!(stored.invite_token.is_none());
        assert!(!stored.accepted_email_mismatch);
    }

    #[tokio::test]
    async fn second_redemption_of_same_token_fails() {
        let organization = company();
        let fx = fixture(organization.clone());
        let token = InviteToken::generate();
        fx.memberships
            .seed_invited(
                &organization,
                "bob@acme.test",
                token.clone(),
                Timestamp::now().add_days(7),
            )
            .await;

        fx.handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("bob@acme.test"),
                token: token.as_str().to_string(),
            })
            .await
            .unwrap();

        let second = fx
            .handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("impostor@other.test"),
                token: token.as_str().to_string(),
            })
            .await;

        // The committed redemption cleared the token, so the second caller
        // cannot even locate a live invitation.
        assert!(matches!(second, Err(MembershipError::InvalidToken)));
    }

    #[tokio::test]
    async fn concurrent_redemptions_commit_exactly_once() {
        let organization = company();
        let fx = fixture(organization.clone());
        let token = InviteToken::generate();
        let seeded = fx
            .memberships
            .seed_invited(
                &organization,
                "carol@acme.test",
                token.clone(),
                Timestamp::now().add_days(7),
            )
            .await;

        // Both tasks read the invited record before either commits.
        let handler = Arc::new(fx.handler);
        let mut tasks = Vec::new();
        for i in 0..2 {
            let handler = Arc::clone(&handler);
            let token = token.as_str().to_string();
            tasks.push(tokio::spawn(async move {
                handler
                    .handle(AcceptInviteCommand {
                        actor: invitee_actor(&format!("racer{i}@acme.test")),
                        token,
                    })
                    .await
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        let stored = fx.memberships.by_id(&seeded.id).await.unwrap();
        assert_eq!(stored.status, MembershipStatus::Active);
        assert!(stored.user_id.is_some());
    }

    #[tokio::test]
    async fn expired_token_is_cleared_and_rejected() {
        let organization = company();
        let fx = fixture(organization.clone());
        let token = InviteToken::generate();
        let seeded = fx
            .memberships
            .seed_invited(
                &organization,
                "dora@acme.test",
                token.clone(),
                Timestamp::now().minus_days(1),
            )
            .await;

        let result = fx
            .handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("dora@acme.test"),
                token: token.as_str().to_string(),
            })
            .await;

        assert!(matches!(result, Err(MembershipError::InviteExpired)));
        let stored = fx.memberships.by_id(&seeded.id).await.unwrap();
        assert_eq!(stored.status, MembershipStatus::Invited);
        assert!(stored.invite_token.is_none());
    }

    /// Resolves a token to a pre-captured snapshot of the membership, standing
    /// in for a lookup that raced a concurrent resend.
    struct StaleTokenLookupStore {
        live: Arc<InMemoryMembershipStore>,
        snapshot: crate::domain::membership::Membership,
    }

    #[async_trait::async_trait]
    impl MembershipStore for StaleTokenLookupStore {
        async fn insert(
            &self,
            membership: &crate::domain::membership::Membership,
        ) -> Result<(), DomainError> {
            self.live.insert(membership).await
        }

        async fn get(
            &self,
            organization_id: &OrganizationId,
            membership_id: &MembershipId,
        ) -> Result<Option<crate::domain::membership::Membership>, DomainError> {
            self.live.get(organization_id, membership_id).await
        }

        async fn find_by_token(
            &self,
            _token: &InviteToken,
        ) -> Result<Option<crate::domain::membership::Membership>, DomainError> {
            Ok(Some(self.snapshot.clone()))
        }

        async fn find_by_email(
            &self,
            organization_id: &OrganizationId,
            email: &EmailAddress,
        ) -> Result<Option<crate::domain::membership::Membership>, DomainError> {
            self.live.find_by_email(organization_id, email).await
        }

        async fn list_active(
            &self,
            organization_id: &OrganizationId,
        ) -> Result<Vec<crate::domain::membership::Membership>, DomainError> {
            self.live.list_active(organization_id).await
        }

        async fn count_live(&self, organization_id: &OrganizationId) -> Result<u32, DomainError> {
            self.live.count_live(organization_id).await
        }

        async fn update(
            &self,
            membership: &crate::domain::membership::Membership,
        ) -> Result<(), DomainError> {
            self.live.update(membership).await
        }

        async fn commit_if_status(
            &self,
            membership: &crate::domain::membership::Membership,
            expected: MembershipStatus,
        ) -> Result<CommitOutcome, DomainError> {
            self.live.commit_if_status(membership, expected).await
        }

        async fn commit_if_token(
            &self,
            membership: &crate::domain::membership::Membership,
            expected: &InviteToken,
        ) -> Result<CommitOutcome, DomainError> {
            self.live.commit_if_token(membership, expected).await
        }
    }

    #[tokio::test]
    async fn clearing_an_expired_token_spares_a_concurrent_resend() {
        let organization = company();
        let organizations = Arc::new(InMemoryOrganizationStore::with(organization.clone()));
        let enrollments = Arc::new(InMemoryEnrollmentStore::new());
        let live = Arc::new(InMemoryMembershipStore::new());
        let old_token = InviteToken::generate();
        let snapshot = live
            .seed_invited(
                &organization,
                "judy@acme.test",
                old_token.clone(),
                Timestamp::now().minus_days(1),
            )
            .await;

        // A resend rotates the token after our snapshot was taken.
        let mut resent = snapshot.clone();
        let fresh_token = InviteToken::generate();
        let fresh_deadline = Timestamp::now().add_days(7);
        resent.reissue(fresh_token.clone(), fresh_deadline).unwrap();
        live.update(&resent).await.unwrap();

        let provisioner = Arc::new(ProvisionCourseAccessHandler::new(
            Arc::clone(&organizations) as Arc<dyn OrganizationStore>,
            Arc::clone(&enrollments) as Arc<dyn EnrollmentStore>,
        ));
        let handler = AcceptInviteHandler::new(
            Arc::clone(&organizations) as Arc<dyn OrganizationStore>,
            Arc::new(StaleTokenLookupStore {
                live: Arc::clone(&live),
                snapshot,
            }),
            provisioner,
        );

        let result = handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("judy@acme.test"),
                token: old_token.as_str().to_string(),
            })
            .await;

        assert!(matches!(result, Err(MembershipError::InviteExpired)));
        // The rotated token and its deadline survive the losing cleanup.
        let stored = live.by_id(&resent.id).await.unwrap();
        assert_eq!(stored.invite_token, Some(fresh_token));
        assert_eq!(stored.invite_expires_at, Some(fresh_deadline));
    }

    #[tokio::test]
    async fn garbage_token_is_invalid_without_store_lookup() {
        let fx = fixture(company());

        let result = fx
            .handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("eve@acme.test"),
                token: "definitely-not-a-token".to_string(),
            })
            .await;

        assert!(matches!(result, Err(MembershipError::InvalidToken)));
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let fx = fixture(company());

        let result = fx
            .handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("frank@acme.test"),
                token: InviteToken::generate().as_str().to_string(),
            })
            .await;

        assert!(matches!(result, Err(MembershipError::InvalidToken)));
    }

    #[tokio::test]
    async fn mismatched_email_redeems_and_is_recorded() {
        let organization = company();
        let fx = fixture(organization.clone());
        let token = InviteToken::generate();
        let seeded = fx
            .memberships
            .seed_invited(
                &organization,
                "work@acme.test",
                token.clone(),
                Timestamp::now().add_days(7),
            )
            .await;

        let result = fx
            .handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("personal@gmail.test"),
                token: token.as_str().to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.membership_id, seeded.id);
        let stored = fx.memberships.by_id(&seeded.id).await.unwrap();
        assert!(stored.accepted_email_mismatch);
    }

    #[tokio::test]
    async fn access_flag_mirrors_organization_subscription() {
        let mut organization = company();
        organization.set_subscription_status(
            crate::domain::organization::SubscriptionStatus::Active,
        );
        let fx = fixture(organization.clone());
        let token = InviteToken::generate();
        fx.memberships
            .seed_invited(
                &organization,
                "grace@acme.test",
                token.clone(),
                Timestamp::now().add_days(7),
            )
            .await;

        let result = fx
            .handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("grace@acme.test"),
                token: token.as_str().to_string(),
            })
            .await
            .unwrap();

        assert!(result.has_access);
    }

    #[tokio::test]
    async fn redemption_provisions_purchased_courses() {
        let mut organization = company();
        let course = CourseId::new();
        organization.purchased_course_ids = vec![course];
        let fx = fixture(organization.clone());
        let token = InviteToken::generate();
        fx.memberships
            .seed_invited(
                &organization,
                "henry@acme.test",
                token.clone(),
                Timestamp::now().add_days(7),
            )
            .await;

        let actor = invitee_actor("henry@acme.test");
        fx.handler
            .handle(AcceptInviteCommand {
                actor: actor.clone(),
                token: token.as_str().to_string(),
            })
            .await
            .unwrap();

        let enrolled = fx.enrollments.list_for_user(&actor.user_id).await.unwrap();
        assert_eq!(enrolled.len(), 1);
        assert_eq!(enrolled[0].course_id, course);
        assert_eq!(fx.enrollments.enrolled_count(&course).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn redemption_survives_missing_courses() {
        let organization = company();
        let fx = fixture(organization.clone());
        let token = InviteToken::generate();
        fx.memberships
            .seed_invited(
                &organization,
                "iris@acme.test",
                token.clone(),
                Timestamp::now().add_days(7),
            )
            .await;

        let result = fx
            .handler
            .handle(AcceptInviteCommand {
                actor: invitee_actor("iris@acme.test"),
                token: token.as_str().to_string(),
            })
            .await;

        assert!(result.is_ok());
        // No courses purchased: membership activates, nothing to provision.
        let _ = fx.organizations;
    }
}
