//! RemoveMemberHandler - owner-initiated removal of a member.

use std::sync::Arc;

use crate::domain::foundation::{Actor, MembershipId, OrganizationId};
use crate::domain::membership::MembershipError;
use crate::ports::{MembershipStore, OrganizationStore};

/// Command to remove a member (or revoke a pending invitation).
#[derive(Debug, Clone)]
pub struct RemoveMemberCommand {
    pub actor: Actor,
    pub organization_id: OrganizationId,
    pub membership_id: MembershipId,
}

/// Removes a membership from an organization.
///
/// Removal takes effect synchronously: the record's cached access flag is
/// cleared in the same write that flips its status, so the removed member
/// fails access checks immediately, before any propagation pass runs.
pub struct RemoveMemberHandler {
    organizations: Arc<dyn OrganizationStore>,
    memberships: Arc<dyn MembershipStore>,
}

impl RemoveMemberHandler {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        memberships: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            organizations,
            memberships,
        }
    }

    pub async fn handle(&self, command: RemoveMemberCommand) -> Result<(), MembershipError> {
        let organization = self
            .organizations
            .get(&command.organization_id)
            .await?
            .ok_or(MembershipError::organization_not_found(
                command.organization_id,
            ))?;

        if !organization.is_owner(&command.actor.user_id) {
            return Err(MembershipError::permission_denied(
                "only the organization owner can remove members",
            ));
        }

        let mut membership = self
            .memberships
            .get(&command.organization_id, &command.membership_id)
            .await?
            .ok_or(MembershipError::membership_not_found(command.membership_id))?;

        if membership.user_id.as_ref() == Some(&organization.owner_user_id) {
            return Err(MembershipError::CannotRemoveOwner);
        }

        let was_live = membership.status.is_live();
        membership.remove()?;
        self.memberships.update(&membership).await?;

        if was_live {
            self.organizations
                .adjust_member_count(&organization.id, -1)
                .await?;
        }

        tracing::info!(
            organization_id = %organization.id,
            membership_id = %membership.id,
            "membership removed"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::invitation::test_support::{
        company, owner_actor, InMemoryMembershipStore, InMemoryOrganizationStore, OWNER_EMAIL,
        OWNER_USER,
    };
    use crate::domain::foundation::{EmailAddress, Timestamp, UserId};
    use crate::domain::membership::{InviteToken, Membership, MembershipStatus};

    fn handler(
        organizations: Arc<InMemoryOrganizationStore>,
        memberships: Arc<InMemoryMembershipStore>,
    ) -> RemoveMemberHandler {
        RemoveMemberHandler::new(organizations, memberships)
    }

    #[tokio::test]
    async fn removes_an_active_member_and_clears_access() {
        let organization = company();
        let organizations = Arc::new(InMemoryOrganizationStore::with(organization.clone()));
        organizations
            .adjust_member_count(&organization.id, 1)
            .await
            .unwrap();
        let memberships = Arc::new(InMemoryMembershipStore::new());
        let member = memberships
            .seed_active(&organization, "leaver@acme.test")
            .await;

        handler(Arc::clone(&organizations), Arc::clone(&memberships))
            .handle(RemoveMemberCommand {
                actor: owner_actor(),
                organization_id: organization.id,
                membership_id: member.id,
            })
            .await
            .unwrap();

        let stored = memberships.by_id(&member.id).await.unwrap();
        assert_eq!(stored.status, MembershipStatus::Removed);
        assert!(!stored.has_access);
        assert!(stored.user_id.is_none());
        assert_eq!(organizations.member_count(&organization.id).await, 0);
    }

    #[tokio::test]
    async fn revokes_a_pending_invitation() {
        let organization = company();
        let organizations = Arc::new(InMemoryOrganizationStore::with(organization.clone()));
        organizations
            .adjust_member_count(&organization.id, 1)
            .await
            .unwrap();
        let memberships = Arc::new(InMemoryMembershipStore::new());
        let pending = memberships
            .seed_invited(
                &organization,
                "pending@acme.test",
                InviteToken::generate(),
                Timestamp::now().add_days(7),
            )
            .await;

        handler(Arc::clone(&organizations), Arc::clone(&memberships))
            .handle(RemoveMemberCommand {
                actor: owner_actor(),
                organization_id: organization.id,
                membership_id: pending.id,
            })
            .await
            .unwrap();

        let stored = memberships.by_id(&pending.id).await.unwrap();
        assert_eq!(stored.status, MembershipStatus::Removed);
        assert!(stored.invite_token.is_none());
    }

    #[tokio::test]
    async fn owner_cannot_be_removed() {
        let organization = company();
        let organizations = Arc::new(InMemoryOrganizationStore::with(organization.clone()));
        let memberships = Arc::new(InMemoryMembershipStore::new());

        // The owner's own membership record.
        let mut owner_membership = Membership::invite(
            MembershipId::new(),
            organization.id,
            EmailAddress::parse(OWNER_EMAIL).unwrap(),
            InviteToken::generate(),
            Timestamp::now().add_days(7),
        );
        let owner_email = owner_membership.email.clone();
        owner_membership
            .redeem(
                UserId::new(OWNER_USER).unwrap(),
                &owner_email,
                false,
                Timestamp::now(),
            )
            .unwrap();
        memberships.insert(&owner_membership).await.unwrap();

        let result = handler(organizations, memberships)
            .handle(RemoveMemberCommand {
                actor: owner_actor(),
                organization_id: organization.id,
                membership_id: owner_membership.id,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::CannotRemoveOwner)));
    }

    #[tokio::test]
    async fn non_owner_cannot_remove() {
        let organization = company();
        let organizations = Arc::new(InMemoryOrganizationStore::with(organization.clone()));
        let memberships = Arc::new(InMemoryMembershipStore::new());
        let member = memberships
            .seed_active(&organization, "member@acme.test")
            .await;

        let result = handler(organizations, memberships)
            .handle(RemoveMemberCommand {
                actor: Actor::new("user-peer", "peer@acme.test").unwrap(),
                organization_id: organization.id,
                membership_id: member.id,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn removing_twice_fails() {
        let organization = company();
        let organizations = Arc::new(InMemoryOrganizationStore::with(organization.clone()));
        let memberships = Arc::new(InMemoryMembershipStore::new());
        let member = memberships
            .seed_active(&organization, "twice@acme.test")
            .await;
        let handler = handler(organizations, memberships);
        let command = RemoveMemberCommand {
            actor: owner_actor(),
            organization_id: organization.id,
            membership_id: member.id,
        };

        handler.handle(command.clone()).await.unwrap();
        let second = handler.handle(command).await;

        assert!(matches!(second, Err(MembershipError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn unknown_membership_fails() {
        let organization = company();
        let organizations = Arc::new(InMemoryOrganizationStore::with(organization.clone()));

        let result = handler(organizations, Arc::new(InMemoryMembershipStore::new()))
            .handle(RemoveMemberCommand {
                actor: owner_actor(),
                organization_id: organization.id,
                membership_id: MembershipId::new(),
            })
            .await;

        assert!(matches!(
            result,
            Err(MembershipError::MembershipNotFound(_))
        ));
    }
}
