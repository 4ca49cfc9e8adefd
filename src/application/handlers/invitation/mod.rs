//! Invitation flow handlers - issue, accept, decline, resend, remove.

mod accept_invite;
mod decline_invite;
mod issue_invite;
mod remove_member;
mod resend_invite;

#[cfg(test)]
pub mod test_support;

pub use accept_invite::{AcceptInviteCommand, AcceptInviteHandler, AcceptInviteResult};
pub use decline_invite::{DeclineInviteCommand, DeclineInviteHandler, DeclineInviteResult};
pub use issue_invite::{IssueInviteCommand, IssueInviteHandler, IssueInviteResult};
pub use remove_member::{RemoveMemberCommand, RemoveMemberHandler};
pub use resend_invite::{ResendInviteCommand, ResendInviteHandler, ResendInviteResult};
