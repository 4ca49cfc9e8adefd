//! Membership domain - invitation and acceptance records.

mod aggregate;
mod errors;
mod invite_token;
mod status;

pub use aggregate::Membership;
pub use errors::MembershipError;
pub use invite_token::InviteToken;
pub use status::MembershipStatus;
