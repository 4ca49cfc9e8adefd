//! Acting-identity context for engine operations.
//!
//! Every operation on the engine is performed by an `Actor` - an already
//! authenticated identity handed in by the surrounding platform. The engine
//! never validates credentials itself; session handling is an external
//! collaborator.

use super::{EmailAddress, UserId, ValidationError};

/// The authenticated identity performing an operation.
///
/// This is a **domain type** with no auth-provider dependencies. The platform's
/// session layer populates it after validating the caller.
#[derive(Debug, Clone)]
pub struct Actor {
    /// The unique user identifier from the auth provider.
    pub user_id: UserId,

    /// The email address registered with the acting account.
    pub email: EmailAddress,
}

impl Actor {
    /// Creates an actor from raw identity values.
    pub fn new(user_id: impl Into<String>, email: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            user_id: UserId::new(user_id)?,
            email: EmailAddress::parse(email)?,
        })
    }
}
