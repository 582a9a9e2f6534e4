//! Response envelopes shared by the user-facing handlers.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::User;

/// `{"user": ...}` envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserEnvelope {
    /// The affected user.
    pub user: User,
}

/// `{"users": [...]}` envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsersEnvelope {
    /// Every user, newest first.
    pub users: Vec<User>,
}

impl From<User> for UserEnvelope {
    fn from(user: User) -> Self {
        Self { user }
    }
}
