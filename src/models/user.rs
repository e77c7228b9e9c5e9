use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored account, including its password hash.
///
/// This type is never serialized into a response; use [`User::profile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// The externally visible form of a user, as returned by `/register` and `/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            is_admin: self.is_admin,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        }
    }
}
