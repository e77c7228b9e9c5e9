pub mod extractors;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::AppError;

pub use extractors::Caller;
pub use middleware::TokenMiddleware;
pub use password::PasswordHasher;
pub use policy::{require_admin, AccessMode, AccessPolicy};
pub use token::{Claims, TokenService};

/// Represents the payload for a user login request.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Represents the payload for a new user registration request.
///
/// Both credentials are optional at the JSON level so that a missing one is
/// reported with the same message as an empty one.
#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    /// Desired username: any non-empty string of up to 255 characters.
    #[validate(length(max = 255, message = "Username is too long"))]
    #[serde(default)]
    pub username: Option<String>,
    /// Plaintext password. Only ever passed to the password hasher.
    #[validate(length(max = 72))]
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

impl RegisterRequest {
    /// Returns `(username, password)` once both are present, non-empty and valid.
    pub fn credentials(&self) -> Result<(&str, &str), AppError> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                self.validate()?;
                Ok((username, password))
            }
            _ => Err(AppError::BadRequest("Username and password required".into())),
        }
    }
}

// Manual Debug impls keep plaintext passwords out of logs.
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// Response body of a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Signed session token to send as `Authorization: Bearer <token>`.
    pub token: String,
    pub username: String,
    pub is_admin: bool,
}
