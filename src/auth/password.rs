use crate::error::AppError;
use bcrypt::{hash, verify};

/// Work factor used when `BCRYPT_COST` is not set.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Salted bcrypt hashing with a fixed work factor.
///
/// Every call to [`hash`](PasswordHasher::hash) draws a fresh random salt, which
/// bcrypt embeds in its output, so the stored string is all `verify` needs.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    /// Checks `password` against a stored hash using bcrypt's own comparison.
    ///
    /// A malformed stored hash counts as a mismatch.
    pub fn verify(&self, password: &str, hashed_password: &str) -> bool {
        match verify(password, hashed_password) {
            Ok(matches) => matches,
            Err(e) => {
                log::warn!("Stored password hash could not be checked: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}
