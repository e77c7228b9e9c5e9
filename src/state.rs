use std::sync::Arc;

use crate::auth::{AccessPolicy, PasswordHasher, TokenService};
use crate::config::Config;
use crate::store::{CredentialStore, TaskRepository};

/// Everything a request handler needs, shared read-only across workers.
///
/// Registered once as `web::Data<AppState>`; the store handles wrap the
/// connection pool, which stays owned by the process.
pub struct AppState {
    pub tasks: Arc<dyn TaskRepository>,
    pub users: Arc<dyn CredentialStore>,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
    pub policy: AccessPolicy,
}

impl AppState {
    /// Builds the state around one store serving both tasks and users.
    pub fn new<S>(
        store: Arc<S>,
        tokens: TokenService,
        passwords: PasswordHasher,
        policy: AccessPolicy,
    ) -> Self
    where
        S: TaskRepository + CredentialStore + 'static,
    {
        Self {
            tasks: store.clone(),
            users: store,
            tokens,
            passwords,
            policy,
        }
    }

    pub fn from_config<S>(store: Arc<S>, config: &Config) -> Self
    where
        S: TaskRepository + CredentialStore + 'static,
    {
        Self::new(
            store,
            TokenService::new(&config.jwt_secret, config.jwt_ttl),
            PasswordHasher::new(config.bcrypt_cost),
            AccessPolicy::new(config.access_mode, config.enforce_ownership),
        )
    }
}
