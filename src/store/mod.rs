//! Persistence for users and tasks.
//!
//! Handlers only see the [`TaskRepository`] and [`CredentialStore`] traits. Each
//! trait method is a single atomic statement against the backing datastore, so
//! no operation needs a transaction or a cross-request lock.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::auth::policy::OwnerScope;
use crate::error::AppError;
use crate::models::{Task, TaskFields, TaskFilter, User};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// CRUD over task records.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Tasks matching every present field of `filter`, ordered by id.
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError>;

    /// The task with `id`, if it exists within `owner`.
    async fn get(&self, id: i32, owner: OwnerScope) -> Result<Option<Task>, AppError>;

    async fn create(&self, fields: &TaskFields) -> Result<Task, AppError>;

    /// Overwrites name, completed and user_id. `None` when no row within `owner` has `id`.
    async fn update(
        &self,
        id: i32,
        fields: &TaskFields,
        owner: OwnerScope,
    ) -> Result<Option<Task>, AppError>;

    /// `true` if a row within `owner` was removed.
    async fn delete(&self, id: i32, owner: OwnerScope) -> Result<bool, AppError>;
}

/// Persisted user identities.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a user. A taken username fails with `AppError::Conflict`; the check
    /// and the insert happen atomically inside the datastore.
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    /// `true` if a row was removed. Tasks owned by the user are kept with no owner.
    async fn delete_user(&self, id: i32) -> Result<bool, AppError>;
}

pub(crate) fn duplicate_username() -> AppError {
    AppError::Conflict("Username already exists".into())
}

/// A task referenced a `user_id` with no account behind it.
pub(crate) fn unknown_owner() -> AppError {
    AppError::ValidationError("User not found".into())
}
