//! PostgreSQL backend.
//!
//! Expects the tables from `schema.sql`. All statements are runtime-checked
//! `sqlx::query_as` calls with bound parameters.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use super::{duplicate_username, unknown_owner, CredentialStore, TaskRepository};
use crate::auth::policy::OwnerScope;
use crate::config::DatabaseSettings;
use crate::error::AppError;
use crate::models::{Task, TaskFields, TaskFilter, User};

const TASK_COLUMNS: &str = "id, name, completed, user_id";
const USER_COLUMNS: &str = "id, username, password_hash, is_admin";

/// Maps the tasks.user_id foreign key failing to a client error.
fn task_write_error(error: sqlx::Error) -> AppError {
    match error {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => unknown_owner(),
        other => other.into(),
    }
}

/// Store backed by a shared `PgPool`.
///
/// The pool is owned by the process and handed in; cloning the store clones the
/// pool handle, not the connections.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `settings` and checks that the database answers.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .connect_with(settings.connect_options()?)
            .await?;

        let (now,): (chrono::DateTime<chrono::Utc>,) = sqlx::query_as("SELECT NOW()")
            .fetch_one(&pool)
            .await?;
        log::info!("Connected to PostgreSQL at {}", now);

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks{} ORDER BY id",
            TASK_COLUMNS,
            filter.where_clause()
        );

        let mut query_builder = sqlx::query_as::<_, Task>(&sql);
        if let Some(user_id) = filter.user_id {
            query_builder = query_builder.bind(user_id);
        }
        if let Some(completed) = filter.completed {
            query_builder = query_builder.bind(completed);
        }

        Ok(query_builder.fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: i32, owner: OwnerScope) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND ($2::INT IS NULL OR user_id = $2)",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn create(&self, fields: &TaskFields) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (name, completed, user_id) VALUES ($1, $2, $3) RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(fields.name())
        .bind(fields.completed)
        .bind(fields.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(task_write_error)?;

        Ok(task)
    }

    async fn update(
        &self,
        id: i32,
        fields: &TaskFields,
        owner: OwnerScope,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET name = $1, completed = $2, user_id = $3 \
             WHERE id = $4 AND ($5::INT IS NULL OR user_id = $5) \
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(fields.name())
        .bind(fields.completed)
        .bind(fields.user_id)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(task_write_error)?;

        Ok(task)
    }

    async fn delete(&self, id: i32, owner: OwnerScope) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM tasks WHERE id = $1 AND ($2::INT IS NULL OR user_id = $2)")
                .bind(id)
                .bind(owner)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError> {
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, is_admin) \
             VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(duplicate_username())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn delete_user(&self, id: i32) -> Result<bool, AppError> {
        // tasks.user_id is declared ON DELETE SET NULL, so owned tasks are orphaned.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
