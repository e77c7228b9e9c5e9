use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Represents a task as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Identifier assigned by the datastore.
    pub id: i32,
    /// Trimmed, non-empty task name.
    pub name: String,
    /// Completion flag. Tasks created without one keep it unset.
    pub completed: Option<bool>,
    /// Owner of the task. Ownerless tasks are allowed.
    pub user_id: Option<i32>,
}

/// Request body for `POST /tasks` and `PUT /tasks/{id}`.
///
/// Update is a full replace: fields left out of a `PUT` body are written as null.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub user_id: Option<i32>,
}

/// The validated column values written by create and update.
///
/// The only way to build one is [`TaskFields::new`], so a store never sees an
/// untrimmed or empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    name: String,
    pub completed: Option<bool>,
    pub user_id: Option<i32>,
}

impl TaskFields {
    pub fn new(
        name: Option<&str>,
        completed: Option<bool>,
        user_id: Option<i32>,
    ) -> Result<Self, AppError> {
        let name = name.map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(AppError::ValidationError("Task name is required".into()));
        }
        Ok(Self {
            name: name.to_string(),
            completed,
            user_id,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Query parameters accepted by `GET /tasks`, also used as the repository filter.
///
/// Every present field narrows the result; absent fields impose no constraint.
/// Other query parameters are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TaskFilter {
    pub user_id: Option<i32>,
    pub completed: Option<bool>,
}

impl TaskFilter {
    /// Filter matching only the tasks owned by `user_id`.
    pub fn owned_by(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            completed: None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.user_id.map_or(true, |id| task.user_id == Some(id))
            && self.completed.map_or(true, |c| task.completed == Some(c))
    }

    /// Builds the `WHERE` clause for this filter with numbered placeholders.
    ///
    /// Values are never interpolated; the caller binds `user_id` then `completed`,
    /// skipping absent ones, in the same order the placeholders are emitted.
    pub fn where_clause(&self) -> String {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_count = 1;

        if self.user_id.is_some() {
            conditions.push(format!("user_id = ${}", param_count));
            param_count += 1;
        }
        if self.completed.is_some() {
            conditions.push(format!("completed = ${}", param_count));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }
}
