//! In-process backend used for local development (`STORAGE_BACKEND=memory`)
//! and by the HTTP test suite.
//!
//! Both tables live behind one `RwLock`, so every operation is atomic in the
//! same way a single SQL statement is.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{duplicate_username, unknown_owner, CredentialStore, TaskRepository};
use crate::auth::policy::OwnerScope;
use crate::error::AppError;
use crate::models::{Task, TaskFields, TaskFilter, User};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    tasks: BTreeMap<i32, Task>,
    last_user_id: i32,
    last_task_id: i32,
}

fn in_scope(task: &Task, owner: OwnerScope) -> bool {
    owner.map_or(true, |id| task.user_id == Some(id))
}

impl Tables {
    // Mirrors the foreign key on tasks.user_id.
    fn check_owner(&self, user_id: Option<i32>) -> Result<(), AppError> {
        match user_id {
            Some(id) if !self.users.contains_key(&id) => Err(unknown_owner()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read();
        Ok(tables
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i32, owner: OwnerScope) -> Result<Option<Task>, AppError> {
        let tables = self.tables.read();
        Ok(tables
            .tasks
            .get(&id)
            .filter(|task| in_scope(task, owner))
            .cloned())
    }

    async fn create(&self, fields: &TaskFields) -> Result<Task, AppError> {
        let mut tables = self.tables.write();
        tables.check_owner(fields.user_id)?;
        tables.last_task_id += 1;
        let task = Task {
            id: tables.last_task_id,
            name: fields.name().to_string(),
            completed: fields.completed,
            user_id: fields.user_id,
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update(
        &self,
        id: i32,
        fields: &TaskFields,
        owner: OwnerScope,
    ) -> Result<Option<Task>, AppError> {
        let mut tables = self.tables.write();
        if !tables.tasks.get(&id).map_or(false, |task| in_scope(task, owner)) {
            return Ok(None);
        }
        tables.check_owner(fields.user_id)?;
        let task = match tables.tasks.get_mut(&id) {
            Some(task) => task,
            None => return Ok(None),
        };
        task.name = fields.name().to_string();
        task.completed = fields.completed;
        task.user_id = fields.user_id;
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: i32, owner: OwnerScope) -> Result<bool, AppError> {
        let mut tables = self.tables.write();
        let removable = tables
            .tasks
            .get(&id)
            .map_or(false, |task| in_scope(task, owner));
        if removable {
            tables.tasks.remove(&id);
        }
        Ok(removable)
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|user| user.username == username) {
            return Err(duplicate_username());
        }
        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.tables.read().users.values().cloned().collect())
    }

    async fn delete_user(&self, id: i32) -> Result<bool, AppError> {
        let mut tables = self.tables.write();
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        for task in tables.tasks.values_mut() {
            if task.user_id == Some(id) {
                task.user_id = None;
            }
        }
        Ok(true)
    }
}
