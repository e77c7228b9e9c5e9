//! Access policy: decides which task rows a caller may see or change and which
//! operations need the administrator role.
//!
//! Two historical deployments of this service differed only in how `GET /tasks`
//! was served. Both are expressed here through [`AccessMode`]:
//!
//! | Operation                     | Anonymous | Regular user | Admin |
//! |-------------------------------|-----------|--------------|-------|
//! | List tasks (`Open`)           | all       | all          | all   |
//! | List tasks (`Authenticated`)  | 401       | own only     | all   |
//! | Create / update / delete task | allowed   | allowed      | allowed |
//! | List / delete users           | allowed   | allowed      | allowed |
//!
//! Task mutations and the user endpoints are not ownership-checked in either mode.
//! Setting `enforce_ownership` closes that gap: mutations then need a token,
//! regular users are confined to their own tasks, and user management and
//! admin registration become admin-only.

use std::str::FromStr;

use crate::auth::extractors::Caller;
use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::TaskFilter;

/// How `GET /tasks` is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// No token needed; callers filter with `user_id` and `completed` query parameters.
    Open,
    /// A token is required; regular users only see their own tasks.
    Authenticated,
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(AccessMode::Open),
            "authenticated" => Ok(AccessMode::Authenticated),
            other => Err(format!("unknown access mode '{}'", other)),
        }
    }
}

/// Row restriction applied to a single-task operation.
///
/// `None` means any row may be touched; `Some(id)` limits the operation to rows
/// whose `user_id` is `id`. Rows outside the scope are reported as not found.
pub type OwnerScope = Option<i32>;

#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    mode: AccessMode,
    enforce_ownership: bool,
}

/// Fails with 403 unless the claims carry the administrator role.
pub fn require_admin(claims: &Claims) -> Result<(), AppError> {
    if claims.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".into()))
    }
}

fn own_rows(claims: &Claims) -> OwnerScope {
    if claims.is_admin {
        None
    } else {
        Some(claims.user_id)
    }
}

impl AccessPolicy {
    pub fn new(mode: AccessMode, enforce_ownership: bool) -> Self {
        Self {
            mode,
            enforce_ownership,
        }
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn enforces_ownership(&self) -> bool {
        self.enforce_ownership
    }

    /// Turns the caller's requested filter into the filter actually executed.
    ///
    /// In `Authenticated` mode the requested filter is ignored entirely.
    pub fn list_filter(
        &self,
        caller: &Caller,
        requested: TaskFilter,
    ) -> Result<TaskFilter, AppError> {
        match self.mode {
            AccessMode::Open => Ok(requested),
            AccessMode::Authenticated => {
                let claims = caller.claims()?;
                Ok(match own_rows(claims) {
                    Some(user_id) => TaskFilter::owned_by(user_id),
                    None => TaskFilter::default(),
                })
            }
        }
    }

    /// Scope for reading a single task; mirrors what listing would show.
    pub fn read_scope(&self, caller: &Caller) -> Result<OwnerScope, AppError> {
        match self.mode {
            AccessMode::Open => Ok(None),
            AccessMode::Authenticated => Ok(own_rows(caller.claims()?)),
        }
    }

    /// Scope for updating or deleting a task.
    pub fn mutation_scope(&self, caller: &Caller) -> Result<OwnerScope, AppError> {
        if !self.enforce_ownership {
            return Ok(None);
        }
        Ok(own_rows(caller.claims()?))
    }

    /// Resolves the owner written on create or update.
    ///
    /// With ownership enforced, a regular user may only assign tasks to itself;
    /// leaving `user_id` out assigns the task to the caller.
    pub fn assign_owner(
        &self,
        caller: &Caller,
        requested: Option<i32>,
    ) -> Result<Option<i32>, AppError> {
        if !self.enforce_ownership {
            return Ok(requested);
        }
        let claims = caller.claims()?;
        if claims.is_admin {
            return Ok(requested);
        }
        match requested {
            None => Ok(Some(claims.user_id)),
            Some(user_id) if user_id == claims.user_id => Ok(Some(user_id)),
            Some(_) => Err(AppError::Forbidden(
                "Cannot assign tasks to another user".into(),
            )),
        }
    }

    /// Gate for `GET /users` and `DELETE /users/{id}`.
    pub fn manage_users(&self, caller: &Caller) -> Result<(), AppError> {
        if !self.enforce_ownership {
            return Ok(());
        }
        require_admin(caller.claims()?)
    }

    /// Gate for registering an account, which may request the admin flag.
    pub fn register(&self, caller: &Caller, is_admin: bool) -> Result<(), AppError> {
        if !self.enforce_ownership || !is_admin {
            return Ok(());
        }
        require_admin(caller.claims()?)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(AccessMode::Authenticated, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(user_id: i32, is_admin: bool) -> Claims {
        Claims {
            user_id,
            is_admin,
            iat: 0,
            exp: None,
        }
    }

    fn user(id: i32) -> Caller {
        Caller::Verified(claims(id, false))
    }

    fn admin(id: i32) -> Caller {
        Caller::Verified(claims(id, true))
    }

    fn expect_status(result: Result<impl std::fmt::Debug, AppError>, expected: &str) {
        match (result, expected) {
            (Err(AppError::Unauthorized(msg)), "401") => {
                assert!(msg == "Authentication required" || msg == "Invalid token")
            }
            (Err(AppError::Forbidden(_)), "403") => {}
            (other, _) => panic!("Expected {}, got {:?}", expected, other),
        }
    }

    #[test]
    fn test_open_mode_lists_with_requested_filter() {
        let policy = AccessPolicy::new(AccessMode::Open, false);
        let requested = TaskFilter {
            user_id: Some(3),
            completed: Some(true),
        };
        for caller in [Caller::Anonymous, user(1), admin(2), Caller::InvalidToken] {
            assert_eq!(policy.list_filter(&caller, requested).unwrap(), requested);
        }
    }

    #[test]
    fn test_authenticated_mode_scopes_listing() {
        let policy = AccessPolicy::new(AccessMode::Authenticated, false);
        let requested = TaskFilter {
            user_id: Some(99),
            completed: Some(false),
        };

        assert_eq!(
            policy.list_filter(&user(5), requested).unwrap(),
            TaskFilter::owned_by(5)
        );
        assert_eq!(
            policy.list_filter(&admin(1), requested).unwrap(),
            TaskFilter::default()
        );
        expect_status(policy.list_filter(&Caller::Anonymous, requested), "401");
        expect_status(policy.list_filter(&Caller::InvalidToken, requested), "401");
    }

    #[test]
    fn test_mutations_unchecked_by_default() {
        for mode in [AccessMode::Open, AccessMode::Authenticated] {
            let policy = AccessPolicy::new(mode, false);
            assert_eq!(policy.mutation_scope(&Caller::Anonymous).unwrap(), None);
            assert_eq!(policy.mutation_scope(&user(2)).unwrap(), None);
            assert_eq!(
                policy.assign_owner(&Caller::Anonymous, Some(8)).unwrap(),
                Some(8)
            );
            assert_eq!(policy.assign_owner(&user(2), Some(8)).unwrap(), Some(8));
            assert!(policy.manage_users(&Caller::Anonymous).is_ok());
            assert!(policy.register(&Caller::Anonymous, true).is_ok());
        }
    }

    #[test]
    fn test_enforced_ownership() {
        let policy = AccessPolicy::new(AccessMode::Authenticated, true);

        expect_status(policy.mutation_scope(&Caller::Anonymous), "401");
        assert_eq!(policy.mutation_scope(&user(4)).unwrap(), Some(4));
        assert_eq!(policy.mutation_scope(&admin(1)).unwrap(), None);

        assert_eq!(policy.assign_owner(&user(4), None).unwrap(), Some(4));
        assert_eq!(policy.assign_owner(&user(4), Some(4)).unwrap(), Some(4));
        expect_status(policy.assign_owner(&user(4), Some(5)), "403");
        assert_eq!(policy.assign_owner(&admin(1), Some(5)).unwrap(), Some(5));
        assert_eq!(policy.assign_owner(&admin(1), None).unwrap(), None);

        expect_status(policy.manage_users(&Caller::Anonymous), "401");
        expect_status(policy.manage_users(&user(4)), "403");
        assert!(policy.manage_users(&admin(1)).is_ok());

        assert!(policy.register(&Caller::Anonymous, false).is_ok());
        expect_status(policy.register(&Caller::Anonymous, true), "401");
        expect_status(policy.register(&user(4), true), "403");
        assert!(policy.register(&admin(1), true).is_ok());
    }

    #[test]
    fn test_read_scope_follows_listing() {
        let open = AccessPolicy::new(AccessMode::Open, true);
        assert_eq!(open.read_scope(&Caller::Anonymous).unwrap(), None);

        let authenticated = AccessPolicy::new(AccessMode::Authenticated, false);
        assert_eq!(authenticated.read_scope(&user(6)).unwrap(), Some(6));
        assert_eq!(authenticated.read_scope(&admin(1)).unwrap(), None);
        expect_status(authenticated.read_scope(&Caller::Anonymous), "401");
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&claims(1, true)).is_ok());
        expect_status(require_admin(&claims(1, false)), "403");
    }

    #[test]
    fn test_access_mode_parsing() {
        assert_eq!("open".parse::<AccessMode>().unwrap(), AccessMode::Open);
        assert_eq!(
            " Authenticated ".parse::<AccessMode>().unwrap(),
            AccessMode::Authenticated
        );
        assert!("admin".parse::<AccessMode>().is_err());
    }
}
