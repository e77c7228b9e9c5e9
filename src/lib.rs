#![doc = "The `taskgate` library crate."]
#![doc = ""]
#![doc = "Task management backend: task CRUD, password-based accounts, signed session"]
#![doc = "tokens and a role-aware access policy deciding which tasks a caller may see"]
#![doc = "and change. The binary (`main.rs`) wires these into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
