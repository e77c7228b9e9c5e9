pub mod task;
pub mod user;

pub use task::{Task, TaskFields, TaskFilter, TaskInput};
pub use user::{User, UserProfile};
