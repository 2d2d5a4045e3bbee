//! `taskgate-core`: shared data model for the task gateway and its clients.
//!
//! This crate is transport-agnostic: no HTTP, no cookies, no IO.

pub mod envelope;
pub mod error;
pub mod id;
pub mod page;
pub mod task;
pub mod time;
pub mod user;

pub use envelope::{FieldError, Payload, backend_message, unwrap_data, validation_errors};
pub use error::{ModelError, ModelResult};
pub use id::EntityId;
pub use page::{CursorPage, OffsetPage, Page};
pub use task::{NewTask, Task, TaskQuery, TaskUpdate};
pub use user::{CurrentUser, Role, UserSummary};
