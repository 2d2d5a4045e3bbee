//! Gateway client: request retry on expired sessions, session lifecycle,
//! current-user context and typed task calls.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod session;
pub mod tasks;

pub use auth::AuthContext;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use request::{ApiRequest, FilePart, MultipartBody, RequestBody};
pub use session::{SessionManager, SessionState};
pub use tasks::TaskPage;
