//! Proxy gateway: holds the session cookie, forwards authenticated calls to
//! the backend API and normalises its answers into client-facing JSON.

pub mod app;
pub mod backend;
pub mod config;
pub mod context;
pub mod middleware;

pub use app::build_app;
pub use config::{Environment, GatewayConfig};
