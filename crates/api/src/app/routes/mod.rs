pub mod auth;
pub mod forward;
pub mod proxy;
pub mod system;
