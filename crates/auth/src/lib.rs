//! `taskgate-auth`: credential store for the gateway session.
//!
//! The bearer token lives only in an HTTP-only cookie set by the gateway; this
//! crate renders and reads that cookie and builds the outbound `Authorization`
//! header. It does not depend on any HTTP framework.

pub mod bearer;
pub mod cookie;
pub mod token;

pub use bearer::authorization_value;
pub use cookie::{CookiePolicy, SESSION_COOKIE, SESSION_MAX_AGE_SECS, token_from_cookie_header};
pub use token::{CredentialError, SessionToken};
