//! Session cookie policy.
//!
//! The cookie is `HttpOnly; SameSite=Strict; Path=/`, lives for seven days and
//! carries `Secure` only in production.

use crate::token::{CredentialError, SessionToken};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Lifetime of a freshly set session cookie (7 days).
pub const SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// How the gateway renders the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    name: &'static str,
    max_age_secs: u64,
    secure: bool,
}

impl CookiePolicy {
    /// Policy for the given deployment; `Secure` is set only when `production`.
    pub fn new(production: bool) -> Self {
        Self {
            name: SESSION_COOKIE,
            max_age_secs: SESSION_MAX_AGE_SECS,
            secure: production,
        }
    }

    /// `Set-Cookie` value storing `token`.
    pub fn set_cookie(&self, token: &SessionToken) -> String {
        self.render(token.as_str(), self.max_age_secs)
    }

    /// `Set-Cookie` value that removes the session (`Max-Age=0`).
    pub fn clear_cookie(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: u64) -> String {
        let mut parts = vec![format!("{}={}", self.name, value), "HttpOnly".to_string()];
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.push("SameSite=Strict".to_string());
        parts.push("Path=/".to_string());
        parts.push(format!("Max-Age={max_age}"));
        parts.join("; ")
    }

    /// Read the session token out of a request's `Cookie` header(s).
    pub fn token_from_headers<'a>(
        &self,
        cookie_headers: impl IntoIterator<Item = &'a str>,
    ) -> Result<SessionToken, CredentialError> {
        cookie_headers
            .into_iter()
            .find_map(|h| token_from_cookie_header(h, self.name))
            .ok_or(CredentialError::Missing)
    }
}

/// Find cookie `name` in a `Cookie` header and validate it as a token.
///
/// Empty or malformed values count as absent.
pub fn token_from_cookie_header(header: &str, name: &str) -> Option<SessionToken> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .and_then(|(_, v)| {
            let v = v.trim().trim_matches('"');
            match SessionToken::new(v) {
                Ok(token) => Some(token),
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring unusable session cookie");
                    None
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn development_cookie_has_no_secure_flag() {
        let policy = CookiePolicy::new(false);
        let token = SessionToken::new("T").unwrap();

        assert_eq!(
            policy.set_cookie(&token),
            "token=T; HttpOnly; SameSite=Strict; Path=/; Max-Age=604800"
        );
        assert_eq!(
            policy.clear_cookie(),
            "token=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0"
        );
    }

    #[test]
    fn production_cookie_is_secure() {
        let policy = CookiePolicy::new(true);
        let token = SessionToken::new("T").unwrap();

        assert_eq!(
            policy.set_cookie(&token),
            "token=T; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=604800"
        );
        assert!(policy.clear_cookie().contains("Secure"));
    }

    #[test]
    fn token_is_found_among_other_cookies() {
        let t = token_from_cookie_header("theme=dark; token=abc.def; lang=en", "token").unwrap();
        assert_eq!(t.as_str(), "abc.def");

        assert!(token_from_cookie_header("theme=dark", "token").is_none());
        assert!(token_from_cookie_header("token=", "token").is_none());
        assert!(token_from_cookie_header("xtoken=abc", "token").is_none());
    }

    #[test]
    fn multiple_cookie_headers_are_searched() {
        let policy = CookiePolicy::new(false);
        let t = policy.token_from_headers(["a=1", "token=zz"]).unwrap();
        assert_eq!(t.as_str(), "zz");
        assert_eq!(
            policy.token_from_headers(Vec::<&str>::new()),
            Err(CredentialError::Missing)
        );
    }

    proptest! {
        #[test]
        fn set_cookie_round_trips_through_cookie_header(
            raw in "[A-Za-z0-9._~+/=-]{1,64}",
            before in "[a-z]{1,8}",
        ) {
            prop_assume!(before != SESSION_COOKIE);
            let policy = CookiePolicy::new(false);
            let token = SessionToken::new(raw.clone()).unwrap();
            let set = policy.set_cookie(&token);
            let (pair, _) = set.split_once(';').unwrap();

            let header = format!("{before}=x; {pair}");
            let parsed = token_from_cookie_header(&header, SESSION_COOKIE).unwrap();
            prop_assert_eq!(parsed.as_str(), raw.as_str());
        }

        #[test]
        fn arbitrary_headers_never_panic(header in ".{0,128}") {
            let _ = token_from_cookie_header(&header, SESSION_COOKIE);
        }
    }
}
