use thiserror::Error;

/// Opaque bearer token issued by the backend.
///
/// The gateway never inspects it; it only checks that the value can be stored
/// in a cookie and sent in a header. `Debug` is redacted so tokens do not end
/// up in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no session token present")]
    Missing,

    #[error("session token is empty")]
    Empty,

    #[error("session token contains characters not allowed in a cookie value")]
    InvalidCharacters,
}

impl SessionToken {
    /// Validate and wrap a token.
    pub fn new(raw: impl Into<String>) -> Result<Self, CredentialError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty);
        }
        if !trimmed.bytes().all(is_cookie_octet) {
            return Err(CredentialError::InvalidCharacters);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

// RFC 6265 cookie-octet.
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_shaped_tokens_are_accepted() {
        let token = SessionToken::new("eyJhbGciOi.eyJzdWIiOjF9.sig-_=").unwrap();
        assert_eq!(token.as_str(), "eyJhbGciOi.eyJzdWIiOjF9.sig-_=");
    }

    #[test]
    fn tokens_that_would_break_the_cookie_are_rejected() {
        assert_eq!(SessionToken::new(""), Err(CredentialError::Empty));
        assert_eq!(SessionToken::new("   "), Err(CredentialError::Empty));
        assert_eq!(SessionToken::new("a;b"), Err(CredentialError::InvalidCharacters));
        assert_eq!(SessionToken::new("a b"), Err(CredentialError::InvalidCharacters));
        assert_eq!(SessionToken::new("a\"b"), Err(CredentialError::InvalidCharacters));
    }

    #[test]
    fn debug_does_not_leak() {
        let token = SessionToken::new("secret").unwrap();
        assert!(!format!("{token:?}").contains("secret"));
    }
}
