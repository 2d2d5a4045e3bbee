use crate::token::SessionToken;

/// `Authorization` header value for an outbound backend call.
pub fn authorization_value(token: &SessionToken) -> String {
    format!("Bearer {}", token.as_str())
}
