use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use taskgate_auth::{CookiePolicy, CredentialError, SessionToken};

use crate::app::errors::GatewayError;
use crate::context::{RequestId, SessionContext};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct SessionState {
    pub cookies: Arc<CookiePolicy>,
}

/// Require a session cookie; inserts [`SessionContext`] for the handler.
///
/// Requests without one are answered with 401 before any backend call.
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_session(req.headers(), &state.cookies) {
        Ok(token) => token,
        Err(e) => {
            tracing::debug!(reason = %e, "rejecting request without session");
            return GatewayError::MissingSession.into_response();
        }
    };

    req.extensions_mut().insert(SessionContext::new(token));
    next.run(req).await
}

fn extract_session(headers: &HeaderMap, cookies: &CookiePolicy) -> Result<SessionToken, CredentialError> {
    cookies.token_from_headers(
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    )
}

/// Tag each request with a [`RequestId`] and run it inside a tracing span.
///
/// An inbound `x-request-id` is reused; the id is echoed on the response.
pub async fn request_context(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(RequestId::new)
        .unwrap_or_else(RequestId::generate);

    let span = tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    );
    req.extensions_mut().insert(request_id.clone());

    async move {
        let started = Instant::now();
        let mut response = next.run(req).await;

        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request finished"
        );

        if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
            response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
        }
        response
    }
    .instrument(span)
    .await
}
