//! Shared forwarding path for proxied backend resources.

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::app::Gateway;
use crate::app::errors::GatewayError;
use crate::backend::{BackendRequest, ForwardBody};
use crate::context::SessionContext;

/// Upper bound on a buffered inbound body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// An inbound proxied request, buffered.
///
/// `path` is relative to the router the handler is mounted in, so under
/// `/api/proxy` it is already the backend path.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequest<S> for Inbound {
    type Rejection = GatewayError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| GatewayError::InvalidBody(e.to_string()))?;

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            content_type: parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        })
    }
}

/// Decide what body to send upstream.
///
/// JSON bodies on POST/PUT/PATCH are parsed and re-serialised; any other
/// method except GET/DELETE forwards the raw body as text.
pub fn forward_body(
    method: &Method,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<ForwardBody, GatewayError> {
    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));
    let carries_body = *method == Method::POST || *method == Method::PUT || *method == Method::PATCH;

    if is_json && carries_body {
        let value = serde_json::from_slice(body).map_err(|e| GatewayError::InvalidBody(e.to_string()))?;
        return Ok(ForwardBody::Json(value));
    }
    if *method != Method::GET && *method != Method::DELETE {
        return Ok(ForwardBody::Text(String::from_utf8_lossy(body).into_owned()));
    }
    Ok(ForwardBody::None)
}

/// Forward `inbound` with the session's bearer token and normalise the reply.
///
/// `fallback` is the error message used when the backend fails without one.
pub async fn forward(
    gateway: &Gateway,
    session: &SessionContext,
    inbound: Inbound,
    fallback: &'static str,
) -> Response {
    match try_forward(gateway, session, inbound, fallback).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn try_forward(
    gateway: &Gateway,
    session: &SessionContext,
    inbound: Inbound,
    fallback: &'static str,
) -> Result<Response, GatewayError> {
    let body = forward_body(&inbound.method, inbound.content_type.as_deref(), &inbound.body)?;

    let request = BackendRequest::new(inbound.method, inbound.path)
        .query(inbound.query)
        .bearer(session.token().clone())
        .body(body);

    let payload = gateway.backend.send(request).await?.into_success(fallback)?;
    Ok((StatusCode::OK, Json(payload.into_value())).into_response())
}
