//! Session endpoints under `/api/auth`.
//!
//! These do more than forward: login/signup/refresh install the backend's
//! access token as the session cookie, logout removes it, and `me` normalises
//! the profile.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::Extension,
    http::{HeaderValue, Method, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};

use taskgate_auth::SessionToken;
use taskgate_core::{CurrentUser, unwrap_data};

use crate::app::Gateway;
use crate::app::errors::GatewayError;
use crate::backend::{BackendRequest, ForwardBody};
use crate::context::SessionContext;

/// Routes reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/logout", post(logout))
}

/// Routes that need the session cookie (guarded by the session middleware).
pub fn session_router() -> Router {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/refresh", post(refresh))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: &'static str,
    pub expires_at: Value,
}

pub async fn login(Extension(gateway): Extension<Arc<Gateway>>, body: Bytes) -> Response {
    issue_session(&gateway, "/auth/login", &body, "Login failed")
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

pub async fn signup(Extension(gateway): Extension<Arc<Gateway>>, body: Bytes) -> Response {
    issue_session(&gateway, "/auth/signup", &body, "Signup failed")
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

/// Always clears the cookie; the backend is not contacted.
pub async fn logout(Extension(gateway): Extension<Arc<Gateway>>) -> Response {
    tracing::info!("session cleared by logout");
    with_cookie(
        Json(json!({ "message": "Logged out successfully" })).into_response(),
        &gateway.cookies.clear_cookie(),
    )
}

pub async fn me(
    Extension(gateway): Extension<Arc<Gateway>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    let result = async {
        let request = BackendRequest::new(Method::GET, "/auth/profile").bearer(session.token().clone());
        let payload = gateway
            .backend
            .send(request)
            .await?
            .into_success("Authentication failed")?
            .into_value();

        // Records without an id are passed through untouched.
        let body = match CurrentUser::from_backend(&payload) {
            Ok(user) => json!(user),
            Err(_) => payload,
        };
        Ok::<_, GatewayError>(Json(body).into_response())
    }
    .await;

    result.unwrap_or_else(IntoResponse::into_response)
}

/// Rotate the session token. Any failure also clears the cookie, leaving the
/// browser logged out rather than half-authenticated.
pub async fn refresh(
    Extension(gateway): Extension<Arc<Gateway>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    let result = async {
        let request =
            BackendRequest::new(Method::POST, "/auth/refresh_token").bearer(session.token().clone());
        let payload = gateway
            .backend
            .send(request)
            .await?
            .into_success("Token refresh failed")?
            .into_value();

        let data = unwrap_data(&payload);
        let token = access_token(data)?;
        let body = RefreshResponse {
            message: "Token refreshed successfully",
            expires_at: data.get("expires_at").cloned().unwrap_or(Value::Null),
        };
        Ok::<_, GatewayError>((body, token))
    }
    .await;

    match result {
        Ok((body, token)) => {
            tracing::info!("session token rotated");
            with_cookie(Json(body).into_response(), &gateway.cookies.set_cookie(&token))
        }
        Err(e) => {
            tracing::warn!(error = %e, "token refresh failed; clearing session");
            with_cookie(e.into_response(), &gateway.cookies.clear_cookie())
        }
    }
}

/// Shared login/signup flow: forward credentials, install the token, answer
/// with the normalised user.
async fn issue_session(
    gateway: &Gateway,
    path: &'static str,
    body: &[u8],
    fallback: &'static str,
) -> Result<Response, GatewayError> {
    let credentials: Value =
        serde_json::from_slice(body).map_err(|e| GatewayError::InvalidBody(e.to_string()))?;

    let request = BackendRequest::new(Method::POST, path).body(ForwardBody::Json(credentials));
    let payload = gateway
        .backend
        .send(request)
        .await?
        .into_success(fallback)?
        .into_value();

    let token = access_token(unwrap_data(&payload))?;
    let user = CurrentUser::from_backend(&payload)?.without_timestamps();

    tracing::info!(user_id = %user.id, role = %user.role, "session issued");
    Ok(with_cookie(
        Json(json!({ "user": user })).into_response(),
        &gateway.cookies.set_cookie(&token),
    ))
}

fn access_token(data: &Value) -> Result<SessionToken, GatewayError> {
    data.get("access_token")
        .and_then(Value::as_str)
        .ok_or(GatewayError::MissingAccessToken)
        .and_then(|raw| SessionToken::new(raw).map_err(|_| GatewayError::MissingAccessToken))
}

fn with_cookie(mut response: Response, cookie: &str) -> Response {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "session cookie is not a valid header value"),
    }
    response
}
