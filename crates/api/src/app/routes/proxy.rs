//! Proxied backend resources, mounted under `/api/proxy`.
//!
//! `/tasks`, `/tasks/:id` and `/users/list` get dedicated handlers (and their
//! own error messages); other methods on those paths and everything else go
//! through the catch-all.

use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    response::Response,
    routing::{any, get},
};

use crate::app::Gateway;
use crate::app::routes::forward::{Inbound, forward};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task).fallback(forward_any))
        .route(
            "/tasks/:id",
            get(get_task)
                .patch(update_task)
                .delete(delete_task)
                .fallback(forward_any),
        )
        .route("/users/list", get(list_users).fallback(forward_any))
        .route("/*path", any(forward_any))
}

pub async fn list_tasks(
    Extension(gateway): Extension<Arc<Gateway>>,
    Extension(session): Extension<SessionContext>,
    inbound: Inbound,
) -> Response {
    forward(&gateway, &session, inbound, "Failed to fetch tasks").await
}

pub async fn create_task(
    Extension(gateway): Extension<Arc<Gateway>>,
    Extension(session): Extension<SessionContext>,
    inbound: Inbound,
) -> Response {
    forward(&gateway, &session, inbound, "Failed to create task").await
}

pub async fn get_task(
    Extension(gateway): Extension<Arc<Gateway>>,
    Extension(session): Extension<SessionContext>,
    inbound: Inbound,
) -> Response {
    forward(&gateway, &session, inbound, "Failed to fetch task").await
}

pub async fn update_task(
    Extension(gateway): Extension<Arc<Gateway>>,
    Extension(session): Extension<SessionContext>,
    inbound: Inbound,
) -> Response {
    forward(&gateway, &session, inbound, "Failed to update task").await
}

pub async fn delete_task(
    Extension(gateway): Extension<Arc<Gateway>>,
    Extension(session): Extension<SessionContext>,
    inbound: Inbound,
) -> Response {
    forward(&gateway, &session, inbound, "Failed to delete task").await
}

pub async fn list_users(
    Extension(gateway): Extension<Arc<Gateway>>,
    Extension(session): Extension<SessionContext>,
    inbound: Inbound,
) -> Response {
    forward(&gateway, &session, inbound, "Failed to fetch users").await
}

/// Catch-all: any method, any backend path.
pub async fn forward_any(
    Extension(gateway): Extension<Arc<Gateway>>,
    Extension(session): Extension<SessionContext>,
    inbound: Inbound,
) -> Response {
    forward(&gateway, &session, inbound, "Request failed").await
}
