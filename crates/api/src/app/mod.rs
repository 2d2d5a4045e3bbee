//! Gateway application wiring (Axum router + shared state).
//!
//! - `routes/`: HTTP handlers (auth endpoints, proxied backend resources)
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use taskgate_auth::CookiePolicy;

use crate::backend::BackendClient;
use crate::config::GatewayConfig;
use crate::middleware;

pub mod errors;
pub mod routes;

use errors::GatewayError;

/// State shared by all handlers.
pub struct Gateway {
    pub backend: BackendClient,
    pub cookies: Arc<CookiePolicy>,
}

impl Gateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            backend: BackendClient::new(config.api_base_url.clone(), config.backend_timeout)?,
            cookies: Arc::new(CookiePolicy::new(config.environment.is_production())),
        })
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &GatewayConfig) -> Result<Router, GatewayError> {
    let gateway = Arc::new(Gateway::new(config)?);
    let session_state = middleware::SessionState {
        cookies: gateway.cookies.clone(),
    };

    // Session-bound routes: cookie required, checked before any backend call.
    let protected = Router::new()
        .merge(routes::auth::session_router())
        .nest("/api/proxy", routes::proxy::router())
        .route_layer(axum::middleware::from_fn_with_state(
            session_state,
            middleware::session_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::auth::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_context))
                .layer(Extension(gateway)),
        ))
}
