//! HTTP client for the gateway with one-shot recovery from an expired session.

use std::sync::Arc;

use reqwest::{StatusCode, header};
use serde_json::Value;

use taskgate_core::Payload;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::request::{ApiRequest, RequestBody};
use crate::session::SessionManager;

/// Gateway client. Cheap to clone; clones share the cookie jar and session.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    origin: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;
        let session = Arc::new(SessionManager::new(
            http.clone(),
            config.origin.clone(),
            config.refresh_interval,
        ));

        Ok(Self {
            http,
            origin: config.origin.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Send `req` and return the decoded body of a successful response.
    ///
    /// A 401 on a non-auth path triggers one session refresh; if it succeeds
    /// the request is sent exactly once more. Whatever the last attempt
    /// returned is what the caller sees.
    pub async fn send(&self, req: &ApiRequest) -> ApiResult<Value> {
        let (status, data) = self.attempt(req).await?;

        if status == StatusCode::UNAUTHORIZED && req.retries_on_unauthorized() {
            tracing::debug!(path = %req.path, "unauthorized; refreshing session before retry");
            if self.session.refresh().await.is_ok() {
                let (status, data) = self.attempt(req).await?;
                return finish(status, data);
            }
        }

        finish(status, data)
    }

    /// Build the outbound request. JSON bodies get a JSON content type;
    /// multipart bodies carry their own boundary and nothing is forced.
    fn build(&self, req: &ApiRequest) -> ApiResult<reqwest::RequestBuilder> {
        let url = format!("{}{}", self.origin, req.target());
        let mut builder = self
            .http
            .request(req.method.clone(), &url)
            .header(header::ACCEPT, "application/json");
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        Ok(match &req.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(value.to_string()),
            RequestBody::Multipart(body) => builder.multipart(body.to_form()?),
        })
    }

    async fn attempt(&self, req: &ApiRequest) -> ApiResult<(StatusCode, Value)> {
        let builder = self.build(req)?;
        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, path = %req.path, "request to gateway failed");
            ApiError::from(e)
        })?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, Payload::parse(&text).into_value()))
    }
}

fn finish(status: StatusCode, data: Value) -> ApiResult<Value> {
    if status.is_success() {
        Ok(data)
    } else {
        Err(ApiError::from_response(status, data))
    }
}
