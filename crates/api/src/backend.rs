//! Outbound HTTP client for the backend API.

use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode, header};
use serde_json::Value;

use taskgate_auth::{SessionToken, authorization_value};
use taskgate_core::Payload;

use crate::app::errors::GatewayError;

/// Body forwarded to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardBody {
    None,
    /// Re-serialised JSON.
    Json(Value),
    /// Anything else, passed through as text.
    Text(String),
}

/// One backend call.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub method: Method,
    /// Path relative to the base URL, starting with `/`.
    pub path: String,
    /// Raw (already encoded) query string, without `?`.
    pub query: Option<String>,
    pub token: Option<SessionToken>,
    pub body: ForwardBody,
}

impl BackendRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            token: None,
            body: ForwardBody::None,
        }
    }

    pub fn bearer(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    pub fn body(mut self, body: ForwardBody) -> Self {
        self.body = body;
        self
    }
}

/// Backend answer: status plus leniently decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub status: StatusCode,
    pub payload: Payload,
}

impl BackendReply {
    /// The payload of a 2xx reply, or a [`GatewayError::Backend`] carrying the
    /// backend's status and message (`fallback` when it sent none).
    pub fn into_success(self, fallback: &str) -> Result<Payload, GatewayError> {
        if self.status.is_success() {
            return Ok(self.payload);
        }
        Err(GatewayError::Backend {
            status: self.status,
            message: self.payload.message().unwrap_or(fallback).to_string(),
            details: self.payload.error_details().cloned(),
        })
    }
}

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Transport)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base + path + ?query`.
    pub fn url(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", self.base_url, path, q),
            _ => format!("{}{}", self.base_url, path),
        }
    }

    pub async fn send(&self, req: BackendRequest) -> Result<BackendReply, GatewayError> {
        let url = self.url(&req.path, req.query.as_deref());
        let started = Instant::now();

        let mut builder = self
            .http
            .request(req.method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = &req.token {
            builder = builder.header(header::AUTHORIZATION, authorization_value(token));
        }
        builder = match req.body {
            ForwardBody::None => builder,
            ForwardBody::Json(value) => builder.body(value.to_string()),
            ForwardBody::Text(text) => builder.body(text),
        };

        let response = builder.send().await.map_err(GatewayError::Transport)?;
        let status = response.status();
        let text = response.text().await.map_err(GatewayError::Transport)?;

        tracing::debug!(
            method = %req.method,
            path = %req.path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "backend call finished"
        );

        Ok(BackendReply {
            status,
            payload: Payload::parse(&text),
        })
    }
}
