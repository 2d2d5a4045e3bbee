//! Description of one gateway call, replayable for the post-refresh retry.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub const PROXY_PREFIX: &str = "/api/proxy";
pub const AUTH_PREFIX: &str = "/api/auth/";

/// Route a path through the proxy unless it already targets the gateway's
/// own `/api` surface.
pub fn resolve_path(path: &str) -> String {
    if path.starts_with("/api") {
        path.to_string()
    } else {
        format!("{PROXY_PREFIX}{path}")
    }
}

/// Auth endpoints never trigger the refresh-and-retry path.
pub fn is_auth_path(path: &str) -> bool {
    path.contains(AUTH_PREFIX)
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub name: String,
    pub file_name: Option<String>,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Multipart body kept as plain data so it can be sent twice.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    texts: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.texts.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    pub fn to_form(&self) -> ApiResult<Form> {
        let mut form = Form::new();
        for (name, value) in &self.texts {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let mut part = Part::bytes(file.bytes.clone());
            if let Some(file_name) = &file.file_name {
                part = part.file_name(file_name.clone());
            }
            if let Some(mime) = &file.mime {
                part = part
                    .mime_str(mime)
                    .map_err(|e| ApiError::Transport(e.to_string()))?;
            }
            form = form.part(file.name.clone(), part);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    None,
    Json(Value),
    /// Sent as-is; the multipart boundary sets its own content type.
    Multipart(MultipartBody),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query<K: Into<String>, V: Into<String>>(
        mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }

    /// Gateway path after the proxy rewrite.
    pub fn target(&self) -> String {
        resolve_path(&self.path)
    }

    pub fn retries_on_unauthorized(&self) -> bool {
        !is_auth_path(&self.path)
    }
}
