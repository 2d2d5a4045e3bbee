//! In-process stand-in for the backend API plus a gateway launcher.
//!
//! Shared by the gateway and client black-box tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use taskgate_api::{Environment, GatewayConfig};

pub struct TestServer {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct Inner {
    valid: HashSet<String>,
    rotations: HashMap<String, String>,
    calls: Vec<RecordedCall>,
    refresh_delay: Option<Duration>,
}

/// Backend behaviour knobs and the log of calls it received.
#[derive(Default)]
pub struct BackendState {
    inner: Mutex<Inner>,
}

impl BackendState {
    /// Treat `token` as a live access token.
    pub fn accept(&self, token: &str) {
        self.inner.lock().unwrap().valid.insert(token.to_string());
    }

    /// Make `token` answer 401 from now on.
    pub fn expire(&self, token: &str) {
        self.inner.lock().unwrap().valid.remove(token);
    }

    /// Allow `/auth/refresh_token` to exchange `old` for `new`.
    pub fn rotate(&self, old: &str, new: &str) {
        self.inner
            .lock()
            .unwrap()
            .rotations
            .insert(old.to_string(), new.to_string());
    }

    pub fn delay_refresh(&self, delay: Duration) {
        self.inner.lock().unwrap().refresh_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }

    fn is_valid(&self, bearer: Option<&str>) -> bool {
        bearer
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|t| self.inner.lock().unwrap().valid.contains(t))
    }
}

pub struct FakeBackend {
    pub server: TestServer,
    pub state: Arc<BackendState>,
}

impl FakeBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let server = TestServer::spawn(app).await;
        Self { server, state }
    }

    pub fn base_url(&self) -> &str {
        &self.server.base_url
    }
}

/// Spawn the gateway (development cookie policy) in front of `backend_url`.
pub async fn spawn_gateway(backend_url: &str) -> TestServer {
    let config = GatewayConfig::new(backend_url)
        .with_environment(Environment::Development)
        .with_backend_timeout(Duration::from_secs(5));
    let app = taskgate_api::build_app(&config).expect("failed to build gateway");
    TestServer::spawn(app).await
}

pub fn task_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "status": "TODO",
        "priority": "MEDIUM",
        "due_date": "2024-12-31T23:59:59",
        "assignee_id": null,
        "creator_id": 1,
        "created_at": "2024-12-01T00:00:00",
        "updated_at": "2024-12-01T00:00:00"
    })
}

fn user_json(id: i64, name: &str, email: &str, role: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "role": role,
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-01-02T00:00:00"
    })
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn unauthorized() -> Response {
    reply(
        StatusCode::UNAUTHORIZED,
        json!({"success": false, "message": "Token has expired", "error_details": null}),
    )
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body_text = String::from_utf8_lossy(&body).into_owned();
    let path = uri.path().to_string();

    state.inner.lock().unwrap().calls.push(RecordedCall {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: authorization.clone(),
        content_type,
        body: body_text.clone(),
    });

    let json_body: Value = serde_json::from_str(&body_text).unwrap_or(Value::Null);

    match (method.as_str(), path.as_str()) {
        ("POST", "/auth/login") => {
            if json_body["email"] == "a@b.com" && json_body["password"] == "x" {
                state.accept("T");
                let mut data = user_json(1, "A", "a@b.com", "ADMIN");
                data["access_token"] = json!("T");
                reply(StatusCode::OK, json!({"success": true, "message": "ok", "data": data}))
            } else {
                reply(
                    StatusCode::FORBIDDEN,
                    json!({"success": false, "message": "Invalid Email or Password", "error_details": null}),
                )
            }
        }
        ("POST", "/auth/signup") => {
            if json_body["email"].as_str().is_none_or(|e| !e.contains('@')) {
                return reply(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({
                        "success": false,
                        "message": "Validation failed",
                        "error_details": {"validationErrors": [{"field": "email", "error": "invalid email"}]}
                    }),
                );
            }
            state.accept("S");
            let mut data = user_json(2, json_body["name"].as_str().unwrap_or(""), json_body["email"].as_str().unwrap_or(""), "USER");
            data["access_token"] = json!("S");
            reply(StatusCode::OK, json!({"success": true, "data": data}))
        }
        ("GET", "/auth/profile") => {
            if !state.is_valid(authorization.as_deref()) {
                return unauthorized();
            }
            reply(
                StatusCode::OK,
                json!({"success": true, "data": user_json(1, "A", "a@b.com", "ADMIN")}),
            )
        }
        ("POST", "/auth/refresh_token") => {
            let delay = state.inner.lock().unwrap().refresh_delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let old = authorization
                .as_deref()
                .and_then(|h| h.strip_prefix("Bearer "))
                .unwrap_or_default()
                .to_string();
            let new = state.inner.lock().unwrap().rotations.remove(&old);
            match new {
                Some(new) => {
                    state.expire(&old);
                    state.accept(&new);
                    reply(
                        StatusCode::OK,
                        json!({"success": true, "data": {"access_token": new, "expires_at": "2030-01-01T00:00:00"}}),
                    )
                }
                None => reply(
                    StatusCode::UNAUTHORIZED,
                    json!({"success": false, "message": "Invalid refresh token"}),
                ),
            }
        }
        (_, "/plain") => (StatusCode::OK, "pong").into_response(),
        _ if !state.is_valid(authorization.as_deref()) => unauthorized(),
        ("GET", "/tasks") => reply(
            StatusCode::OK,
            json!({
                "success": true,
                "message": "Request was successful",
                "data": [task_json(1, "First"), task_json(2, "Second")],
                "metadata": {"limit": 2, "has_next": true, "next_cursor": "c2"}
            }),
        ),
        ("POST", "/tasks") => {
            if json_body["title"].as_str().is_none_or(str::is_empty) {
                return reply(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({
                        "success": false,
                        "message": "Validation failed",
                        "error_details": {"validationErrors": [{"field": "title", "error": "title is required"}]}
                    }),
                );
            }
            let mut task = task_json(3, json_body["title"].as_str().unwrap_or(""));
            task["status"] = json_body["status"].clone();
            task["priority"] = json_body["priority"].clone();
            reply(StatusCode::CREATED, json!({"success": true, "data": task}))
        }
        ("GET", "/tasks/404") => reply(
            StatusCode::NOT_FOUND,
            json!({"success": false, "message": "Task not found"}),
        ),
        ("GET", "/tasks/500") => (StatusCode::INTERNAL_SERVER_ERROR, "kaboom").into_response(),
        ("GET", p) if p.starts_with("/tasks/") => {
            let id = p.trim_start_matches("/tasks/").parse::<i64>().unwrap_or(0);
            reply(StatusCode::OK, json!({"success": true, "data": task_json(id, "Fetched")}))
        }
        ("PATCH", p) if p.starts_with("/tasks/") => {
            let id = p.trim_start_matches("/tasks/").parse::<i64>().unwrap_or(0);
            let mut task = task_json(id, "Fetched");
            if let Some(obj) = json_body.as_object() {
                for (k, v) in obj {
                    task[k.as_str()] = v.clone();
                }
            }
            reply(StatusCode::OK, json!({"success": true, "data": task}))
        }
        ("DELETE", p) if p.starts_with("/tasks/") => reply(
            StatusCode::OK,
            json!({"success": true, "message": "Task deleted", "data": null}),
        ),
        ("GET", "/users/list") => reply(
            StatusCode::OK,
            json!({"success": true, "data": [user_json(1, "A", "a@b.com", "ADMIN"), user_json(2, "B", "b@b.com", "USER")]}),
        ),
        _ => reply(
            StatusCode::OK,
            json!({
                "echo": {
                    "method": method.as_str(),
                    "path": path,
                    "query": uri.query(),
                    "body": body_text,
                }
            }),
        ),
    }
}
