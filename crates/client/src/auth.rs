//! Current-user identity for the UI layer.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;

use taskgate_core::CurrentUser;

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::request::ApiRequest;
use crate::session::SessionState;

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

pub struct AuthContext {
    client: ApiClient,
    loading: AtomicBool,
}

impl AuthContext {
    /// Starts in the loading state until [`init`](Self::init) or a sign-in
    /// completes.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            loading: AtomicBool::new(true),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.client.session().current_user()
    }

    pub fn state(&self) -> SessionState {
        self.client.session().state()
    }

    /// The signed-in user, or `NotAuthenticated` for pages that need one.
    pub fn require_user(&self) -> ApiResult<CurrentUser> {
        self.current_user().ok_or(ApiError::NotAuthenticated)
    }

    /// Resolve the session from the cookie jar via `/api/auth/me`.
    pub async fn init(&self) -> Option<CurrentUser> {
        let result = self
            .client
            .send(&ApiRequest::get("/api/auth/me"))
            .await
            .and_then(|value| decode_user(&value));

        let session = self.client.session();
        let user = match result {
            Ok(user) => {
                session.sign_in(user.clone());
                session.start_auto_refresh();
                Some(user)
            }
            Err(e) => {
                tracing::debug!(error = %e, "no active session");
                session.sign_out();
                None
            }
        };
        self.loading.store(false, Ordering::Release);
        user
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<CurrentUser> {
        let req = ApiRequest::post("/api/auth/login").json(&LoginBody { email, password })?;
        self.establish(req).await
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> ApiResult<CurrentUser> {
        let req = ApiRequest::post("/api/auth/signup").json(&SignupBody {
            name,
            email,
            password,
        })?;
        self.establish(req).await
    }

    /// Sign out locally whatever the gateway says; its error, if any, is
    /// still returned. A refresh still in flight cannot revive the session.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self.client.session().logout().await;
        tracing::info!("signed out");
        result
    }

    /// Explicit refresh. A failure leaves the context signed out.
    pub async fn refresh(&self) -> ApiResult<()> {
        self.client.session().refresh().await
    }

    /// Login and signup both answer `{ user }`; no profile round trip.
    async fn establish(&self, req: ApiRequest) -> ApiResult<CurrentUser> {
        let value = self.client.send(&req).await?;
        let user = decode_user(value.get("user").unwrap_or(&Value::Null))?;

        let session = self.client.session();
        session.sign_in(user.clone());
        session.start_auto_refresh();
        self.loading.store(false, Ordering::Release);
        tracing::info!(user_id = %user.id, "signed in");
        Ok(user)
    }
}

fn decode_user(value: &Value) -> ApiResult<CurrentUser> {
    CurrentUser::from_backend(value).map_err(|e| ApiError::Decode(e.to_string()))
}
