//! Client-side session lifecycle: state, cached user, token refresh and the
//! periodic refresh timer.
//!
//! Refresh is single-flight. A caller that arrives while a refresh is running
//! waits for it and gets its outcome instead of issuing another backend call.
//! Signing out bumps an epoch; a refresh that started before it never puts
//! the session back into `Authenticated`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use taskgate_core::{CurrentUser, Payload};

use crate::error::{ApiError, ApiResult};

pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Refreshing,
}

pub struct SessionManager {
    http: reqwest::Client,
    origin: String,
    interval: Duration,
    state: RwLock<SessionState>,
    user: RwLock<Option<CurrentUser>>,
    /// Bumped after every completed refresh attempt.
    generation: AtomicU64,
    /// Bumped on every sign-out.
    epoch: AtomicU64,
    /// Held for the duration of a refresh or logout; stores the last outcome
    /// for joiners.
    flight: tokio::sync::Mutex<Option<ApiResult<()>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Puts the state back if a refresh is abandoned mid-flight.
struct RefreshingGuard<'a> {
    state: &'a RwLock<SessionState>,
    previous: SessionState,
    armed: bool,
}

impl<'a> RefreshingGuard<'a> {
    fn enter(state: &'a RwLock<SessionState>) -> Self {
        let mut current = state.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *current, SessionState::Refreshing);
        Self {
            state,
            previous,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut current = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // A sign-out that happened meanwhile wins.
        if *current == SessionState::Refreshing {
            *current = self.previous;
        }
    }
}

impl SessionManager {
    pub fn new(http: reqwest::Client, origin: impl Into<String>, interval: Duration) -> Self {
        Self {
            http,
            origin: origin.into(),
            interval,
            state: RwLock::new(SessionState::Unauthenticated),
            user: RwLock::new(None),
            generation: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
            flight: tokio::sync::Mutex::new(None),
            timer: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record a signed-in user.
    pub fn sign_in(&self, user: CurrentUser) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
        self.set_state(SessionState::Authenticated);
    }

    /// Drop the cached user and stop the timer, whatever the current state.
    pub fn sign_out(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.set_state(SessionState::Unauthenticated);
        self.stop_auto_refresh();
    }

    /// End the session locally, then ask the gateway to clear the cookie.
    ///
    /// Waits for any refresh in flight so the gateway's clearing `Set-Cookie`
    /// is the last one the cookie jar sees. Local state is cleared whatever
    /// the gateway answers.
    pub async fn logout(&self) -> ApiResult<()> {
        self.sign_out();

        let mut last = self.flight.lock().await;
        let result = self.post(LOGOUT_PATH).await;
        self.sign_out();

        *last = Some(Err(ApiError::NotAuthenticated));
        self.generation.fetch_add(1, Ordering::AcqRel);
        result
    }

    /// Ask the gateway to rotate the session cookie.
    ///
    /// On failure the session is ended: cached user dropped, timer stopped,
    /// state back to `Unauthenticated`. A refresh overtaken by a sign-out
    /// reports `NotAuthenticated`.
    pub async fn refresh(&self) -> ApiResult<()> {
        let seen = self.generation.load(Ordering::Acquire);
        let mut last = self.flight.lock().await;
        if self.generation.load(Ordering::Acquire) != seen {
            if let Some(outcome) = last.as_ref() {
                tracing::debug!("joined in-flight token refresh");
                return outcome.clone();
            }
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        let guard = RefreshingGuard::enter(&self.state);
        let result = self.post(REFRESH_PATH).await;
        guard.disarm();

        let outcome = if self.epoch.load(Ordering::Acquire) != epoch {
            tracing::info!("session ended during token refresh; discarding result");
            Err(ApiError::NotAuthenticated)
        } else {
            match result {
                Ok(()) => {
                    tracing::info!("token refreshed");
                    let next = if self.current_user().is_some() {
                        SessionState::Authenticated
                    } else {
                        SessionState::Unauthenticated
                    };
                    self.set_state(next);
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "token refresh failed; signing out");
                    self.sign_out();
                    Err(e)
                }
            }
        };

        *last = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn post(&self, path: &str) -> ApiResult<()> {
        let url = format!("{}{}", self.origin, path);
        let response = self.http.post(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, path, "session request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status, Payload::parse(&text).into_value()))
    }

    /// Start the periodic refresh. A no-op while a timer is already running.
    pub fn start_auto_refresh(self: &Arc<Self>) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let manager: Weak<Self> = Arc::downgrade(self);
        let period = self.interval;
        *timer = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticks.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                if manager.refresh().await.is_err() {
                    break;
                }
            }
            tracing::debug!("auto refresh stopped");
        }));
        tracing::debug!(interval_secs = period.as_secs(), "auto refresh started");
    }

    /// Stop the periodic refresh, if any.
    pub fn stop_auto_refresh(&self) {
        if let Some(handle) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    pub fn auto_refresh_running(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop_auto_refresh();
    }
}
