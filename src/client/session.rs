//! # Session Manager
//!
//! Owns the access token and wraps every authenticated call.
//!
//! The token lives in a `watch` channel: writes replace it atomically, reads
//! are synchronous, and views can subscribe to authentication changes. The
//! refresh token itself is an HTTP-only cookie held by the transport's cookie
//! store and never seen here.
//!
//! ## Refresh-and-retry
//!
//! [`SessionManager::send`] attaches the bearer token, and when the server
//! answers 401 it refreshes once and replays the request with the new token.
//! Concurrent 401s join a single in-flight refresh instead of racing, and a
//! request that was sent with a token that has since been rotated is replayed
//! with the current token without refreshing again.
//!
//! ## Session end
//!
//! Hooks registered with [`SessionManager::on_session_end`] run whenever an
//! authenticated session ends, whether by logout or by a failed refresh, and
//! before a new sign-in is stored. The query cache uses this to drop the
//! previous user's reads.

use crate::client::error::ApiError;
use crate::client::http::{ApiRequest, ApiResponse, HttpClient};
use crate::client::messages::{user_message, ErrorContext, SESSION_EXPIRED};
use crate::client::notify::{NotificationSource, Notifier};
use crate::client::types::AppView;
use crate::shared::user::TokenResponse;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Mutex};

pub const REFRESH_PATH: &str = "/token/refresh";
pub const LOGOUT_PATH: &str = "/logout";

type RefreshFuture = Shared<BoxFuture<'static, Result<String, ApiError>>>;
type SessionEndHook = Box<dyn Fn() + Send + Sync>;

/// Whether a token refresh is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Normal,
    Refreshing,
}

/// Cloneable handle to the client session. Clones share the same token.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: HttpClient,
    notifier: Notifier,
    token: watch::Sender<Option<String>>,
    refresh: Mutex<Option<RefreshFuture>>,
    refreshing: AtomicBool,
    refresh_timeout: Duration,
    on_end: std::sync::Mutex<Vec<SessionEndHook>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.is_authenticated())
            .field("refresh_state", &self.refresh_state())
            .finish()
    }
}

impl SessionManager {
    pub fn new(http: HttpClient, notifier: Notifier) -> Self {
        let refresh_timeout = http.config().refresh_timeout();
        let (token, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionInner {
                http,
                notifier,
                token,
                refresh: Mutex::new(None),
                refreshing: AtomicBool::new(false),
                refresh_timeout,
                on_end: std::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Current access token
    pub fn token(&self) -> Option<String> {
        self.inner.token.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.token.borrow().is_some()
    }

    /// Replace the token; `None` ends the session
    pub fn set_token(&self, token: Option<String>) {
        let authenticated = token.is_some();
        let previous = self.inner.token.send_replace(token);
        match (previous.is_some(), authenticated) {
            (false, true) => tracing::info!("Session authenticated"),
            (true, false) => {
                tracing::info!("Session cleared");
                self.run_session_end_hooks();
            }
            _ => tracing::debug!("Access token replaced"),
        }
    }

    /// Store the token of a fresh sign-in. Anything tied to a previous
    /// session is dropped first.
    pub fn sign_in(&self, token: String) {
        self.run_session_end_hooks();
        self.set_token(Some(token));
    }

    /// Run `hook` each time a session ends or a new sign-in replaces it
    pub fn on_session_end(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner
            .on_end
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(hook));
    }

    fn run_session_end_hooks(&self) {
        let hooks = self.inner.on_end.lock().unwrap_or_else(PoisonError::into_inner);
        for hook in hooks.iter() {
            hook();
        }
    }

    /// Receiver notified on every token change
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.inner.token.subscribe()
    }

    pub fn refresh_state(&self) -> RefreshState {
        if self.inner.refreshing.load(Ordering::SeqCst) {
            RefreshState::Refreshing
        } else {
            RefreshState::Normal
        }
    }

    /// Restore a session from the refresh cookie. Failure is silent.
    pub async fn initialize(&self) -> bool {
        match self.refresh().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("No session to restore: {}", e);
                false
            }
        }
    }

    /// Attach the current token unless the request carries its own header
    pub fn authorize(&self, request: ApiRequest) -> Result<ApiRequest, ApiError> {
        attach_bearer(request, self.token().as_deref())
    }

    /// Send a request through the session, refreshing once on 401.
    ///
    /// Non-success statuses come back as errors.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let sent_token = if request.has_authorization() {
            None
        } else {
            self.token()
        };
        let outgoing = attach_bearer(request.clone(), sent_token.as_deref())?;
        let response = self.inner.http.execute(&outgoing).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || request.is_retried()
            || !request.refreshes_on_unauthorized()
        {
            return response.error_for_status();
        }

        let mut replay = request;
        replay.mark_retried();

        let token = match self.token() {
            Some(current) if sent_token.as_deref() != Some(current.as_str()) => {
                tracing::debug!("Token rotated while {} was in flight", replay.path());
                current
            }
            _ => {
                tracing::debug!("{} returned 401, refreshing token", replay.path());
                self.refresh().await?
            }
        };

        let replay = replay.with_bearer(&token)?;
        self.inner.http.execute(&replay).await?.error_for_status()
    }

    /// Refresh the access token, joining a refresh already in flight
    pub async fn refresh(&self) -> Result<String, ApiError> {
        let shared = {
            let mut slot = self.inner.refresh.lock().await;
            match slot.as_ref() {
                Some(in_flight) => {
                    tracing::debug!("Joining in-flight token refresh");
                    in_flight.clone()
                }
                None => {
                    self.inner.refreshing.store(true, Ordering::SeqCst);
                    let handle = tokio::spawn(self.clone().run_refresh());
                    let future = async move { handle.await.unwrap_or(Err(ApiError::Cancelled)) }
                        .boxed()
                        .shared();
                    *slot = Some(future.clone());
                    future
                }
            }
        };
        shared.await
    }

    async fn run_refresh(self) -> Result<String, ApiError> {
        let attempt = async {
            let request = attach_bearer(
                ApiRequest::patch(REFRESH_PATH).without_refresh(),
                self.token().as_deref(),
            )?;
            let response = tokio::time::timeout(
                self.inner.refresh_timeout,
                self.inner.http.execute(&request),
            )
            .await
            .map_err(|_| ApiError::Timeout)??;
            let body: TokenResponse = response.error_for_status()?.json()?;
            Ok::<_, ApiError>(body.token)
        };

        let result = attempt.await;
        match &result {
            Ok(token) => {
                self.set_token(Some(token.clone()));
                tracing::info!("Access token refreshed");
            }
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                // Silent when there was no session to lose, as on startup
                if self.is_authenticated() {
                    self.inner.notifier.error(NotificationSource::Session, SESSION_EXPIRED);
                }
                self.set_token(None);
            }
        }

        let mut slot = self.inner.refresh.lock().await;
        *slot = None;
        self.inner.refreshing.store(false, Ordering::SeqCst);
        drop(slot);
        result
    }

    /// End the session on the server.
    ///
    /// On success the token is cleared and [`AppView::Home`] is returned as
    /// the navigation target. On failure the token is kept.
    pub async fn logout(&self) -> Result<AppView, ApiError> {
        match self.send(ApiRequest::post(LOGOUT_PATH)).await {
            Ok(_) => {
                self.set_token(None);
                self.inner
                    .notifier
                    .success(NotificationSource::Session, "You have been signed out");
                Ok(AppView::Home)
            }
            Err(e) => {
                tracing::error!("Logout failed: {}", e);
                self.inner
                    .notifier
                    .error(NotificationSource::Session, user_message(&e, ErrorContext::Logout));
                Err(e)
            }
        }
    }
}

fn attach_bearer(request: ApiRequest, token: Option<&str>) -> Result<ApiRequest, ApiError> {
    match token {
        Some(token) if !request.has_authorization() => request.with_bearer(token),
        _ => Ok(request),
    }
}
