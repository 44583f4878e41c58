//! Sign-in, registration and sign-out.
//!
//! Login and register answer 401/409 for bad credentials or taken e-mails, so
//! both opt out of refresh-on-401 and their errors reach the form as is.

use crate::client::error::ApiError;
use crate::client::http::ApiRequest;
use crate::client::messages::{user_message, ErrorContext};
use crate::client::notify::NotificationSource;
use crate::client::query::QueryCache;
use crate::client::session::SessionManager;
use crate::client::types::AppView;
use crate::shared::user::TokenResponse;
use crate::shared::validation::{LoginForm, RegisterForm};
use serde::Serialize;

pub const LOGIN_PATH: &str = "/auth";
pub const REGISTER_PATH: &str = "/register";

async fn authenticate<T: Serialize>(
    session: &SessionManager,
    path: &str,
    body: &T,
    context: ErrorContext,
) -> Result<AppView, ApiError> {
    let request = ApiRequest::post(path).json(body)?.without_refresh();
    let result = match session.send(request).await {
        Ok(response) => response.json::<TokenResponse>(),
        Err(e) => Err(e),
    };

    match result {
        Ok(body) => {
            session.sign_in(body.token);
            Ok(AppView::Home)
        }
        Err(e) => {
            session
                .notifier()
                .error(NotificationSource::Session, user_message(&e, context));
            Err(e)
        }
    }
}

/// `POST /auth`; stores the returned token and navigates home
pub async fn login(session: &SessionManager, form: &LoginForm) -> Result<AppView, ApiError> {
    let request = form.validate()?;
    tracing::info!("Signing in {}", request.email);
    authenticate(session, LOGIN_PATH, &request, ErrorContext::Login).await
}

/// `POST /register`; stores the returned token and navigates home
pub async fn register(session: &SessionManager, form: &RegisterForm) -> Result<AppView, ApiError> {
    let request = form.validate()?;
    tracing::info!("Registering {}", request.email);
    let view = authenticate(session, REGISTER_PATH, &request, ErrorContext::Register).await?;
    session
        .notifier()
        .success(NotificationSource::Session, "Account created");
    Ok(view)
}

/// Sign out and forget every cached read of the previous user
pub async fn logout(session: &SessionManager, cache: &QueryCache) -> Result<AppView, ApiError> {
    let view = session.logout().await?;
    cache.clear();
    Ok(view)
}
