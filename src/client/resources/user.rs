//! Current user query and the change-password mutation.

use crate::client::error::ApiError;
use crate::client::http::ApiRequest;
use crate::client::messages::{user_message, ErrorContext};
use crate::client::notify::NotificationSource;
use crate::client::query::{Mutation, QueryCache};
use crate::client::session::SessionManager;
use crate::shared::user::{ChangePasswordRequest, MessageResponse, User, UserResponse};
use crate::shared::validation::ChangePasswordForm;
use std::sync::Arc;

pub const ME_PATH: &str = "/me";
pub const CHANGE_PASSWORD_PATH: &str = "/change-password";

pub mod user_keys {
    use crate::client::query::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::new(["user"])
    }

    pub fn details() -> QueryKey {
        all().segment("details")
    }
}

/// `GET /me`
pub async fn fetch_current_user(session: &SessionManager) -> Result<User, ApiError> {
    let response: UserResponse = session.send(ApiRequest::get(ME_PATH)).await?.json()?;
    Ok(response.user)
}

/// Signed-in user; `None` without a session, and nothing is requested then
pub async fn current_user(
    session: &SessionManager,
    cache: &QueryCache,
) -> Result<Option<Arc<User>>, ApiError> {
    let fetch_session = session.clone();
    cache
        .query(
            user_keys::details(),
            move || {
                let session = fetch_session.clone();
                async move { fetch_current_user(&session).await }
            },
            cache.defaults().enabled(session.is_authenticated()),
        )
        .await
}

/// `PATCH /change-password`
pub async fn patch_password(
    session: &SessionManager,
    request: &ChangePasswordRequest,
) -> Result<MessageResponse, ApiError> {
    session
        .send(ApiRequest::patch(CHANGE_PASSWORD_PATH).json(request)?)
        .await?
        .json()
}

/// Validate and submit the change-password form. No query is invalidated.
pub async fn change_password(
    session: &SessionManager,
    cache: &QueryCache,
    form: &ChangePasswordForm,
) -> Result<MessageResponse, ApiError> {
    let request = form.validate()?;
    let success = session.notifier().clone();
    let failure = session.notifier().clone();

    cache
        .mutate(
            patch_password(session, &request),
            Mutation::new()
                .on_success(move |_: &MessageResponse| {
                    success.success(NotificationSource::Mutation, "Password changed");
                })
                .on_error(move |e| {
                    failure.error(
                        NotificationSource::Mutation,
                        user_message(e, ErrorContext::ChangePassword),
                    );
                }),
        )
        .await
}
