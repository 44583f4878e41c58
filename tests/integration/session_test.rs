//! Session integration tests
//!
//! Bearer injection, refresh-and-retry, refresh coalescing and timeouts,
//! login/register and logout against a mock API.

use crate::common::{token_json, user_json, TestApi};
use aidex::client::messages::SESSION_EXPIRED;
use aidex::client::resources::{auth, user};
use aidex::client::{ApiError, ApiRequest, AppView, NotificationLevel, NotificationSource, RefreshState};
use aidex::shared::validation::LoginForm;
use assert_matches::assert_matches;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(serde_json::json!({ "message": "Unauthorized" }))
}

#[tokio::test]
async fn test_token_is_attached_to_requests() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Ash", "ash@example.com")))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));

    let me = user::fetch_current_user(&session).await.unwrap();
    assert_eq!(me.name, "Ash");
}

#[tokio::test]
async fn test_no_header_without_token() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/monsters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(crate::common::monsters_page_json(1, 10, 0)))
        .mount(&api.server)
        .await;

    let session = api.session();
    session.send(ApiRequest::get("/monsters")).await.unwrap();

    let requests = api.requests_to("/monsters").await;
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_refresh_then_retry_with_new_token() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("T2")))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Ash", "ash@example.com")))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));

    let me = user::fetch_current_user(&session).await.unwrap();
    assert_eq!(me.email, "ash@example.com");
    assert_eq!(session.token().as_deref(), Some("T2"));
    assert_eq!(session.refresh_state(), RefreshState::Normal);
}

#[tokio::test]
async fn test_retried_request_is_not_retried_again() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&api.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("T2")))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));

    let result = user::fetch_current_user(&session).await;
    assert_matches!(result, Err(ApiError::Unauthorized { .. }));
}

#[tokio::test]
async fn test_failed_refresh_clears_token() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));
    let mut changes = session.subscribe();

    let result = user::fetch_current_user(&session).await;
    assert_matches!(result, Err(ApiError::Unauthorized { .. }));
    assert!(session.token().is_none());
    assert!(changes.has_changed().unwrap());
}

#[tokio::test]
async fn test_failed_refresh_forgets_previous_user() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Alice", "alice@example.com")))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/monsters/me"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("B")))
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Bob", "bob@example.com")))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    let cache = api.cache(&session);
    session.set_token(Some("A".to_string()));
    let alice = user::current_user(&session, &cache).await.unwrap().unwrap();
    assert_eq!(alice.name, "Alice");

    let result = session.send(ApiRequest::get("/monsters/me")).await;
    assert_matches!(result, Err(ApiError::Unauthorized { .. }));
    assert!(!session.is_authenticated());

    let notes = session.notifier().drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].source, NotificationSource::Session);
    assert_eq!(notes[0].message, SESSION_EXPIRED);

    let form = LoginForm {
        email: "bob@example.com".to_string(),
        password: "squirtle123".to_string(),
    };
    auth::login(&session, &form).await.unwrap();

    let bob = user::current_user(&session, &cache).await.unwrap().unwrap();
    assert_eq!(bob.name, "Bob");
}

#[tokio::test]
async fn test_rotated_token_is_replayed_without_second_refresh() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(unauthorized().set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Ash", "ash@example.com")))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/monsters/me"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/monsters/me"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(crate::common::monsters_page_json(1, 10, 0)))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("T2")))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));

    // The /me 401 arrives after /monsters/me has already rotated the token
    let (me, mine) = tokio::join!(
        user::fetch_current_user(&session),
        session.send(ApiRequest::get("/monsters/me")),
    );
    assert_eq!(me.unwrap().name, "Ash");
    assert!(mine.is_ok());
    assert_eq!(session.token().as_deref(), Some("T2"));
    assert_eq!(api.requests_to("/token/refresh").await.len(), 1);
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(unauthorized())
        .mount(&api.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_json("T2"))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Ash", "ash@example.com")))
        .expect(3)
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));

    let (a, b, c) = tokio::join!(
        user::fetch_current_user(&session),
        user::fetch_current_user(&session),
        user::fetch_current_user(&session),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(session.token().as_deref(), Some("T2"));
}

#[tokio::test]
async fn test_refresh_state_while_refreshing() {
    let api = TestApi::start().await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_json("T2"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&api.server)
        .await;

    let session = api.session();
    let refreshing = session.clone();
    let handle = tokio::spawn(async move { refreshing.refresh().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.refresh_state(), RefreshState::Refreshing);

    assert_eq!(handle.await.unwrap().unwrap(), "T2");
    assert_eq!(session.refresh_state(), RefreshState::Normal);
}

#[tokio::test]
async fn test_refresh_timeout_is_a_failure() {
    let api = TestApi::start_with(|b| b.refresh_timeout(Duration::from_millis(100))).await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_json("T2"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));

    let result = user::fetch_current_user(&session).await;
    assert_matches!(result, Err(ApiError::Timeout));
    assert!(session.token().is_none());
}

#[tokio::test]
async fn test_initialize_restores_session() {
    let api = TestApi::start().await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("T1")))
        .mount(&api.server)
        .await;

    let session = api.session();
    assert!(session.initialize().await);
    assert_eq!(session.token().as_deref(), Some("T1"));

    let requests = api.requests_to("/token/refresh").await;
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_initialize_failure_is_silent() {
    let api = TestApi::start().await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(unauthorized())
        .mount(&api.server)
        .await;

    let session = api.session();
    assert!(!session.initialize().await);
    assert!(session.token().is_none());
    assert_eq!(session.notifier().count(), 0);
}

#[tokio::test]
async fn test_invalid_credentials_do_not_trigger_refresh() {
    let api = TestApi::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({ "message": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("T2")))
        .expect(0)
        .mount(&api.server)
        .await;

    let session = api.session();
    let form = LoginForm {
        email: "ash@example.com".to_string(),
        password: "wrong-password".to_string(),
    };

    let result = auth::login(&session, &form).await;
    assert_matches!(result, Err(ApiError::Unauthorized { .. }));

    let notes = session.notifier().drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert_eq!(notes[0].message, "Invalid e-mail or password");
}

#[tokio::test]
async fn test_login_stores_token() {
    let api = TestApi::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("T1")))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    let form = LoginForm {
        email: "ash@example.com".to_string(),
        password: "pikachu123".to_string(),
    };

    assert_eq!(auth::login(&session, &form).await.unwrap(), AppView::Home);
    assert_eq!(session.token().as_deref(), Some("T1"));

    let body: serde_json::Value = api.requests_to("/auth").await[0].body_json().unwrap();
    assert_eq!(body["email"], "ash@example.com");
}

#[tokio::test]
async fn test_invalid_login_form_sends_nothing() {
    let api = TestApi::start().await;
    let session = api.session();
    let form = LoginForm {
        email: "not-an-email".to_string(),
        password: "short".to_string(),
    };

    let result = auth::login(&session, &form).await;
    assert_matches!(result, Err(ApiError::Validation { ref errors }) if errors.len() == 2);
    assert!(api.requests_to("/auth").await.is_empty());
}

#[tokio::test]
async fn test_logout_success() {
    let api = TestApi::start().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "message": "ok" })))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));

    assert_eq!(session.logout().await.unwrap(), AppView::Home);
    assert!(session.token().is_none());
    let notes = session.notifier().drain();
    assert_eq!(notes[0].level, NotificationLevel::Success);
}

#[tokio::test]
async fn test_logout_failure_keeps_token() {
    let api = TestApi::start().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));

    let result = session.logout().await;
    assert_matches!(result, Err(ApiError::Server { status: 500, .. }));
    assert_eq!(session.token().as_deref(), Some("T1"));
    let notes = session.notifier().drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
}
