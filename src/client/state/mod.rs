//! Application state shared across views.
//!
//! Owns the session, the query cache and the notification buffer, tracks the
//! current view, and holds the gallery's browse state (page, type filter and
//! debounced search text).

use crate::client::config::Config;
use crate::client::debounce::Debouncer;
use crate::client::error::ApiError;
use crate::client::filter::TypeFilter;
use crate::client::http::HttpClient;
use crate::client::notify::{Notification, Notifier};
use crate::client::query::{QueryCache, QueryKey, QueryOptions};
use crate::client::resources::{auth, monster_keys, monsters, user, user_keys, MonsterListParams};
use crate::client::session::SessionManager;
use crate::client::types::AppView;
use crate::shared::monster::{CreateMonsterResponse, Monster, MonsterType, MonstersResponse};
use crate::shared::user::{MessageResponse, User};
use crate::shared::validation::{ChangePasswordForm, CreateMonsterForm, LoginForm, RegisterForm};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub session: SessionManager,
    pub cache: QueryCache,
    pub notifier: Notifier,
    pub current_view: AppView,
    page: u32,
    types: TypeFilter,
    search: Debouncer<String>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let notifier = Notifier::default();
        let http = HttpClient::new(config.clone())?;
        let session = SessionManager::new(http, notifier.clone());
        let cache = QueryCache::new(
            notifier.clone(),
            QueryOptions::default()
                .stale_time(config.stale_time())
                .retry(config.query_retry()),
        );
        cache.bind_session(&session);
        let search = Debouncer::new(String::new(), config.search_debounce());

        Ok(Self {
            config,
            session,
            cache,
            notifier,
            current_view: AppView::Home,
            page: 1,
            types: TypeFilter::new(),
            search,
        })
    }

    /// Restore a previous session, if the refresh cookie is still valid
    pub async fn start(&mut self) -> bool {
        let restored = self.session.initialize().await;
        tracing::info!(
            "Session {}",
            if restored { "restored" } else { "not restored" }
        );
        restored
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Move to `view`, applying the route guards. In-flight reads of the view
    /// being left are cancelled.
    pub fn navigate(&mut self, view: AppView) -> &AppView {
        let target = view.guard(self.is_authenticated());
        if target != self.current_view {
            if let Some(prefix) = view_queries(&self.current_view) {
                self.cache.cancel(&prefix);
            }
            tracing::debug!("Navigating to {}", target.path());
            self.current_view = target;
        }
        &self.current_view
    }

    pub fn navigate_to_path(&mut self, path: &str) -> &AppView {
        self.navigate(AppView::from_path(path))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn types(&self) -> &TypeFilter {
        &self.types
    }

    /// Toggle a type in the gallery filter; changing the filter returns to
    /// the first page
    pub fn toggle_type(&mut self, monster_type: MonsterType) -> bool {
        let changed = self.types.toggle(monster_type);
        if changed {
            self.page = 1;
        }
        changed
    }

    pub fn clear_filters(&mut self) {
        self.types.clear();
        self.search.input(String::new());
        self.page = 1;
    }

    /// Raw search text as typed
    pub fn search_text(&self) -> &str {
        self.search.current()
    }

    pub fn input_search(&mut self, text: impl Into<String>) {
        self.search.input(text.into());
    }

    /// Apply the search text once typing has paused. Returns whether the
    /// gallery query changed.
    pub fn poll_search(&mut self) -> bool {
        let changed = self.search.poll().is_some();
        if changed {
            self.page = 1;
        }
        changed
    }

    /// Wait for the pending search text to settle
    pub async fn settle_search(&mut self) -> bool {
        let changed = self.search.settle().await.is_some();
        if changed {
            self.page = 1;
        }
        changed
    }

    /// Parameters of the gallery query as currently settled
    pub fn gallery_params(&self) -> MonsterListParams {
        MonsterListParams::new(self.config.page_size())
            .page(self.page)
            .types(self.types.clone())
            .search(self.search.value().clone())
    }

    pub async fn load_gallery(&self) -> Result<Arc<MonstersResponse>, ApiError> {
        monsters::monsters(&self.session, &self.cache, &self.gallery_params()).await
    }

    pub async fn load_my_monsters(&self) -> Result<Arc<MonstersResponse>, ApiError> {
        monsters::my_monsters(&self.session, &self.cache, &self.gallery_params()).await
    }

    pub async fn load_monster(&self, id: &str) -> Result<Arc<Monster>, ApiError> {
        monsters::monster(&self.session, &self.cache, id).await
    }

    pub async fn current_user(&self) -> Result<Option<Arc<User>>, ApiError> {
        user::current_user(&self.session, &self.cache).await
    }

    pub async fn login(&mut self, form: &LoginForm) -> Result<(), ApiError> {
        let view = auth::login(&self.session, form).await?;
        self.navigate(view);
        Ok(())
    }

    pub async fn register(&mut self, form: &RegisterForm) -> Result<(), ApiError> {
        let view = auth::register(&self.session, form).await?;
        self.navigate(view);
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<(), ApiError> {
        let view = auth::logout(&self.session, &self.cache).await?;
        self.navigate(view);
        Ok(())
    }

    /// Create a monster and open its page
    pub async fn create_monster(&mut self, form: &CreateMonsterForm) -> Result<CreateMonsterResponse, ApiError> {
        let created = monsters::create_monster(&self.session, &self.cache, form).await?;
        self.navigate(AppView::MonsterDetail(created.id.clone()));
        Ok(created)
    }

    pub async fn change_password(&mut self, form: &ChangePasswordForm) -> Result<MessageResponse, ApiError> {
        let message = user::change_password(&self.session, &self.cache, form).await?;
        self.navigate(AppView::Profile);
        Ok(message)
    }

    /// Notifications produced since the last call
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifier.drain()
    }
}

fn view_queries(view: &AppView) -> Option<QueryKey> {
    match view {
        AppView::Home => Some(monster_keys::all().segment("list")),
        AppView::MyMonsters => Some(monster_keys::all().segment("mine")),
        AppView::MonsterDetail(id) => Some(monster_keys::detail(id)),
        AppView::Profile => Some(user_keys::all()),
        _ => None,
    }
}
