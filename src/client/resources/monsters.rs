//! Monster queries and the create mutation.

use crate::client::error::ApiError;
use crate::client::filter::TypeFilter;
use crate::client::http::ApiRequest;
use crate::client::messages::{user_message, ErrorContext};
use crate::client::notify::NotificationSource;
use crate::client::query::{Mutation, QueryCache, QueryKey};
use crate::client::resources::require_enabled;
use crate::client::session::SessionManager;
use crate::shared::monster::{
    CreateMonsterRequest, CreateMonsterResponse, Monster, MonsterResponse, MonstersResponse,
};
use crate::shared::validation::CreateMonsterForm;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::json;
use std::sync::Arc;

pub const MONSTERS_PATH: &str = "/monsters";
pub const MY_MONSTERS_PATH: &str = "/monsters/me";
pub const CREATE_MONSTER_PATH: &str = "/monsters/create";

/// Page, page size and filters of a monster list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonsterListParams {
    pub page: u32,
    pub page_size: u32,
    pub types: TypeFilter,
    pub search: Option<String>,
}

impl MonsterListParams {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            types: TypeFilter::new(),
            search: None,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn types(mut self, types: TypeFilter) -> Self {
        self.types = types;
        self
    }

    /// Blank search text means no search
    pub fn search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let search = search.trim();
        self.search = (!search.is_empty()).then(|| search.to_string());
        self
    }

    /// Same filters, following page
    pub fn next_page(&self) -> Self {
        self.clone().page(self.page + 1)
    }

    fn canonical(&self) -> serde_json::Value {
        json!({
            "page": self.page,
            "pageSize": self.page_size,
            "types": self.types,
            "search": self.search,
        })
    }

    fn to_request(&self, path: &str) -> ApiRequest {
        let mut request = ApiRequest::get(path)
            .query("page", self.page)
            .query("pageSize", self.page_size);
        for monster_type in self.types.iter() {
            request = request.query("types", monster_type.as_str());
        }
        if let Some(search) = &self.search {
            request = request.query("search", search);
        }
        request
    }
}

pub mod monster_keys {
    use super::MonsterListParams;
    use crate::client::query::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::new(["monsters"])
    }

    pub fn list(params: &MonsterListParams) -> QueryKey {
        all().segment("list").params(&params.canonical())
    }

    pub fn mine(params: &MonsterListParams) -> QueryKey {
        all().segment("mine").params(&params.canonical())
    }

    pub fn detail(id: &str) -> QueryKey {
        all().segment("detail").segment(id)
    }
}

/// `GET /monsters`
pub async fn fetch_monsters(
    session: &SessionManager,
    params: &MonsterListParams,
) -> Result<MonstersResponse, ApiError> {
    session.send(params.to_request(MONSTERS_PATH)).await?.json()
}

/// `GET /monsters/me`
pub async fn fetch_my_monsters(
    session: &SessionManager,
    params: &MonsterListParams,
) -> Result<MonstersResponse, ApiError> {
    session.send(params.to_request(MY_MONSTERS_PATH)).await?.json()
}

/// `GET /monster/:id`
pub async fn fetch_monster(session: &SessionManager, id: &str) -> Result<Monster, ApiError> {
    let response: MonsterResponse = session
        .send(ApiRequest::get(format!("/monster/{}", id)))
        .await?
        .json()?;
    Ok(response.monster)
}

/// `POST /monsters/create`
pub async fn post_monster(
    session: &SessionManager,
    request: &CreateMonsterRequest,
) -> Result<CreateMonsterResponse, ApiError> {
    session
        .send(ApiRequest::post(CREATE_MONSTER_PATH).json(request)?)
        .await?
        .json()
}

#[derive(Clone, Copy)]
enum ListKind {
    All,
    Mine,
}

impl ListKind {
    fn key(self, params: &MonsterListParams) -> QueryKey {
        match self {
            ListKind::All => monster_keys::list(params),
            ListKind::Mine => monster_keys::mine(params),
        }
    }
}

async fn list_query(
    session: &SessionManager,
    cache: &QueryCache,
    params: &MonsterListParams,
    kind: ListKind,
) -> Result<Arc<MonstersResponse>, ApiError> {
    let key = kind.key(params);
    let data = require_enabled(
        &key,
        cache
            .query(key.clone(), list_fetcher(session, params, kind), cache.defaults())
            .await?,
    )?;

    if data.pagination.has_next() {
        let next = params.next_page();
        cache.prefetch(kind.key(&next), list_fetcher(session, &next, kind), cache.defaults());
    }

    Ok(data)
}

fn list_fetcher(
    session: &SessionManager,
    params: &MonsterListParams,
    kind: ListKind,
) -> impl Fn() -> BoxFuture<'static, Result<MonstersResponse, ApiError>> + Send + Sync + 'static {
    let session = session.clone();
    let params = params.clone();
    move || {
        let session = session.clone();
        let params = params.clone();
        async move {
            match kind {
                ListKind::All => fetch_monsters(&session, &params).await,
                ListKind::Mine => fetch_my_monsters(&session, &params).await,
            }
        }
        .boxed()
    }
}

/// Gallery page; prefetches the next page when there is one
pub async fn monsters(
    session: &SessionManager,
    cache: &QueryCache,
    params: &MonsterListParams,
) -> Result<Arc<MonstersResponse>, ApiError> {
    list_query(session, cache, params, ListKind::All).await
}

/// Monsters of the signed-in user; prefetches the next page when there is one
pub async fn my_monsters(
    session: &SessionManager,
    cache: &QueryCache,
    params: &MonsterListParams,
) -> Result<Arc<MonstersResponse>, ApiError> {
    list_query(session, cache, params, ListKind::Mine).await
}

pub async fn monster(
    session: &SessionManager,
    cache: &QueryCache,
    id: &str,
) -> Result<Arc<Monster>, ApiError> {
    let key = monster_keys::detail(id);
    let fetch_session = session.clone();
    let fetch_id = id.to_string();
    let data = cache
        .query(
            key.clone(),
            move || {
                let session = fetch_session.clone();
                let id = fetch_id.clone();
                async move { fetch_monster(&session, &id).await }
            },
            cache.defaults(),
        )
        .await?;
    require_enabled(&key, data)
}

/// Validate and submit the create form, then invalidate every monster query
pub async fn create_monster(
    session: &SessionManager,
    cache: &QueryCache,
    form: &CreateMonsterForm,
) -> Result<CreateMonsterResponse, ApiError> {
    let request = form.validate()?;
    let success = session.notifier().clone();
    let failure = session.notifier().clone();

    cache
        .mutate(
            post_monster(session, &request),
            Mutation::new()
                .invalidates(monster_keys::all())
                .on_success(move |created: &CreateMonsterResponse| {
                    tracing::info!("Created monster {}", created.id);
                    success.success(NotificationSource::Mutation, "Monster created");
                })
                .on_error(move |e| {
                    failure.error(
                        NotificationSource::Mutation,
                        user_message(e, ErrorContext::CreateMonster),
                    );
                }),
        )
        .await
}
