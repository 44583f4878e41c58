//! Resource definitions: key builders, fetchers and mutations of every
//! endpoint the client talks to, wired through the session and the cache.

pub mod auth;
pub mod monsters;
pub mod user;

pub use monsters::{monster_keys, MonsterListParams};
pub use user::user_keys;

use crate::client::error::ApiError;
use crate::client::query::QueryKey;
use std::sync::Arc;

/// Data of a query that is always enabled
pub(crate) fn require_enabled<T>(key: &QueryKey, data: Option<Arc<T>>) -> Result<Arc<T>, ApiError> {
    data.ok_or_else(|| ApiError::Cache {
        message: format!("query {} is disabled", key),
    })
}
