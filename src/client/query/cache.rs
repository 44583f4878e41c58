//! # Query Cache
//!
//! Keyed cache of server reads with request deduplication, staleness,
//! prefix invalidation and cancellation.
//!
//! Every fetch runs on its own spawned task and is published as a shared
//! future under its key, so concurrent readers of the same key wait on one
//! request and receive the same `Arc`. A fetch only writes its result back if
//! it is still the registered fetch for that key when it completes; an
//! invalidation or cancellation in between detaches it.

use crate::client::error::ApiError;
use crate::client::messages::{user_message, ErrorContext};
use crate::client::notify::{NotificationSource, Notifier};
use crate::client::query::key::QueryKey;
use crate::client::session::SessionManager;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;

type Erased = Arc<dyn Any + Send + Sync>;
type FetchFuture = Shared<BoxFuture<'static, Result<Erased, ApiError>>>;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// Per-query behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a stored result is served without refetching
    pub stale_time: Duration,
    /// A disabled query never fetches and resolves to `None`
    pub enabled: bool,
    /// Extra attempts after a transient failure
    pub retry: u32,
    /// Delay before the first retry, doubled for each further one
    pub retry_delay: Duration,
    /// How long a stale entry is kept for fallback before it is evicted
    pub gc_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_millis(crate::shared::config::DEFAULT_STALE_TIME_MS),
            enabled: true,
            retry: crate::shared::config::DEFAULT_QUERY_RETRY,
            retry_delay: DEFAULT_RETRY_DELAY,
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

impl QueryOptions {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }
}

struct Entry {
    data: Erased,
    fetched_at: Instant,
    stale_after: Duration,
    gc_after: Duration,
    invalidated: bool,
}

impl Entry {
    fn is_fresh(&self) -> bool {
        !self.invalidated && self.fetched_at.elapsed() < self.stale_after
    }

    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() >= self.stale_after.saturating_add(self.gc_after)
    }
}

struct InFlight {
    id: u64,
    future: FetchFuture,
    abort: AbortHandle,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    in_flight: HashMap<QueryKey, InFlight>,
}

struct CacheInner {
    state: Mutex<CacheState>,
    next_id: AtomicU64,
    notifier: Notifier,
    defaults: QueryOptions,
}

/// Declared effects of a write
pub struct Mutation<T> {
    invalidates: Vec<QueryKey>,
    on_success: Option<Box<dyn FnOnce(&T) + Send>>,
    on_error: Option<Box<dyn FnOnce(&ApiError) + Send>>,
}

impl<T> Default for Mutation<T> {
    fn default() -> Self {
        Self {
            invalidates: Vec::new(),
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> Mutation<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every query under `prefix` once the write succeeds
    pub fn invalidates(mut self, prefix: QueryKey) -> Self {
        self.invalidates.push(prefix);
        self
    }

    pub fn on_success(mut self, callback: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnOnce(&ApiError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn invalidated_keys(&self) -> &[QueryKey] {
        &self.invalidates
    }
}

/// Cloneable handle to the query cache. Clones share the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("QueryCache")
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl QueryCache {
    pub fn new(notifier: Notifier, defaults: QueryOptions) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState::default()),
                next_id: AtomicU64::new(0),
                notifier,
                defaults,
            }),
        }
    }

    /// Options applied by the resource queries
    pub fn defaults(&self) -> QueryOptions {
        self.inner.defaults
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read `key`, fetching when there is no fresh entry.
    ///
    /// If the fetch fails while a stale entry exists, the stale data is
    /// returned and the error goes to the notification channel instead. A
    /// cancelled fetch falls back the same way without notifying.
    pub async fn query<T, F, Fut>(
        &self,
        key: QueryKey,
        fetch: F,
        options: QueryOptions,
    ) -> Result<Option<Arc<T>>, ApiError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if !options.enabled {
            return Ok(None);
        }

        let stale = {
            let state = self.state();
            match state.entries.get(&key) {
                Some(entry) if entry.is_fresh() => {
                    tracing::debug!("Cache hit for {}", key);
                    return downcast(&key, entry.data.clone()).map(Some);
                }
                Some(entry) => Some(entry.data.clone()),
                None => None,
            }
        };

        let fetch = self.start_fetch(key.clone(), fetch, options);
        match fetch.await {
            Ok(data) => downcast(&key, data).map(Some),
            Err(ApiError::Cancelled) => match stale {
                Some(data) => {
                    tracing::debug!("Fetch of {} cancelled, serving cached data", key);
                    downcast(&key, data).map(Some)
                }
                None => Err(ApiError::Cancelled),
            },
            Err(e) => match stale {
                Some(data) => {
                    tracing::warn!("Refetch of {} failed, serving cached data: {}", key, e);
                    self.inner
                        .notifier
                        .error(NotificationSource::Query, user_message(&e, ErrorContext::General));
                    downcast(&key, data).map(Some)
                }
                None => Err(e),
            },
        }
    }

    /// Warm `key` in the background. Failures are only logged.
    pub fn prefetch<T, F, Fut>(&self, key: QueryKey, fetch: F, options: QueryOptions)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if !options.enabled || self.is_fresh(&key) {
            return;
        }

        tracing::debug!("Prefetching {}", key);
        let fetch = self.start_fetch(key.clone(), fetch, options);
        tokio::spawn(async move {
            if let Err(e) = fetch.await {
                tracing::debug!("Prefetch of {} failed: {}", key, e);
            }
        });
    }

    fn start_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F, options: QueryOptions) -> FetchFuture
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let mut state = self.state();
        if let Some(in_flight) = state.in_flight.get(&key) {
            tracing::debug!("Joining in-flight fetch for {}", key);
            return in_flight.future.clone();
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let cache = self.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = fetch_with_retry(&fetch, options)
                .await
                .map(|data| Arc::new(data) as Erased);
            cache.complete(&task_key, id, options, &result);
            result
        });

        let abort = handle.abort_handle();
        let future = async move { handle.await.unwrap_or(Err(ApiError::Cancelled)) }
            .boxed()
            .shared();
        state.in_flight.insert(
            key,
            InFlight {
                id,
                future: future.clone(),
                abort,
            },
        );
        future
    }

    fn complete(&self, key: &QueryKey, id: u64, options: QueryOptions, result: &Result<Erased, ApiError>) {
        let mut state = self.state();
        if state.in_flight.get(key).map(|f| f.id) != Some(id) {
            tracing::debug!("Discarding detached response for {}", key);
            return;
        }
        state.in_flight.remove(key);

        if let Ok(data) = result {
            state.entries.insert(
                key.clone(),
                Entry {
                    data: data.clone(),
                    fetched_at: Instant::now(),
                    stale_after: options.stale_time,
                    gc_after: options.gc_time,
                    invalidated: false,
                },
            );
        }
        prune(&mut state);
    }

    /// Mark everything under `prefix` stale and detach its in-flight fetches
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut state = self.state();
        let mut count = 0;
        for (_, entry) in state.entries.iter_mut().filter(|(k, _)| k.starts_with(prefix)) {
            entry.invalidated = true;
            count += 1;
        }
        state.in_flight.retain(|k, _| !k.starts_with(prefix));
        tracing::debug!("Invalidated {} entries under {}", count, prefix);
        count
    }

    /// Abort in-flight fetches under `prefix`. Cached entries are kept.
    pub fn cancel(&self, prefix: &QueryKey) -> usize {
        let mut state = self.state();
        let keys: Vec<QueryKey> = state
            .in_flight
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &keys {
            if let Some(in_flight) = state.in_flight.remove(key) {
                in_flight.abort.abort();
            }
        }
        if !keys.is_empty() {
            tracing::debug!("Cancelled {} fetches under {}", keys.len(), prefix);
        }
        keys.len()
    }

    /// Stored data for `key`, fresh or not
    pub fn get_cached<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let data = self.state().entries.get(key).map(|e| e.data.clone())?;
        downcast(key, data).ok()
    }

    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.state().entries.get(key).is_some_and(Entry::is_fresh)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.state().in_flight.contains_key(key)
    }

    /// Wait for the fetch currently registered under `key`, if any
    pub async fn wait_for(&self, key: &QueryKey) {
        let fetch = self.state().in_flight.get(key).map(|f| f.future.clone());
        if let Some(fetch) = fetch {
            let _ = fetch.await;
        }
    }

    /// Drop every entry and detach every in-flight fetch
    pub fn clear(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.in_flight.clear();
        tracing::debug!("Query cache cleared");
    }

    /// Clear the cache whenever `session` ends, so reads made for one user
    /// are never served to the next
    pub fn bind_session(&self, session: &SessionManager) {
        let cache = self.clone();
        session.on_session_end(move || cache.clear());
    }

    /// Run a write once, then apply its declared effects
    pub async fn mutate<T, Fut>(&self, write: Fut, mutation: Mutation<T>) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Mutation {
            invalidates,
            on_success,
            on_error,
        } = mutation;

        match write.await {
            Ok(value) => {
                for prefix in &invalidates {
                    self.invalidate(prefix);
                }
                if let Some(callback) = on_success {
                    callback(&value);
                }
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("Mutation failed: {}", e);
                if let Some(callback) = on_error {
                    callback(&e);
                }
                Err(e)
            }
        }
    }
}

async fn fetch_with_retry<T, F, Fut>(fetch: &F, options: QueryOptions) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match fetch().await {
            Err(e) if attempt < options.retry && e.is_transient() => {
                let delay = options.retry_delay.saturating_mul(1u32 << attempt.min(16));
                attempt += 1;
                tracing::debug!("Fetch failed ({}), retry {} in {:?}", e, attempt, delay);
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}

/// Evict entries past their garbage-collection window, unless a fetch for
/// the key is still running
fn prune(state: &mut CacheState) {
    let CacheState { entries, in_flight } = state;
    let before = entries.len();
    entries.retain(|key, entry| !entry.is_expired() || in_flight.contains_key(key));
    let evicted = before - entries.len();
    if evicted > 0 {
        tracing::debug!("Evicted {} expired cache entries", evicted);
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, data: Erased) -> Result<Arc<T>, ApiError> {
    data.downcast::<T>().map_err(|_| ApiError::Cache {
        message: format!("entry for {} holds a different type", key),
    })
}
