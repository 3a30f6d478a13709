//! # Query Layer
//!
//! A small keyed cache in front of the services, plus [`Query`] and
//! [`Mutation`] handles that expose `{data, loading, error}` state to
//! whatever drives the UI.
//!
//! - Cached values are fresh for [`QueryOptions::stale_time`] (60 s by
//!   default). Fresh values are served without a request.
//! - A fetch that fails with a transient error is retried
//!   [`QueryOptions::retry`] times (once by default), with no backoff.
//! - [`QueryClient::invalidate_queries`] marks every key under a prefix
//!   stale; the next fetch of those keys goes to the network.
//!
//! The cache is the only place results live. Services stay stateless.

pub mod hooks;

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ApiError;

pub type QueryKey = Vec<String>;

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;
type Fetcher<D, T> = Arc<dyn Fn(D) -> BoxFuture<T> + Send + Sync>;

/// Build a key from its parts.
pub fn query_key<I, S>(parts: I) -> QueryKey
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a cached value is served without refetching.
    pub stale_time: Duration,
    /// Extra attempts after a transient failure.
    pub retry: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(60),
            retry: 1,
        }
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    updated_at: Instant,
    stale: bool,
}

/// Shared result cache. Cheap to clone; clones share the cache.
#[derive(Clone, Default)]
pub struct QueryClient {
    cache: Arc<Mutex<HashMap<QueryKey, CacheEntry>>>,
    options: QueryOptions,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.cache.lock().len())
            .field("options", &self.options)
            .finish()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: QueryOptions) -> Self {
        Self {
            cache: Arc::default(),
            options,
        }
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// Cached value for `key`, fresh or not.
    pub fn get_query_data<T>(&self, key: &[String]) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let cache = self.cache.lock();
        cache.get(key)?.value.downcast_ref::<T>().cloned()
    }

    pub fn set_query_data<T>(&self, key: QueryKey, data: T)
    where
        T: Send + Sync + 'static,
    {
        self.cache.lock().insert(
            key,
            CacheEntry {
                value: Arc::new(data),
                updated_at: Instant::now(),
                stale: false,
            },
        );
    }

    /// Whether `key` has a value that may be served without refetching.
    pub fn is_fresh(&self, key: &[String]) -> bool {
        self.cache
            .lock()
            .get(key)
            .is_some_and(|entry| !entry.stale && entry.updated_at.elapsed() < self.options.stale_time)
    }

    fn fresh_data<T>(&self, key: &[String]) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if self.is_fresh(key) {
            self.get_query_data(key)
        } else {
            None
        }
    }

    /// Fresh cached value for `key`, or the result of `fetcher`.
    pub async fn fetch_query<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(data) = self.fresh_data(&key) {
            debug!("Query {:?} served from cache", key);
            return Ok(data);
        }
        self.refetch_query(key, fetcher).await
    }

    /// Run `fetcher` regardless of freshness and cache its result.
    pub async fn refetch_query<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0;
        let data = loop {
            match fetcher().await {
                Ok(data) => break data,
                Err(e) if e.is_transient() && attempt < self.options.retry => {
                    attempt += 1;
                    warn!("Query {:?} failed ({}), retrying", key, e);
                }
                Err(e) => return Err(e),
            }
        };

        self.set_query_data(key, data.clone());
        Ok(data)
    }

    /// Mark every key starting with `prefix` stale. Returns how many.
    pub fn invalidate_queries(&self, prefix: &[&str]) -> usize {
        let mut cache = self.cache.lock();
        let mut invalidated = 0;
        for (key, entry) in cache.iter_mut() {
            if key.len() >= prefix.len() && key.iter().zip(prefix).all(|(k, p)| k == p) {
                entry.stale = true;
                invalidated += 1;
            }
        }
        debug!("Invalidated {} queries under {:?}", invalidated, prefix);
        invalidated
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

/// Observable state of a [`Query`] or [`Mutation`].
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// A cached fetch bound to a key and a dependency value.
///
/// The full cache key is the base key followed by the JSON form of the
/// dependencies, so every distinct dependency value is cached separately.
pub struct Query<D, T> {
    client: QueryClient,
    base_key: QueryKey,
    deps: D,
    fetcher: Fetcher<D, T>,
    enabled: Arc<dyn Fn(&D) -> bool + Send + Sync>,
    state: Arc<Mutex<QueryState<T>>>,
    mounted: Arc<AtomicBool>,
}

impl<D, T> Query<D, T>
where
    D: Serialize + PartialEq + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(client: QueryClient, base_key: QueryKey, deps: D, fetcher: F) -> Self
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self {
            client,
            base_key,
            deps,
            fetcher: Arc::new(move |deps| Box::pin(fetcher(deps)) as BoxFuture<T>),
            enabled: Arc::new(|_: &D| true),
            state: Arc::default(),
            mounted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Only fetch while `predicate` holds for the current dependencies.
    pub fn enabled_when(mut self, predicate: impl Fn(&D) -> bool + Send + Sync + 'static) -> Self {
        self.enabled = Arc::new(predicate);
        self
    }

    pub fn key(&self) -> QueryKey {
        let mut key = self.base_key.clone();
        match serde_json::to_string(&self.deps) {
            Ok(deps) if deps != "null" => key.push(deps),
            Ok(_) => {}
            Err(e) => warn!("Query dependencies are not serializable: {}", e),
        }
        key
    }

    pub fn deps(&self) -> &D {
        &self.deps
    }

    pub fn is_enabled(&self) -> bool {
        (self.enabled)(&self.deps)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> QueryState<T> {
        self.state.lock().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.lock().data.clone()
    }

    /// Start observing and fetch unless a fresh value is cached.
    pub async fn mount(&self) {
        self.mounted.store(true, Ordering::SeqCst);
        self.run(false).await;
    }

    /// Replace the dependencies; refetches when they changed while mounted.
    pub async fn set_deps(&mut self, deps: D) {
        if deps == self.deps {
            return;
        }
        self.deps = deps;
        if self.is_mounted() {
            self.run(false).await;
        }
    }

    /// Fetch again unless a fresh value is cached, e.g. after invalidation.
    pub async fn fetch(&self) {
        self.run(false).await;
    }

    /// Fetch again, ignoring the cache.
    pub async fn refetch(&self) {
        self.run(true).await;
    }

    /// Stop observing. A request already running completes and fills the
    /// cache, but no longer touches this query's state.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    fn update(&self, f: impl FnOnce(&mut QueryState<T>)) {
        if self.is_mounted() {
            f(&mut *self.state.lock());
        }
    }

    async fn run(&self, force: bool) {
        if !self.is_enabled() {
            self.update(|state| state.loading = false);
            return;
        }

        let key = self.key();
        self.update(|state| {
            state.loading = true;
            state.error = None;
        });

        let fetcher = self.fetcher.clone();
        let deps = self.deps.clone();
        let call = move || fetcher(deps.clone());
        let result = if force {
            self.client.refetch_query(key, call).await
        } else {
            self.client.fetch_query(key, call).await
        };

        self.update(|state| {
            state.loading = false;
            match result {
                Ok(data) => state.data = Some(data),
                Err(e) => state.error = Some(e),
            }
        });
    }
}

/// A write operation that runs only when [`Mutation::mutate`] is called.
pub struct Mutation<V, T> {
    mutate_fn: Fetcher<V, T>,
    on_success: Option<Arc<dyn Fn(&T) + Send + Sync>>,
    state: Arc<Mutex<QueryState<T>>>,
}

impl<V, T> Mutation<V, T>
where
    V: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(mutate_fn: F) -> Self
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self {
            mutate_fn: Arc::new(move |vars| Box::pin(mutate_fn(vars)) as BoxFuture<T>),
            on_success: None,
            state: Arc::default(),
        }
    }

    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub async fn mutate(&self, vars: V) -> Result<T, ApiError> {
        {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
        }

        let result = (self.mutate_fn)(vars).await;

        {
            let mut state = self.state.lock();
            state.loading = false;
            match &result {
                Ok(data) => state.data = Some(data.clone()),
                Err(e) => state.error = Some(e.clone()),
            }
        }

        if let (Ok(data), Some(callback)) = (&result, &self.on_success) {
            callback(data);
        }
        result
    }

    pub fn state(&self) -> QueryState<T> {
        self.state.lock().clone()
    }

    pub fn reset(&self) {
        *self.state.lock() = QueryState::default();
    }
}
