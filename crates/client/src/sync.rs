//! Merge engine: keeps the local cache in step with the mention feed.
//!
//! The cache is refreshed only when it has never been fetched or its
//! `lastFetched` is at least one freshness window old. Fetched records are
//! placed before the cached ones and the cursor advances to the fetch time.
//! Network failures never reach the caller: the previous cache is served.

use chrono::{DateTime, SubsecRound, Utc};
use wmcache_core::{CacheState, CacheStore};

use crate::fetch::MentionSource;

/// Cache-backed view of a `MentionSource`.
pub struct MentionSync<S> {
    store: CacheStore,
    source: S,
    window: chrono::Duration,
}

impl<S: MentionSource> MentionSync<S> {
    pub fn new(store: CacheStore, source: S, window: chrono::Duration) -> Self {
        Self { store, source, window }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current mentions, fetching new ones first when the cache is stale.
    pub async fn get(&self) -> CacheState {
        let cache = self.store.read().await;
        let now = Utc::now();

        if !self.is_stale(&cache, now) {
            tracing::debug!("Cache is fresh ({} records), skipping fetch", cache.children.len());
            return cache;
        }

        self.merge(cache, now).await
    }

    /// Fetch regardless of cache age.
    pub async fn refresh(&self) -> CacheState {
        let cache = self.store.read().await;
        self.merge(cache, Utc::now()).await
    }

    pub fn is_stale(&self, cache: &CacheState, now: DateTime<Utc>) -> bool {
        cache.age(now).is_none_or(|age| age >= self.window)
    }

    async fn merge(&self, cache: CacheState, now: DateTime<Utc>) -> CacheState {
        let fetched = match self.source.fetch_since(cache.last_fetched).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Mention feed unavailable, serving {} cached records", cache.children.len());
                return cache;
            }
        };

        let added = fetched.len();
        let mut children = fetched;
        children.extend(cache.children);

        // Stored with millisecond precision, so keep the in-memory cursor identical.
        let merged = CacheState { last_fetched: Some(now.trunc_subsecs(3)), children };

        if let Err(e) = self.store.write(&merged).await {
            tracing::warn!(error = %e, path = %self.store.path().display(), "Failed to persist mention cache");
        }

        tracing::info!("Merged {} new mentions, {} total", added, merged.children.len());
        merged
    }
}
