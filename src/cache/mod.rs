//! Caching HTTP client for outbound GET requests.
//!
//! Responses are keyed by the full request URL. A stored response younger
//! than the TTL is served without touching the network. Expired responses
//! are kept and served again when a live fetch fails (stale-if-error).

pub mod store;
pub mod transport;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use store::{CacheEntry, CacheError, CacheStore};
pub use transport::{HttpError, HttpResponse, ReqwestTransport, Transport};

pub type ResponseCache = Cache<String, CacheEntry>;

const STATUS_OK: u16 = 200;

/// Response returned by [`HttpCache::get`] together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    pub body: String,
    pub from_cache: bool,
}

impl CachedResponse {
    fn stored(entry: CacheEntry) -> Self {
        Self {
            status: entry.status,
            body: entry.body,
            from_cache: true,
        }
    }

    fn live(response: HttpResponse) -> Self {
        Self {
            status: response.status,
            body: response.body,
            from_cache: false,
        }
    }
}

pub struct HttpCache {
    transport: Arc<dyn Transport>,
    entries: ResponseCache,
    ttl: Duration,
    store: CacheStore,
}

impl HttpCache {
    /// Opens a cache backed by the JSON file at `path`, loading whatever it
    /// already holds. An unreadable file is logged and treated as empty.
    pub async fn open(
        transport: Arc<dyn Transport>,
        ttl: Duration,
        path: impl Into<PathBuf>,
    ) -> Self {
        let cache = Self::with_store(transport, ttl, CacheStore::file(path));

        match cache.store.load().await {
            Ok(saved) => {
                let count = saved.len();
                for (url, entry) in saved {
                    cache.entries.insert(url, entry).await;
                }
                tracing::info!("Loaded {} cached responses", count);
            }
            Err(e) => tracing::warn!("Ignoring unreadable cache file: {}", e),
        }

        cache
    }

    pub fn in_memory(transport: Arc<dyn Transport>, ttl: Duration) -> Self {
        Self::with_store(transport, ttl, CacheStore::memory())
    }

    fn with_store(transport: Arc<dyn Transport>, ttl: Duration, store: CacheStore) -> Self {
        // Unbounded: stale entries must stay available for fallback.
        let entries = Cache::builder().build();

        Self {
            transport,
            entries,
            ttl,
            store,
        }
    }

    pub async fn get(&self, url: &str) -> Result<CachedResponse, HttpError> {
        let stored = self.entries.get(url).await;

        if let Some(entry) = &stored {
            if self.is_fresh(entry, Utc::now()) {
                tracing::debug!("Cache hit, fetched at {}", entry.fetched_at);
                return Ok(CachedResponse::stored(entry.clone()));
            }
        }

        match self.transport.get(url).await {
            Ok(response) => {
                if response.status == STATUS_OK {
                    self.remember(url, &response).await;
                }
                Ok(CachedResponse::live(response))
            }
            Err(e) => match stored {
                Some(entry) => {
                    tracing::warn!(
                        "Live fetch failed, serving response from {}: {}",
                        entry.fetched_at,
                        e
                    );
                    Ok(CachedResponse::stored(entry))
                }
                None => Err(e),
            },
        }
    }

    #[cfg(test)]
    pub(crate) async fn entry(&self, url: &str) -> Option<CacheEntry> {
        self.entries.get(url).await
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(entry.fetched_at);
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => age < ttl,
            Err(_) => true,
        }
    }

    async fn remember(&self, url: &str, response: &HttpResponse) {
        let entry = CacheEntry {
            status: response.status,
            body: response.body.clone(),
            fetched_at: Utc::now(),
        };
        self.entries.insert(url.to_string(), entry).await;

        let snapshot = || -> BTreeMap<String, CacheEntry> {
            self.entries
                .iter()
                .map(|(key, value)| (key.as_ref().clone(), value))
                .collect()
        };

        if let Err(e) = self.store.save_with(snapshot).await {
            tracing::warn!("Failed to persist response cache: {}", e);
        }
    }
}
