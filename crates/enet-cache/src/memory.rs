//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use enet_core::{IssuerCache, IssuerDirectory, Result};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    cached_at: chrono::DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// In-memory issuer directory cache.
///
/// The directory is stored behind a `RwLock` and lost when the cache is
/// dropped. With a TTL configured, stale entries are treated as misses.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    directory: RwLock<Option<CacheEntry<IssuerDirectory>>>,
    ttl: Option<Duration>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache without expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            directory: RwLock::default(),
            ttl: Some(ttl),
        }
    }
}

#[async_trait]
impl IssuerCache for InMemoryCache {
    #[instrument(skip(self))]
    async fn get_directory(&self) -> Result<Option<IssuerDirectory>> {
        let cache = self.directory.read().await;
        match cache.as_ref() {
            Some(entry) if self.ttl.is_some_and(|ttl| entry.is_stale(ttl)) => {
                debug!("Cache entry for issuer directory is stale");
                Ok(None)
            }
            Some(entry) => {
                debug!("Cache hit for issuer directory");
                Ok(Some(entry.data.clone()))
            }
            None => {
                debug!("Cache miss for issuer directory");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, directory), fields(issuers = directory.len()))]
    async fn put_directory(&self, directory: &IssuerDirectory) -> Result<()> {
        let mut cache = self.directory.write().await;
        *cache = Some(CacheEntry::new(directory.clone()));
        debug!("Cached issuer directory");
        Ok(())
    }

    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut cache = self.directory.write().await;
        if cache.as_ref().is_some_and(|entry| entry.is_stale(ttl)) {
            *cache = None;
            debug!("Invalidated stale issuer directory");
            return Ok(1);
        }
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        *self.directory.write().await = None;
        debug!("Cleared issuer directory cache");
        Ok(())
    }
}
