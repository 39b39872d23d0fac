//! No-op cache implementation.

use async_trait::async_trait;
use enet_core::{IssuerCache, IssuerDirectory, Result};
use std::time::Duration;
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get_directory` always returns `Ok(None)`, so every lookup goes to the
/// portal. Useful for disabling caching.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IssuerCache for NoopCache {
    async fn get_directory(&self) -> Result<Option<IssuerDirectory>> {
        trace!("NoopCache: get_directory called, returning None");
        Ok(None)
    }

    async fn put_directory(&self, _directory: &IssuerDirectory) -> Result<()> {
        trace!("NoopCache: put_directory called, doing nothing");
        Ok(())
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_cache_never_hits() {
        let cache = NoopCache::new();
        cache
            .put_directory(&IssuerDirectory::default())
            .await
            .unwrap();
        assert!(cache.get_directory().await.unwrap().is_none());
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 0);
    }
}
