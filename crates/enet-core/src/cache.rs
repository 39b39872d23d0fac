//! Cache trait for the issuer directory.
//!
//! The issuer list changes rarely and is expensive to fetch, so the search
//! client looks it up through an injected [`IssuerCache`] whose lifetime the
//! caller controls.

use async_trait::async_trait;
use std::time::Duration;

use crate::{error::Result, types::IssuerDirectory};

/// Trait for caching the issuer directory.
#[async_trait]
pub trait IssuerCache: Send + Sync {
    /// Retrieves the cached directory.
    ///
    /// Returns `Ok(Some(directory))` if cached, `Ok(None)` if not cached.
    async fn get_directory(&self) -> Result<Option<IssuerDirectory>>;

    /// Stores the directory.
    async fn put_directory(&self, directory: &IssuerDirectory) -> Result<()>;

    /// Removes entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
