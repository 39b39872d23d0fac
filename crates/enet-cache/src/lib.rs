#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/enet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Issuer directory caches.
//!
//! This crate provides implementations of the [`IssuerCache`] trait from `enet-core`:
//!
//! - [`InMemoryCache`] - Process-scoped cache with optional TTL
//! - [`NoopCache`] - No-op cache that doesn't store anything

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use enet_core::IssuerCache;

// Re-export implementations
pub use memory::InMemoryCache;
pub use noop::NoopCache;
