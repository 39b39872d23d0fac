#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/enet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for ENET filing discovery.
//!
//! This crate provides the foundational abstractions shared by the search,
//! report and pipeline crates:
//!
//! - [`FilterSpec`](types::FilterSpec) / [`FilingRecord`](types::FilingRecord) - Search input and output
//! - [`Statement`](statement::Statement) - Normalized financial statement
//! - [`Transport`](transport::Transport) - HTTP collaborator
//! - [`PageSession`](session::PageSession) - Page automation collaborator
//! - [`RetryPolicy`](retry::RetryPolicy) - Bounded retries and polling
//! - [`IssuerCache`](cache::IssuerCache) - Issuer directory caching

/// Cache trait for the issuer directory.
pub mod cache;
/// Error types for filing operations.
pub mod error;
/// Bounded retry policy.
pub mod retry;
/// Page-session collaborator.
pub mod session;
/// Normalized financial statements.
pub mod statement;
/// Text helpers.
pub mod text;
/// HTTP transport collaborator.
pub mod transport;
/// Search-side data types.
pub mod types;

// Re-export commonly used items at crate root
pub use cache::IssuerCache;
pub use error::{EnetError, Result};
pub use retry::{Backoff, RetryPolicy};
pub use session::{Element, Locator, PageSession};
pub use statement::{
    Cell, Statement, StatementKind, StatementLayout, StatementName, StatementRow, UnitSegment,
};
pub use transport::{ReplayTransport, Transport};
pub use types::{
    Category, CategoryOption, DownloadTokens, ENET_URL, ENETCONSULTA_URL, FilingRecord,
    FilingStatus, FilterSpec, Issuer, IssuerCode, IssuerDirectory, ParticipantType,
};
