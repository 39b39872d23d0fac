//! Error types for filing discovery and extraction.
//!
//! This module defines [`EnetError`] which covers every failure that can occur
//! while searching filings, navigating report pages or parsing statements.

use thiserror::Error;

/// Errors that can occur during filing discovery and statement extraction.
#[derive(Error, Debug)]
pub enum EnetError {
    /// The filter specification is invalid (unsupported category, participant
    /// type, or an inconsistent date range). Never retried.
    #[error("Invalid filter: {0}")]
    Validation(String),

    /// Network or HTTP failure talking to the portal.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An expected page element never appeared within the retry budget.
    #[error("Timed out waiting for {element} after {attempts} attempts")]
    NavigationTimeout {
        /// Description of the element that was awaited.
        element: String,
        /// Number of attempts made before giving up.
        attempts: usize,
    },

    /// A single element lookup missed.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A payload, table or caption did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A filing record lacks the link needed to drill into it.
    #[error("Filing {document} has no {missing} link")]
    PartialRecord {
        /// Identifier of the record (document id or issuer/date description).
        document: String,
        /// Which link is missing ("view" or "download").
        missing: &'static str,
    },

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The requested capability is not supported by this collaborator.
    #[error("Feature not supported: {0}")]
    NotSupported(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl EnetError {
    /// Returns true if retrying the failed operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::NavigationTimeout { .. } | Self::ElementNotFound(_)
        )
    }
}

/// Result type alias using [`EnetError`].
pub type Result<T> = std::result::Result<T, EnetError>;
