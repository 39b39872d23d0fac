#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/enet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Filing discovery and statement normalization for the CVM ENET portal.
//!
//! This crate re-exports the core types, the search client, the report
//! navigator and the caches, and provides the [`FilingPipeline`] tying them
//! together.
//!
//! # Example
//!
//! ```rust,ignore
//! use enet::{FilingPipeline, FilterSpec};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> enet::Result<()> {
//!     let mut pipeline = FilingPipeline::http("MyApp/1.0 (contact@example.com)")?;
//!
//!     let spec = FilterSpec::new()
//!         .with_issuer(9512)
//!         .with_category("DFP")
//!         .with_date_range(
//!             NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
//!             NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
//!         );
//!
//!     let report = pipeline.run(&spec).await?;
//!     for statement in report.results.iter() {
//!         println!("{} {}: {} rows", statement.reference_date, statement.name, statement.len());
//!     }
//!
//!     pipeline.shutdown().await
//! }
//! ```

/// Filing pipeline.
pub mod pipeline;

// Core types and traits
pub use enet_core::*;

// Cache implementations
pub use enet_cache::{InMemoryCache, NoopCache};

// Search and navigation
pub use enet_report::{
    FrameState, HttpPageSession, NavigationContext, ReportNavigator, StatementExtractor,
};
pub use enet_search::{HttpTransport, SearchClient};

pub use pipeline::{
    FilingFailure, FilingPipeline, FilingResults, PipelineConfig, PipelineReport, run_sharded,
};
