#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/enet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Report page navigation and statement extraction.
//!
//! - [`ReportNavigator`] - Discovers statements and session tokens, fetches statement frames
//! - [`StatementExtractor`] - Normalizes a statement page into a [`Statement`](enet_core::Statement)
//! - [`HttpPageSession`] - Script-less [`PageSession`](enet_core::PageSession) over a transport

mod dom;

/// Statement table normalization.
pub mod extractor;
/// Script-less page session.
pub mod http_session;
/// Report page navigation.
pub mod navigator;

pub use extractor::{StatementExtractor, parse_amount, resolve_currency_unit};
pub use http_session::HttpPageSession;
pub use navigator::{
    FrameState, NavigationContext, ReportNavigator, SessionTokens, StatementOption,
};
