#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/enet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Filing search against the ENET portal.
//!
//! - [`codec`] - Request encoding and response decoding
//! - [`links`] - View and download action extraction
//! - [`SearchClient`] - Search, issuer directory and category lookups
//! - [`HttpTransport`] - `reqwest` transport with session cookies

/// Search client.
pub mod client;
/// Wire codec for the search endpoint.
pub mod codec;
/// Issuer and category reference data.
pub mod directory;
/// `reqwest`-backed transport.
pub mod http;
/// Action link extraction.
pub mod links;

pub use client::SearchClient;
pub use codec::{RawRow, RequestBody, decode, encode};
pub use http::HttpTransport;
pub use links::{ViewLink, extract_download, extract_view};
