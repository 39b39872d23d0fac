//! HTTP transport collaborator.
//!
//! The portal requires a consistent session (cookies) across the search call
//! and the report pages, so every component talks to it through one shared
//! [`Transport`].

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Mutex;

use crate::error::{EnetError, Result};

/// Request/response capability used to reach the portal.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Sends a POST request with a raw body and extra headers, returning the
    /// response body.
    async fn post(&self, url: &str, body: String, headers: &[(&str, &str)]) -> Result<String>;

    /// Sends a GET request, returning the response body.
    async fn get(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post(&self, url: &str, body: String, headers: &[(&str, &str)]) -> Result<String> {
        (**self).post(url, body, headers).await
    }

    async fn get(&self, url: &str) -> Result<String> {
        (**self).get(url).await
    }
}

/// HTTP method of a recorded request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// GET request.
    Get,
    /// POST request.
    Post,
}

/// A request seen by a [`ReplayTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Requested URL.
    pub url: String,
    /// Request body (empty for GET).
    pub body: String,
}

/// Transport that replays recorded response bodies.
///
/// Responses are registered per URL prefix; the longest matching prefix
/// wins. Requests without a route fail with [`EnetError::Transport`]. Every
/// request is recorded, which makes it suitable for offline runs and tests.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    routes: Vec<(String, String)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ReplayTransport {
    /// Creates a transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a response body for every URL starting with `prefix`.
    #[must_use]
    pub fn route(mut self, prefix: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.push((prefix.into(), body.into()));
        self
    }

    /// Returns every request made so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn respond(&self, method: Method, url: &str, body: String) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                method,
                url: url.to_string(),
                body,
            });
        }

        self.routes
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, body)| body.clone())
            .ok_or_else(|| EnetError::Transport(format!("no recorded response for {url}")))
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn post(&self, url: &str, body: String, _headers: &[(&str, &str)]) -> Result<String> {
        self.respond(Method::Post, url, body)
    }

    async fn get(&self, url: &str) -> Result<String> {
        self.respond(Method::Get, url, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let transport = ReplayTransport::new()
            .route("https://example.com/", "root")
            .route("https://example.com/page?id=2", "two");

        assert_eq!(
            transport.get("https://example.com/page?id=2&x=1").await.unwrap(),
            "two"
        );
        assert_eq!(
            transport.get("https://example.com/page?id=3").await.unwrap(),
            "root"
        );
        assert!(matches!(
            transport.get("https://other.com/").await,
            Err(EnetError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_records_requests() {
        let transport = ReplayTransport::new().route("https://example.com/", "ok");
        transport
            .post("https://example.com/search", "{a: '1'}".into(), &[])
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].body, "{a: '1'}");
    }
}
