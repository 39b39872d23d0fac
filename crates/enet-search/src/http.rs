//! `reqwest`-backed transport.

use async_trait::async_trait;
use enet_core::{EnetError, Result, Transport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

/// Default minimum interval between requests.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(250);

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate limiter to keep a polite request cadence towards the portal.
#[derive(Debug)]
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    const fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// HTTP transport for the ENET portal.
///
/// The client keeps a cookie store so the search call and the report pages
/// share one server session. Requests are spaced by a minimum interval.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl HttpTransport {
    /// Create a transport with the given user agent.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| EnetError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client))
    }

    /// Create a transport with a custom HTTP client.
    ///
    /// The client should have a cookie store enabled for session continuity.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
        }
    }

    /// Set the minimum interval between requests.
    #[must_use]
    pub fn with_rate_limit(mut self, min_interval: Duration) -> Self {
        self.rate_limiter = Arc::new(Mutex::new(RateLimiter::new(min_interval)));
        self
    }

    async fn read(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(EnetError::Transport(format!(
                "{} returned HTTP {status}",
                response.url()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| EnetError::Transport(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, body, headers))]
    async fn post(&self, url: &str, body: String, headers: &[(&str, &str)]) -> Result<String> {
        self.rate_limiter.lock().await.wait().await;

        debug!("POST");
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| EnetError::Transport(e.to_string()))?;

        Self::read(response).await
    }

    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<String> {
        self.rate_limiter.lock().await.wait().await;

        debug!("GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EnetError::Transport(e.to_string()))?;

        Self::read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = HttpTransport::new("enet-test/0.1 (test@example.com)");
        assert!(transport.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let mut limiter = RateLimiter::new(Duration::from_millis(20));
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = HttpTransport::new("enet-test/0.1")
            .unwrap()
            .with_rate_limit(Duration::ZERO);
        let result = transport.get("http://127.0.0.1:9/").await;
        assert!(matches!(result, Err(EnetError::Transport(_))));
    }
}
