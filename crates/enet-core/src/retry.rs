//! Bounded retry policy.
//!
//! Both the search transport call and every page-element lookup are polled
//! under a [`RetryPolicy`]: a maximum number of attempts, a backoff between
//! attempts and an optional total deadline. Tests inject
//! [`RetryPolicy::immediate`] to run without delays.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::error::{EnetError, Result};

/// Default number of attempts for page polling.
pub const DEFAULT_ATTEMPTS: usize = 10;

/// Default delay between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Delay schedule between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backoff {
    /// The same delay after every failed attempt.
    Fixed(Duration),
    /// Doubling delay, capped at `max`.
    Exponential {
        /// Delay after the first failed attempt.
        initial: Duration,
        /// Upper bound of the delay.
        max: Duration,
    },
}

/// Bounded retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: usize,
    /// Delay schedule between attempts.
    pub backoff: Backoff,
    /// Total time budget across all attempts.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_ATTEMPTS, DEFAULT_BACKOFF)
    }
}

impl RetryPolicy {
    /// Fixed delay between at most `max_attempts` attempts.
    #[must_use]
    pub const fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
            deadline: None,
        }
    }

    /// Doubling delay between at most `max_attempts` attempts.
    #[must_use]
    pub const fn exponential(max_attempts: usize, initial: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential { initial, max },
            deadline: None,
        }
    }

    /// No delay between at most `max_attempts` attempts.
    #[must_use]
    pub const fn immediate(max_attempts: usize) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }

    /// Sets a total time budget.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: usize) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let shift = u32::try_from(attempt.saturating_sub(1))
                    .unwrap_or(u32::MAX)
                    .min(16);
                initial.saturating_mul(1 << shift).min(max)
            }
        }
    }

    /// Returns the number of attempts, never less than one.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Waits before the next attempt. Returns false when the deadline would
    /// be exceeded.
    async fn pause(&self, attempt: usize, started: Instant) -> bool {
        let delay = self.delay_after(attempt);
        if let Some(deadline) = self.deadline
            && started.elapsed() + delay > deadline
        {
            return false;
        }
        if !delay.is_zero() {
            sleep(delay).await;
        }
        true
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// budget is exhausted. The last error is returned.
    pub async fn retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let attempts = self.attempts();
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    debug!(what, attempt, error = %e, "Retrying");
                    if !self.pause(attempt, started).await {
                        return Err(e);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Polls `op` until it yields a value.
    ///
    /// `Ok(None)` and [`EnetError::ElementNotFound`] mean "not available yet".
    /// Any other error ends polling immediately. Exhausting the budget yields
    /// [`EnetError::NavigationTimeout`] naming `element`.
    pub async fn poll<T, F, Fut>(&self, element: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let started = Instant::now();
        let attempts = self.attempts();
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) | Err(EnetError::ElementNotFound(_)) => {
                    trace!(element, attempt, "Element not available yet");
                }
                Err(e) => return Err(e),
            }
            if attempt >= attempts || !self.pause(attempt, started).await {
                return Err(EnetError::NavigationTimeout {
                    element: element.to_string(),
                    attempts: attempt,
                });
            }
            attempt += 1;
        }
    }
}
