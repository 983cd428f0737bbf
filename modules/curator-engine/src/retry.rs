//! Bounded retry for provider lookups.
//!
//! Only errors classified transient (`CuratorError::is_transient`) are retried.
//! A permanent error or an exhausted budget returns the last error.

use std::future::Future;
use std::time::Duration;

use curator_common::Result;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed(Duration),
    /// `attempt * step` after the n-th failed attempt.
    Linear(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never below 1.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Content refresh during selection: 10 attempts, 1s, 2s, 3s, ... apart.
    pub fn content_lookup() -> Self {
        Self::new(10, Backoff::Linear(Duration::from_secs(1)))
    }

    /// Account and follower lookups during scoring.
    pub fn scoring_lookup() -> Self {
        Self::new(3, Backoff::Linear(Duration::from_secs(1)))
    }

    pub fn no_retry() -> Self {
        Self::new(1, Backoff::None)
    }

    /// Same attempt budget with every wait removed.
    pub fn without_delay(self) -> Self {
        Self {
            backoff: Backoff::None,
            ..self
        }
    }

    /// Wait after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => d,
            Backoff::Linear(step) => step.saturating_mul(attempt),
        }
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
