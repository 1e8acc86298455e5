//! Bounded retry with classification-aware backoff.
//!
//! Wraps a single provider call (unary, or the opening of a stream).
//! Attempts are strictly sequential; the inter-attempt delay suspends the
//! current task only.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::{Error, ErrorClass};

/// Tuning for the retry executor.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails fatally, or exhausts the attempt
    /// budget. Transient failures (rate limit, overload) back off linearly
    /// in the attempt number; a provider-suggested retry interval overrides
    /// the computed delay for rate limits, capped at `max_delay`. The final
    /// error propagates unchanged.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    error!(attempt, error = %err, "provider call failed");

                    let class = err.class();
                    if !class.is_transient() || attempt >= self.max_attempts {
                        return Err(err);
                    }

                    let delay = self.delay_for(attempt, class, &err);
                    let kind = match class {
                        ErrorClass::RateLimited => "rate limited",
                        ErrorClass::Overloaded => "model overloaded",
                        ErrorClass::Fatal => unreachable!(),
                    };
                    warn!(delay_ms = delay.as_millis() as u64, "{kind}, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn delay_for(&self, attempt: u32, class: ErrorClass, err: &Error) -> Duration {
        if class == ErrorClass::RateLimited {
            if let Some(hint) = err.retry_hint() {
                return hint.min(self.max_delay);
            }
        }
        self.base_delay * attempt
    }
}
