// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Backoff for the optimistic manifest merge.
//!
//! A version conflict means another writer changed the manifest between our
//! read and our conditional write, so the union has to be recomputed from a
//! fresh read. That is the only thing retried here; registration failures
//! themselves are dropped after one attempt.
//!
//! Contenders that conflict together would otherwise wake together and
//! conflict again, so every pause gets a random extra of up to `jitter`.
//!
//! # Example
//!
//! ```
//! use collection_registry::RetryConfig;
//! use std::time::Duration;
//!
//! let config = RetryConfig {
//!     initial_delay: Duration::from_millis(10),
//!     max_delay: Duration::from_millis(200),
//!     factor: 2.0,
//!     jitter: Duration::from_millis(20),
//!     max_retries: Some(5),
//! };
//! assert_eq!(config.delay_for(0), Duration::from_millis(10));
//! assert_eq!(config.delay_for(3), Duration::from_millis(80));
//! assert_eq!(config.delay_for(10), Duration::from_millis(200));
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Backoff parameters. `max_retries` caps total attempts; `None` never gives up.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// Upper bound of the random extra added to each pause
    pub jitter: Duration,
    pub max_retries: Option<usize>,
}

impl RetryConfig {
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            max_retries: Some(3),
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            factor: 2.0,
            jitter: Duration::from_millis(2),
        }
    }

    /// Pause before retry number `retry` (zero-based), capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.factor.powi(exponent);
        if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
            self.max_delay
        } else {
            Duration::from_nanos(nanos.round() as u64)
        }
    }

    /// [`delay_for`](Self::delay_for) plus a uniform random extra in `0..=jitter`.
    #[must_use]
    pub fn jittered_delay_for(&self, retry: u32) -> Duration {
        let bound = u64::try_from(self.jitter.as_nanos()).unwrap_or(u64::MAX);
        let extra = if bound == 0 { 0 } else { rand::thread_rng().gen_range(0..=bound) };
        self.delay_for(retry).saturating_add(Duration::from_nanos(extra))
    }

    fn exhausted(&self, attempts: usize) -> bool {
        self.max_retries.is_some_and(|max| attempts >= max)
    }
}

/// Run `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or the attempt budget is spent. The last error is returned.
pub async fn retry_when<F, Fut, T, E, P>(
    operation_name: &str,
    config: &RetryConfig,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempts: usize = 0;

    loop {
        let err = match operation().await {
            Ok(val) => {
                if attempts > 0 {
                    debug!(operation = operation_name, retries = attempts, "succeeded after retrying");
                }
                return Ok(val);
            }
            Err(err) => err,
        };

        attempts += 1;
        if !should_retry(&err) {
            return Err(err);
        }
        if config.exhausted(attempts) {
            warn!(operation = operation_name, attempts, error = %err, "giving up");
            return Err(err);
        }

        let delay = config.jittered_delay_for(u32::try_from(attempts - 1).unwrap_or(u32::MAX));
        debug!(operation = operation_name, attempts, error = %err, ?delay, "retrying");
        sleep(delay).await;
    }
}
