//! Bounded retry with randomized (jittered) delays for search attempts.
//!
//! [`retry_with_jitter`] drives one attempt chain:
//!
//! ```text
//! Attempting(n) ──ok──────────────────────────────▶ Success
//!      │
//!      ├─retriable, n < max ──sleep(jitter)──▶ Attempting(n + 1)
//!      ├─retriable, n = max ──────────────────▶ Exhausted { attempts: n, last }
//!      └─not retriable ───────────────────────▶ returned as-is
//! ```
//!
//! The sleep function is injected so attempt counting and delays can be
//! tested without touching the network or the real clock.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use shelfscan_core::AppConfig;

use crate::error::{Outcome, ScrapeError};

/// Uniform delay window for the pause between attempts, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterWindow {
    min_ms: u64,
    max_ms: u64,
}

impl JitterWindow {
    /// Builds a window; an inverted range collapses to `min_ms`.
    #[must_use]
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms,
            max_ms: max_ms.max(min_ms),
        }
    }

    /// Draws a delay uniformly from `[min, max]`.
    #[must_use]
    pub fn sample(&self) -> Duration {
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    #[must_use]
    pub fn contains(&self, delay: Duration) -> bool {
        let ms = u128::from(self.min_ms)..=u128::from(self.max_ms);
        ms.contains(&delay.as_millis())
    }
}

impl Default for JitterWindow {
    fn default() -> Self {
        Self::from_millis(1_000, 3_000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; never less than 1.
    pub max_attempts: u32,
    pub jitter: JitterWindow,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, jitter: JitterWindow) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            jitter,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.scraper_max_attempts,
            JitterWindow::from_millis(
                config.scraper_retry_jitter_min_ms,
                config.scraper_retry_jitter_max_ms,
            ),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, JitterWindow::default())
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// `policy.max_attempts` retriable failures have happened in a row.
///
/// Between attempts it awaits `sleep(delay)` with a delay drawn from
/// `policy.jitter`. Attempts are strictly sequential.
///
/// # Errors
///
/// - Any non-retriable error from `operation`, unchanged, without retrying.
/// - [`ScrapeError::Exhausted`] wrapping the last retriable error once every
///   attempt has failed.
pub async fn retry_with_jitter<T, F, Fut, S, SFut>(
    policy: &RetryPolicy,
    sleep: S,
    mut operation: F,
) -> Outcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Outcome<T>>,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        tracing::debug!(attempt, max_attempts, "starting search attempt");

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retriable() {
            tracing::warn!(attempt, error = %err, "non-retriable search failure");
            return Err(err);
        }

        if attempt >= max_attempts {
            tracing::error!(attempts = attempt, error = %err, "all search attempts failed");
            return Err(ScrapeError::Exhausted {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let delay = policy.jitter.sample();
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            code = err.code(),
            error = %err,
            "retriable search failure, retrying after jitter"
        );
        sleep(delay).await;
        attempt += 1;
    }
}
