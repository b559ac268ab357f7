//! Reusable retry/backoff policy.
//!
//! Two components retry with slightly different shapes: page fetching uses
//! exponential backoff with jitter, image downloads use linear backoff with
//! fewer attempts. Both share this small policy value instead of duplicating
//! the arithmetic inline.
//!
//! The delay before retry `n` (1-based) is:
//!
//! ```text
//! exponential: min(base * 2^(n-1), max) + jitter(0..=250ms)
//! linear:      min(base * n, max)
//! ```

use rand::{rng, Rng};
use std::time::Duration;

/// Shape of the delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Delay doubles with each attempt.
    Exponential,
    /// Delay grows by one base step per attempt.
    Linear,
}

/// A retry budget with its backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    backoff: Backoff,
    jitter: bool,
}

impl RetryPolicy {
    pub fn new(
        max_retries: usize,
        base_delay: Duration,
        max_delay: Duration,
        backoff: Backoff,
        jitter: bool,
    ) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            backoff,
            jitter,
        }
    }

    /// Policy for page fetches: 3 retries, exponential, jittered.
    pub fn page_fetch() -> Self {
        Self::new(
            3,
            Duration::from_millis(500),
            Duration::from_secs(8),
            Backoff::Exponential,
            true,
        )
    }

    /// Policy for image downloads: 2 retries, linear, no jitter.
    pub fn image_download() -> Self {
        Self::new(
            2,
            Duration::from_millis(250),
            Duration::from_secs(2),
            Backoff::Linear,
            false,
        )
    }

    /// Delay to sleep before retry `attempt` (1-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let attempt = attempt.max(1);
        let mut delay = match self.backoff {
            Backoff::Exponential => {
                let shift = (attempt - 1).min(16) as u32;
                self.base_delay.saturating_mul(1u32 << shift)
            }
            Backoff::Linear => self.base_delay.saturating_mul(attempt as u32),
        };
        if delay > self.max_delay {
            delay = self.max_delay;
        }
        if self.jitter {
            let jitter_ms: u64 = rng().random_range(0..=250);
            delay += Duration::from_millis(jitter_ms);
        }
        delay
    }
}
