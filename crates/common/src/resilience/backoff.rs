//! Exponential backoff with symmetric jitter
//!
//! The delay before retry `k` (zero-based) is `min(2^k s, max_delay)` plus a
//! uniformly distributed offset of up to ±25 % of that value. The jittered
//! value is not clamped back to `max_delay`, so a delay can exceed the cap by
//! at most a quarter of it.

use std::time::Duration;

use rand::Rng;

/// Cap used when none (or zero) is configured.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Maximum jitter as a fraction of the capped base delay.
pub const JITTER_RATIO: f64 = 0.25;

// 2^1024 already overflows f64 to infinity; larger exponents add nothing.
const MAX_EXPONENT: u32 = 1024;

/// Backoff calculator for the request retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    max_delay: Duration,
}

impl ExponentialBackoff {
    /// Create a calculator capped at `max_delay`; zero selects
    /// [`DEFAULT_MAX_DELAY`].
    pub fn new(max_delay: Duration) -> Self {
        let max_delay = if max_delay.is_zero() { DEFAULT_MAX_DELAY } else { max_delay };
        Self { max_delay }
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Capped exponential delay without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let secs = 2f64.powi(attempt.min(MAX_EXPONENT) as i32);
        if secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay)
    }

    /// Delay before retrying after attempt `attempt`, with random jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = rand::thread_rng().gen_range(-JITTER_RATIO..=JITTER_RATIO);
        self.delay_with_jitter(attempt, factor)
    }

    /// Delay for a given jitter factor in `[-JITTER_RATIO, JITTER_RATIO]`.
    ///
    /// Factors outside that range are clamped. Never negative.
    pub fn delay_with_jitter(&self, attempt: u32, factor: f64) -> Duration {
        let base = self.base_delay(attempt).as_secs_f64();
        let factor = if factor.is_nan() { 0.0 } else { factor.clamp(-JITTER_RATIO, JITTER_RATIO) };
        let secs = (base + base * factor).max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELAY)
    }
}
