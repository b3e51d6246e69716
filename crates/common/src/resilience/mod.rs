//! Resilience patterns for retrying transient failures
//!
//! Only backoff calculation lives here; the retry loop itself is owned by the
//! HTTP orchestrator because its retry decisions depend on HTTP status
//! classification.

pub mod backoff;

pub use backoff::{ExponentialBackoff, DEFAULT_MAX_DELAY, JITTER_RATIO};
