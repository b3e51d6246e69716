//! Reusable building blocks shared across XDR SDK crates.
//!
//! - `resilience`: backoff calculation for retry loops
//! - `random`: CSPRNG-backed nonce and identifier generation

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod random;
pub mod resilience;

// Re-export commonly used types for convenience
pub use random::{alphanumeric, random_hex, RandomError};
pub use resilience::{ExponentialBackoff, DEFAULT_MAX_DELAY, JITTER_RATIO};
