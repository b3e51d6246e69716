//! Tracing subscriber setup
//!
//! The request core only emits `tracing` events; applications (and tests)
//! call [`init_tracing`] once to see them.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use xdr_domain::{Result, XdrError};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// Single-line output for terminals
    Compact,
    /// One JSON object per event
    Json,
}

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// # Errors
/// Returns `XdrError::Initialization` if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty().with_target(true)).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init(),
    };

    installed.map_err(|e| XdrError::Initialization(format!("tracing subscriber: {}", e)))
}
