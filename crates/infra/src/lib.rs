//! # XDR Infrastructure
//!
//! Impure half of the XDR SDK request core.
//!
//! This crate contains:
//! - The retry orchestrator ([`XdrClient`]) and its leaf components
//! - The [`Transport`] seam with network and replay implementations
//! - Configuration loading from files and the environment
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Pure types live in `xdr-domain`
//! - Randomness and backoff come from `xdr-common`

pub mod config;
pub mod http;
pub mod logging;

// Re-export commonly used items
pub use http::{
    HttpRequest, HttpResponse, ReplayStep, ReplayTransport, ReqwestTransport, RequestContext,
    Transport, TransportError, XdrClient, XdrClientBuilder,
};
pub use logging::{init_tracing, LogFormat};
