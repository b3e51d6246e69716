//! # XDR Domain
//!
//! Pure types shared by the XDR SDK request core.
//!
//! This crate contains:
//! - The request-core error type and its error kinds
//! - The structured API error body decoded from non-2xx responses
//! - Client configuration and key types
//! - Request descriptions, envelope options and response wrappers
//! - Immutable build information
//!
//! ## Architecture
//! - No dependencies on other XDR crates
//! - No I/O; everything here is plain data

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
