//! Error types surfaced by the request core
//!
//! Every failure the orchestrator can produce maps to exactly one
//! [`ErrorKind`]. Server-reported errors keep the raw response body so callers
//! can run their own diagnostics.

use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::RETRYABLE_STATUSES;
use crate::types::ApiErrorBody;

/// Boxed error used for transport-level sources.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Stable classification of request-core failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Client could not be constructed (transport, subscriber, ...)
    Initialization,
    /// Configuration missing or invalid
    Config,
    /// Request payload could not be serialized
    Serialization,
    /// Base URL or composed request URL is invalid
    UrlConstruction,
    /// Signature or header values could not be produced
    HeaderGeneration,
    /// Transport failures persisted through every attempt
    Network,
    /// The retry loop ended without a response
    NoResponse,
    /// Response body could not be read
    BodyRead,
    /// Server reported an error with a decodable body
    Api,
    /// Server reported an error but the body did not decode
    ApiResponseParse,
    /// 2xx response whose body did not match the output type
    Deserialization,
    /// Caller cancelled the request
    Cancelled,
    /// Response envelope lacked an expected wrapper key
    WrapperKeyNotFound,
}

impl ErrorKind {
    /// Stable label suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialization => "initialization",
            Self::Config => "config",
            Self::Serialization => "serialization",
            Self::UrlConstruction => "url_construction",
            Self::HeaderGeneration => "header_generation",
            Self::Network => "network",
            Self::NoResponse => "no_response",
            Self::BodyRead => "body_read",
            Self::Api => "api",
            Self::ApiResponseParse => "api_response_parse",
            Self::Deserialization => "deserialization",
            Self::Cancelled => "cancelled",
            Self::WrapperKeyNotFound => "wrapper_key_not_found",
        }
    }
}

/// Main error type for the request core
#[derive(Debug, Error)]
pub enum XdrError {
    #[error("Initialization failure: {0}")]
    Initialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to serialize request body: {source}")]
    Serialization { source: serde_json::Error },

    #[error("Invalid base URL '{base_url}': {source}")]
    InvalidBaseUrl { base_url: String, source: url::ParseError },

    #[error("Constructed request URL '{url}' is invalid: {source}")]
    InvalidRequestUrl { url: String, source: url::ParseError },

    #[error("Failed to generate request headers: {0}")]
    HeaderGeneration(String),

    #[error("Network error after {attempts} attempt(s): {source}")]
    Network { attempts: u32, source: BoxError },

    #[error("No response received after {attempts} attempt(s)")]
    NoResponse { attempts: u32 },

    #[error("Failed to read response body: {source}")]
    BodyRead { source: BoxError },

    #[error("API error (status {status}): {error}")]
    Api { status: u16, error: ApiErrorBody, body: Vec<u8> },

    #[error(
        "Failed to parse API error response (status {status}): {}",
        String::from_utf8_lossy(.body)
    )]
    ApiResponseParse { status: u16, reason: String, body: Vec<u8> },

    #[error("Failed to deserialize response body: {source}")]
    Deserialization { source: serde_json::Error },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Wrapper key '{key}' not found in response")]
    WrapperKeyNotFound { key: String },
}

impl XdrError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Initialization(_) => ErrorKind::Initialization,
            Self::Config(_) => ErrorKind::Config,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::InvalidBaseUrl { .. } | Self::InvalidRequestUrl { .. } => {
                ErrorKind::UrlConstruction
            }
            Self::HeaderGeneration(_) => ErrorKind::HeaderGeneration,
            Self::Network { .. } => ErrorKind::Network,
            Self::NoResponse { .. } => ErrorKind::NoResponse,
            Self::BodyRead { .. } => ErrorKind::BodyRead,
            Self::Api { .. } => ErrorKind::Api,
            Self::ApiResponseParse { .. } => ErrorKind::ApiResponseParse,
            Self::Deserialization { .. } => ErrorKind::Deserialization,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::WrapperKeyNotFound { .. } => ErrorKind::WrapperKeyNotFound,
        }
    }

    /// HTTP status reported by the server, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::ApiResponseParse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body returned alongside server-reported errors.
    pub fn raw_body(&self) -> Option<&[u8]> {
        match self {
            Self::Api { body, .. } | Self::ApiResponseParse { body, .. } => Some(body.as_slice()),
            _ => None,
        }
    }

    /// Decoded server error, if the body was decodable.
    pub fn api_error(&self) -> Option<&ApiErrorBody> {
        match self {
            Self::Api { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Check if another attempt could plausibly succeed.
    ///
    /// Network failures and server errors carrying a retryable status are
    /// transient; everything else is a property of the request itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Api { status, .. } | Self::ApiResponseParse { status, .. } => {
                RETRYABLE_STATUSES.contains(status)
            }
            _ => false,
        }
    }
}

/// Result type alias for request-core operations
pub type Result<T> = std::result::Result<T, XdrError>;
