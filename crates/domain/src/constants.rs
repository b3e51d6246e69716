//! Wire-level constants
//!
//! Header names, retry classification and configuration defaults used by the
//! request core.

// Header names (lowercase so they can be used with `HeaderName::from_static`)
pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const HEADER_AUTH_ID: &str = "x-xdr-auth-id";
pub const HEADER_NONCE: &str = "x-xdr-nonce";
pub const HEADER_TIMESTAMP: &str = "x-xdr-timestamp";
pub const CONTENT_TYPE_JSON: &str = "application/json";

// Authentication
pub const KEY_TYPE_STANDARD: &str = "standard";
pub const KEY_TYPE_ADVANCED: &str = "advanced";
pub const NONCE_LENGTH: usize = 64;

// Request ids
pub const REQUEST_ID_PREFIX: &str = "req_";
pub const REQUEST_ID_RANDOM_BYTES: usize = 16;

/// HTTP statuses for which another attempt is made while attempts remain.
pub const RETRYABLE_STATUSES: [u16; 5] = [401, 429, 502, 503, 504];

// Configuration defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_MAX_DELAY_SECS: u64 = 60;

pub const SDK_NAME: &str = "xdr-sdk-rust";
