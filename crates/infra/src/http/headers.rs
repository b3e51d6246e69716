//! Per-attempt request headers and request signing
//!
//! Standard keys are sent verbatim in `Authorization`. Any other key type
//! signs each attempt:
//!
//! ```text
//! nonce         = 64 chars from [A-Za-z0-9]
//! timestamp     = epoch milliseconds, decimal
//! Authorization = hex(sha256(api_key || nonce || timestamp))
//! ```
//!
//! Headers are generated once per physical attempt, so retries never reuse a
//! nonce or timestamp.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use sha2::{Digest, Sha256};
use xdr_common::alphanumeric;
use xdr_domain::constants::{
    CONTENT_TYPE_JSON, HEADER_AUTH_ID, HEADER_NONCE, HEADER_REQUEST_ID, HEADER_TIMESTAMP,
    NONCE_LENGTH,
};
use xdr_domain::{KeyType, Result, XdrError};

/// Inputs for one header generation
#[derive(Debug, Clone, Copy)]
pub struct HeaderParams<'a> {
    pub user_agent: &'a str,
    pub key_type: &'a KeyType,
    pub api_key: &'a str,
    pub api_key_id: u64,
    pub request_id: &'a str,
    /// Set when the request carries a JSON body
    pub set_content_type: bool,
}

/// Build the header set for a single attempt.
///
/// # Errors
/// Returns `XdrError::HeaderGeneration` if the nonce cannot be drawn or a
/// value is not a valid header value. No partial header set is returned.
pub fn generate_headers(params: &HeaderParams<'_>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, header_value(params.user_agent)?);
    headers.insert(HeaderName::from_static(HEADER_REQUEST_ID), header_value(params.request_id)?);
    headers.insert(
        HeaderName::from_static(HEADER_AUTH_ID),
        HeaderValue::from(params.api_key_id),
    );

    if params.set_content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    }

    if params.key_type.is_signed() {
        let nonce = alphanumeric(NONCE_LENGTH)
            .map_err(|e| XdrError::HeaderGeneration(format!("nonce generation failed: {e}")))?;
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let signature = sign(params.api_key, &nonce, &timestamp);

        headers.insert(HeaderName::from_static(HEADER_NONCE), header_value(&nonce)?);
        headers.insert(HeaderName::from_static(HEADER_TIMESTAMP), header_value(&timestamp)?);
        headers.insert(AUTHORIZATION, sensitive(&signature)?);
    } else {
        headers.insert(AUTHORIZATION, sensitive(params.api_key)?);
    }

    Ok(headers)
}

/// Lowercase hex SHA-256 of `api_key || nonce || timestamp`.
pub fn sign(api_key: &str, nonce: &str, timestamp: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hasher.update(nonce.as_bytes());
    hasher.update(timestamp.as_bytes());
    hex::encode(hasher.finalize())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| XdrError::HeaderGeneration(format!("invalid header value: {e}")))
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut value = header_value(value)?;
    value.set_sensitive(true);
    Ok(value)
}
