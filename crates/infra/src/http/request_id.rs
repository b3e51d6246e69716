//! Correlation ids for API calls
//!
//! Ids look like `req_` followed by 32 lowercase hex characters. If the OS
//! random source is unavailable a timestamp-based id is used instead.

use tracing::warn;
use xdr_common::random_hex;
use xdr_domain::constants::{REQUEST_ID_PREFIX, REQUEST_ID_RANDOM_BYTES};

use super::context::RequestContext;

/// Generate a fresh request id.
pub fn generate() -> String {
    match random_hex(REQUEST_ID_RANDOM_BYTES) {
        Ok(hex) => format!("{REQUEST_ID_PREFIX}{hex}"),
        Err(err) => {
            warn!(error = %err, "secure random unavailable, using timestamp request id");
            fallback()
        }
    }
}

fn fallback() -> String {
    let now = chrono::Utc::now();
    let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros() * 1_000);
    format!("{REQUEST_ID_PREFIX}{nanos}")
}

/// Request id for a call: the context's id if present, else a new one.
pub fn resolve(ctx: &RequestContext) -> String {
    ctx.request_id().map_or_else(generate, ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_expected_shape() {
        let id = generate();
        assert!(id.starts_with("req_"));
        let hex = &id[4..];
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn fallback_is_prefixed_timestamp() {
        let id = fallback();
        assert!(id.starts_with("req_"));
        assert!(id[4..].parse::<i64>().is_ok());
    }

    #[test]
    fn resolve_prefers_context_id() {
        let ctx = RequestContext::new().with_request_id("req_from_caller");
        assert_eq!(resolve(&ctx), "req_from_caller");
        assert!(resolve(&RequestContext::new()).starts_with("req_"));
    }
}
