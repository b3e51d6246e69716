//! Request URL composition
//!
//! Joins the configured base URL, the endpoint path and any extra path
//! segments, then appends sorted query parameters. The result is re-parsed
//! before it is handed to the transport.

use std::collections::BTreeMap;

use url::Url;
use xdr_domain::{Result, XdrError};

/// Compose and validate the absolute URL for a request.
///
/// # Arguments
/// * `base_url` - Configured API base URL
/// * `path` - Endpoint path; a leading `/` is ignored
/// * `segments` - Extra path segments, trimmed of surrounding slashes
/// * `query` - Query parameters; empty maps leave the query untouched
///
/// # Errors
/// - `XdrError::InvalidBaseUrl` if `base_url` does not parse or cannot carry
///   a path
/// - `XdrError::InvalidRequestUrl` if the composed URL does not re-parse
pub fn build_url(
    base_url: &str,
    path: &str,
    segments: &[String],
    query: &BTreeMap<String, Vec<String>>,
) -> Result<String> {
    let mut url = Url::parse(base_url)
        .map_err(|source| XdrError::InvalidBaseUrl { base_url: base_url.to_string(), source })?;

    if url.cannot_be_a_base() {
        return Err(XdrError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        });
    }

    let components = std::iter::once(path.trim_start_matches('/'))
        .chain(segments.iter().map(|s| s.trim_matches('/')))
        .flat_map(|component| component.split('/'))
        .filter(|piece| !piece.is_empty());

    let mut joined = url.path().trim_end_matches('/').to_string();
    for piece in components {
        joined.push('/');
        joined.push_str(piece);
    }
    if joined.is_empty() {
        joined.push('/');
    }
    url.set_path(&joined);

    if query.values().any(|values| !values.is_empty()) {
        url.set_query(None);
        let mut pairs = url.query_pairs_mut();
        for (key, values) in query {
            for value in values {
                pairs.append_pair(key, value);
            }
        }
    }

    let composed = url.to_string();
    match Url::parse(&composed) {
        Ok(_) => Ok(composed),
        Err(source) => Err(XdrError::InvalidRequestUrl { url: composed, source }),
    }
}
