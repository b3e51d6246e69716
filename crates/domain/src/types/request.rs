//! Request descriptions and response wrappers
//!
//! A [`RequestSpec`] is built by a namespace client for every call and
//! consumed once by the orchestrator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP methods used by the XDR API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrapper keys applied around request and response payloads.
///
/// Both lists are ordered outermost key first. `["request_data"]` turns a
/// payload `{...}` into `{"request_data": {...}}`; `["reply"]` extracts the
/// value under `reply` from the response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeOptions {
    pub request_wrapper_keys: Vec<String>,
    pub response_wrapper_keys: Vec<String>,
}

/// Description of a single API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub path: String,
    pub path_segments: Vec<String>,
    /// Multi-valued query parameters; keys are kept sorted.
    pub query: BTreeMap<String, Vec<String>>,
    pub envelope: EnvelopeOptions,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_segments: Vec::new(),
            query: BTreeMap::new(),
            envelope: EnvelopeOptions::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Append a path segment after the endpoint path.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.path_segments.push(segment.into());
        self
    }

    /// Add a query parameter value. Repeated keys accumulate values.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Nest the request payload under `keys`, outermost first.
    pub fn wrap_request<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.envelope.request_wrapper_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Descend into the response body through `keys`, outermost first.
    pub fn unwrap_response<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.envelope.response_wrapper_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// Successful response returned by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    /// Raw response body as received
    pub body: Vec<u8>,
    /// Decoded output; `None` when decoding was not requested or the body was
    /// empty
    pub data: Option<T>,
    /// Number of physical attempts made, including the successful one
    pub attempts: u32,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    /// Consume the response and return the decoded output.
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}
