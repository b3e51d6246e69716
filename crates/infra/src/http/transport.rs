//! Transport abstraction
//!
//! The orchestrator talks to the network only through [`Transport`]. The
//! production implementation is [`ReqwestTransport`]; tests use
//! [`super::replay::ReplayTransport`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use thiserror::Error;
use xdr_domain::constants::DEFAULT_TIMEOUT_SECS;
use xdr_domain::{BoxError, HttpMethod, XdrError};

/// A fully prepared request for one attempt
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// A response with its body fully buffered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or no response arrived
    #[error("failed to send request: {0}")]
    Send(#[source] BoxError),

    /// A response arrived but its body could not be read
    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),
}

/// Executes single HTTP attempts.
///
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send one request and buffer the whole response body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Whether the orchestrator should skip backoff sleeps between attempts.
    fn skip_backoff(&self) -> bool {
        false
    }
}

/// Network transport backed by a pooled [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| TransportError::Send(Box::new(e)))?;
        let status = response.status().as_u16();

        // The connection is released when `response` is consumed, whether or
        // not the body read succeeds.
        let body = response.bytes().await.map_err(|e| TransportError::Body(Box::new(e)))?;

        Ok(HttpResponse { status, body: body.to_vec() })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Per-attempt timeout covering connect, send and body read.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, XdrError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|e| XdrError::Initialization(format!("failed to build HTTP client: {e}")))?;

        Ok(ReqwestTransport { client })
    }
}
