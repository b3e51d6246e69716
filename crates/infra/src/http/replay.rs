//! Scripted transport for deterministic tests
//!
//! Replays a fixed list of outcomes round-robin and records every request it
//! receives. Backoff sleeps are skipped so retry tests run instantly.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum ReplayStep {
    Respond(HttpResponse),
    /// Fail as if the request never reached the server
    SendError(String),
    /// Fail while reading the response body
    BodyError(String),
}

impl ReplayStep {
    pub fn status(status: u16) -> Self {
        Self::Respond(HttpResponse::new(status, Vec::new()))
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::Respond(HttpResponse::new(status, body.to_string()))
    }

    pub fn body(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::Respond(HttpResponse::new(status, body))
    }
}

/// Transport that replays canned outcomes
#[derive(Debug, Default)]
pub struct ReplayTransport {
    steps: Vec<ReplayStep>,
    cursor: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ReplayTransport {
    pub fn new(steps: Vec<ReplayStep>) -> Self {
        Self { steps, cursor: AtomicUsize::new(0), requests: Mutex::new(Vec::new()) }
    }

    /// Number of requests sent so far.
    pub fn attempts(&self) -> usize {
        self.requests.lock().len()
    }

    /// Snapshot of every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);

        if self.steps.is_empty() {
            return Err(TransportError::Send("replay script is empty".into()));
        }

        let index = self.cursor.fetch_add(1, Ordering::SeqCst) % self.steps.len();
        match &self.steps[index] {
            ReplayStep::Respond(response) => Ok(response.clone()),
            ReplayStep::SendError(message) => Err(TransportError::Send(message.clone().into())),
            ReplayStep::BodyError(message) => Err(TransportError::Body(message.clone().into())),
        }
    }

    fn skip_backoff(&self) -> bool {
        true
    }
}
