//! Request-scoped context
//!
//! Carries the cancellation signal and an optional caller-supplied request
//! id. The orchestrator never mutates the context; a request id generated
//! for a call lives only for that call.

use tokio_util::sync::CancellationToken;

/// Ambient context for one logical API call
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancellation: CancellationToken,
    request_id: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Propagate a correlation id instead of generating one per call.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_optional() {
        assert!(RequestContext::new().request_id().is_none());
        let ctx = RequestContext::new().with_request_id("req_abc");
        assert_eq!(ctx.request_id(), Some("req_abc"));
    }

    #[test]
    fn cancellation_is_shared_with_clones() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());
        let clone = ctx.clone();

        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(clone.is_cancelled());
    }
}
