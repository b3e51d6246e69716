//! Signed, retrying API client
//!
//! [`XdrClient::execute`] is the single entry point used by every namespace
//! client. One call runs:
//!
//! 1. Resolve the request id, serialize and envelope-wrap the input, build
//!    the URL. Failures here are terminal and consume no attempt.
//! 2. For each attempt up to `max_retries + 1`: check cancellation, generate
//!    fresh headers, send. Transport errors and the statuses
//!    401/429/502/503/504 are retried with backoff while attempts remain.
//! 3. Decode the 2xx body into the caller's output type, unwrapping the
//!    response envelope.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn, Span};
use xdr_common::ExponentialBackoff;
use xdr_domain::{ApiResponse, BuildInfo, ClientConfig, RequestSpec, Result, XdrError};

use super::classifier::{classify_error_response, is_retryable_status, is_success};
use super::context::RequestContext;
use super::envelope;
use super::headers::{generate_headers, HeaderParams};
use super::request_id;
use super::transport::{HttpRequest, ReqwestTransport, Transport, TransportError};
use super::url::build_url;

/// Raw outcome of a successful exchange, before output decoding
struct Exchange {
    status: u16,
    body: Vec<u8>,
    attempts: u32,
}

/// API client with signing and retry semantics.
///
/// Holds no per-call state, so one instance can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct XdrClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    user_agent: String,
    backoff: ExponentialBackoff,
}

impl XdrClient {
    /// Start building a new client.
    pub fn builder() -> XdrClientBuilder {
        XdrClientBuilder::default()
    }

    /// Client over the network transport.
    ///
    /// # Errors
    /// Returns `XdrError::Config` for invalid configuration and
    /// `XdrError::Initialization` if the HTTP transport cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Execute a call and decode the response body into `O`.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Cancellation signal and optional request id
    /// * `spec` - Method, path, segments, query and envelope options
    /// * `input` - Payload to serialize, if any
    ///
    /// # Returns
    ///
    /// The decoded output (absent for empty bodies) with the raw body,
    /// status, attempt count and request id.
    ///
    /// # Errors
    ///
    /// Returns the `XdrError` variant for the failure kind; server-reported
    /// errors carry the raw response body.
    pub async fn execute<I, O>(
        &self,
        ctx: &RequestContext,
        spec: &RequestSpec,
        input: Option<&I>,
    ) -> Result<ApiResponse<O>>
    where
        I: Serialize + ?Sized + Sync,
        O: DeserializeOwned,
    {
        self.run(ctx, spec, input, true).await
    }

    /// Execute a call without decoding the response body.
    pub async fn execute_raw<I>(
        &self,
        ctx: &RequestContext,
        spec: &RequestSpec,
        input: Option<&I>,
    ) -> Result<ApiResponse<()>>
    where
        I: Serialize + ?Sized + Sync,
    {
        self.run(ctx, spec, input, false).await
    }

    /// Execute a call that carries no request body.
    pub async fn get<O>(&self, ctx: &RequestContext, spec: &RequestSpec) -> Result<ApiResponse<O>>
    where
        O: DeserializeOwned,
    {
        self.run::<(), O>(ctx, spec, None, true).await
    }

    /// Execute a call with a JSON body.
    pub async fn post<I, O>(
        &self,
        ctx: &RequestContext,
        spec: &RequestSpec,
        input: &I,
    ) -> Result<ApiResponse<O>>
    where
        I: Serialize + ?Sized + Sync,
        O: DeserializeOwned,
    {
        self.run(ctx, spec, Some(input), true).await
    }

    #[instrument(
        name = "xdr_request",
        skip_all,
        fields(method = %spec.method, endpoint = %spec.path, request_id = tracing::field::Empty)
    )]
    async fn run<I, O>(
        &self,
        ctx: &RequestContext,
        spec: &RequestSpec,
        input: Option<&I>,
        decode: bool,
    ) -> Result<ApiResponse<O>>
    where
        I: Serialize + ?Sized + Sync,
        O: DeserializeOwned,
    {
        let request_id = request_id::resolve(ctx);
        Span::current().record("request_id", request_id.as_str());
        info!(method = %spec.method, endpoint = %spec.path, request_id = %request_id, "api request started");

        let result = match self.dispatch(ctx, spec, input, &request_id).await {
            Ok(exchange) => complete(exchange, spec, decode, &request_id),
            Err(err) => Err(err),
        };

        match &result {
            Ok(response) => info!(
                method = %spec.method,
                endpoint = %spec.path,
                request_id = %request_id,
                status = response.status,
                attempts = response.attempts,
                "api request completed"
            ),
            Err(err) => warn!(
                method = %spec.method,
                endpoint = %spec.path,
                request_id = %request_id,
                status = err.status(),
                error_kind = err.kind().as_str(),
                error = %err,
                "api request failed"
            ),
        }

        result
    }

    async fn dispatch<I>(
        &self,
        ctx: &RequestContext,
        spec: &RequestSpec,
        input: Option<&I>,
        request_id: &str,
    ) -> Result<Exchange>
    where
        I: Serialize + ?Sized + Sync,
    {
        let body = input
            .map(|value| envelope::wrap(value, &spec.envelope.request_wrapper_keys))
            .transpose()?;
        let url = build_url(&self.config.api_url, &spec.path, &spec.path_segments, &spec.query)?;
        let max_attempts = self.config.max_attempts();

        for attempt in 0..max_attempts {
            if ctx.is_cancelled() {
                return Err(XdrError::Cancelled);
            }

            let attempts_used = attempt + 1;
            let has_more = attempts_used < max_attempts;

            let headers = generate_headers(&HeaderParams {
                user_agent: &self.user_agent,
                key_type: &self.config.key_type,
                api_key: &self.config.api_key,
                api_key_id: self.config.api_key_id,
                request_id,
                set_content_type: body.is_some(),
            })?;
            let request =
                HttpRequest { method: spec.method, url: url.clone(), headers, body: body.clone() };

            debug!(attempt = attempts_used, max_attempts, url = %url, "sending HTTP request");

            let sent = tokio::select! {
                biased;
                () = ctx.cancelled() => return Err(XdrError::Cancelled),
                sent = self.transport.send(request) => sent,
            };

            let response = match sent {
                Ok(response) => response,
                Err(TransportError::Send(source)) => {
                    if ctx.is_cancelled() {
                        return Err(XdrError::Cancelled);
                    }
                    if has_more {
                        debug!(attempt = attempts_used, error = %source, "HTTP request failed");
                        self.pause(ctx, attempt, None).await?;
                        continue;
                    }
                    return Err(XdrError::Network { attempts: attempts_used, source });
                }
                Err(TransportError::Body(source)) => return Err(XdrError::BodyRead { source }),
            };

            let status = response.status;
            if is_success(status) {
                return Ok(Exchange { status, body: response.body, attempts: attempts_used });
            }

            let error = classify_error_response(status, response.body);
            if is_retryable_status(status) && has_more {
                debug!(attempt = attempts_used, status, error = %error, "retryable status received");
                self.pause(ctx, attempt, Some(status)).await?;
                continue;
            }

            return Err(error);
        }

        // Every iteration returns or continues, and `max_attempts()` is at
        // least 1, so this only guards against a zero-attempt loop.
        Err(XdrError::NoResponse { attempts: max_attempts })
    }

    /// Sleep before the next attempt; returns early if the call is cancelled.
    async fn pause(&self, ctx: &RequestContext, attempt: u32, status: Option<u16>) -> Result<()> {
        let delay =
            if self.transport.skip_backoff() { Duration::ZERO } else { self.backoff.delay(attempt) };

        debug!(
            attempt = attempt + 1,
            next_attempt = attempt + 2,
            delay_ms = delay.as_millis() as u64,
            status,
            "retrying after backoff"
        );

        if delay.is_zero() {
            return Ok(());
        }

        tokio::select! {
            biased;
            () = ctx.cancelled() => Err(XdrError::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn complete<O>(
    exchange: Exchange,
    spec: &RequestSpec,
    decode: bool,
    request_id: &str,
) -> Result<ApiResponse<O>>
where
    O: DeserializeOwned,
{
    let data = if decode && !exchange.body.is_empty() {
        Some(envelope::unwrap(&exchange.body, &spec.envelope.response_wrapper_keys)?)
    } else {
        None
    };

    Ok(ApiResponse {
        status: exchange.status,
        body: exchange.body,
        data,
        attempts: exchange.attempts,
        request_id: request_id.to_string(),
    })
}

/// Builder for [`XdrClient`].
#[derive(Debug, Default)]
pub struct XdrClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
}

impl XdrClientBuilder {
    /// Set the client configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom transport instead of the network transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is missing or invalid, or the
    /// network transport cannot be created
    pub fn build(self) -> Result<XdrClient> {
        let config = self
            .config
            .ok_or_else(|| XdrError::Initialization("client configuration not set".to_string()))?;
        config.validate()?;

        let user_agent =
            config.user_agent.clone().unwrap_or_else(|| BuildInfo::current().user_agent());

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::builder()
                    .timeout(config.timeout())
                    .user_agent(user_agent.clone())
                    .build()?,
            ),
        };

        Ok(XdrClient {
            backoff: ExponentialBackoff::new(config.retry_max_delay()),
            config,
            transport,
            user_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;
    use xdr_domain::{ErrorKind, HttpMethod, KeyType};

    use super::*;
    use crate::http::replay::{ReplayStep, ReplayTransport};
    use crate::http::transport::HttpResponse;

    /// Cancels the caller's token while answering the first send with 503.
    #[derive(Debug)]
    struct CancellingTransport {
        token: CancellationToken,
        sends: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CancellingTransport {
        async fn send(&self, _request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.token.cancel();
            Ok(HttpResponse::new(503, Vec::new()))
        }

        fn skip_backoff(&self) -> bool {
            true
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Status {
        status: String,
    }

    fn config(max_retries: u32) -> ClientConfig {
        ClientConfig::builder()
            .api_url("https://server.com/api/")
            .api_key("test-key")
            .api_key_id(7)
            .max_retries(max_retries)
            .build_unchecked()
    }

    fn client_with(
        config: ClientConfig,
        steps: Vec<ReplayStep>,
    ) -> (XdrClient, Arc<ReplayTransport>) {
        let transport = Arc::new(ReplayTransport::new(steps));
        let client =
            XdrClient::builder().config(config).transport(transport.clone()).build().unwrap();
        (client, transport)
    }

    fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
        request.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn retries_retryable_status_then_succeeds() {
        let (client, transport) = client_with(
            config(1),
            vec![ReplayStep::status(503), ReplayStep::json(200, &json!({"status": "ok"}))],
        );

        let response: ApiResponse<Status> = client
            .get(&RequestContext::new(), &RequestSpec::get("v1/health"))
            .await
            .unwrap();

        assert_eq!(response.data, Some(Status { status: "ok".into() }));
        assert_eq!(response.attempts, 2);
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn succeeds_after_up_to_max_retries_failures() {
        let max_retries = 4;
        for failures in 0..=max_retries {
            let mut steps: Vec<ReplayStep> = [401u16, 429, 502, 503, 504]
                .iter()
                .cycle()
                .take(failures as usize)
                .map(|status| ReplayStep::status(*status))
                .collect();
            steps.push(ReplayStep::json(200, &json!({"status": "ok"})));
            let (client, transport) = client_with(config(max_retries), steps);

            let response: ApiResponse<Status> = client
                .get(&RequestContext::new(), &RequestSpec::get("v1/health"))
                .await
                .unwrap();

            assert_eq!(response.attempts, failures + 1);
            assert_eq!(transport.attempts(), (failures + 1) as usize);
        }
    }

    #[tokio::test]
    async fn exhausts_attempts_on_retryable_status() {
        let body = json!({"reply": {"err_code": 503, "err_msg": "unavailable"}});
        let (client, transport) = client_with(config(2), vec![ReplayStep::json(503, &body)]);

        let err = client
            .get::<Value>(&RequestContext::new(), &RequestSpec::get("v1/health"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.raw_body(), Some(body.to_string().as_bytes()));
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn non_retryable_status_fails_after_one_attempt() {
        let body = json!({"reply": {"err_code": 404, "err_msg": "not found"}});
        let (client, transport) =
            client_with(config(3), vec![ReplayStep::json(404, &body), ReplayStep::status(200)]);

        let err = client
            .get::<Value>(&RequestContext::new(), &RequestSpec::get("v1/items").segment("9"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.api_error().unwrap().message(), Some("not found"));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn undecodable_error_body_falls_back() {
        let (client, transport) =
            client_with(config(0), vec![ReplayStep::body(500, "Internal Server Error")]);

        let err = client
            .get::<Value>(&RequestContext::new(), &RequestSpec::get("v1/items"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ApiResponseParse);
        assert_eq!(err.raw_body(), Some(&b"Internal Server Error"[..]));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn cancelled_context_never_sends() {
        let (client, transport) = client_with(config(3), vec![ReplayStep::status(200)]);
        let ctx = RequestContext::new();
        ctx.cancel();

        let err = client.get::<Value>(&ctx, &RequestSpec::get("v1/items")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn cancellation_is_checked_before_every_attempt() {
        let ctx = RequestContext::new();
        let transport = Arc::new(CancellingTransport {
            token: ctx.cancellation_token().clone(),
            sends: AtomicUsize::new(0),
        });
        let client =
            XdrClient::builder().config(config(3)).transport(transport.clone()).build().unwrap();

        let err = client.get::<Value>(&ctx, &RequestSpec::get("v1/items")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(transport.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn execute_wraps_input_and_decodes_output() {
        let (client, transport) = client_with(
            config(0),
            vec![ReplayStep::json(200, &json!({"reply": {"status": "created"}}))],
        );
        let spec = RequestSpec::post("v1/items")
            .wrap_request(["request_data"])
            .unwrap_response(["reply"]);

        let response = client
            .execute::<_, Status>(&RequestContext::new(), &spec, Some(&json!({"name": "alpha"})))
            .await
            .unwrap();

        assert_eq!(response.data, Some(Status { status: "created".into() }));
        assert_eq!(response.attempts, 1);

        let requests = transport.requests();
        let body: Value = serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"request_data": {"name": "alpha"}}));
        assert_eq!(header(&requests[0], "content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn network_errors_exhaust_into_network_failure() {
        let (client, transport) =
            client_with(config(2), vec![ReplayStep::SendError("connection reset".into())]);

        let err = client
            .get::<Value>(&RequestContext::new(), &RequestSpec::get("v1/items"))
            .await
            .unwrap_err();

        match err {
            XdrError::Network { attempts, source } => {
                assert_eq!(attempts, 3);
                assert_eq!(source.to_string(), "connection reset");
            }
            other => panic!("expected network error, got {other:?}"),
        }
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn network_error_then_success() {
        let (client, transport) = client_with(
            config(1),
            vec![
                ReplayStep::SendError("connection reset".into()),
                ReplayStep::json(200, &json!({"status": "ok"})),
            ],
        );

        let response: ApiResponse<Status> =
            client.get(&RequestContext::new(), &RequestSpec::get("v1/health")).await.unwrap();

        assert_eq!(response.attempts, 2);
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn body_read_failure_is_terminal() {
        let (client, transport) = client_with(
            config(3),
            vec![ReplayStep::BodyError("truncated".into()), ReplayStep::status(200)],
        );

        let err = client
            .get::<Value>(&RequestContext::new(), &RequestSpec::get("v1/items"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BodyRead);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn request_id_is_stable_and_signature_is_fresh_per_attempt() {
        let config = ClientConfig { key_type: KeyType::from("advanced"), ..config(2) };
        let (client, transport) = client_with(
            config,
            vec![ReplayStep::status(429), ReplayStep::status(502), ReplayStep::status(204)],
        );

        let response = client
            .execute_raw::<()>(&RequestContext::new(), &RequestSpec::get("v1/items"), None)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);

        let ids: Vec<_> = requests.iter().map(|r| header(r, "x-request-id")).collect();
        assert!(ids.iter().all(|id| *id == Some(response.request_id.as_str())));

        let nonces: Vec<_> = requests.iter().map(|r| header(r, "x-xdr-nonce").unwrap()).collect();
        assert_ne!(nonces[0], nonces[1]);
        assert_ne!(nonces[1], nonces[2]);
        for request in &requests {
            assert_eq!(header(request, "x-xdr-auth-id"), Some("7"));
            assert!(header(request, "content-type").is_none());
        }
    }

    #[tokio::test]
    async fn context_request_id_is_propagated() {
        let (client, transport) = client_with(config(0), vec![ReplayStep::status(204)]);
        let ctx = RequestContext::new().with_request_id("req_from_caller");

        let response =
            client.execute_raw::<()>(&ctx, &RequestSpec::get("v1/items"), None).await.unwrap();

        assert_eq!(response.request_id, "req_from_caller");
        assert_eq!(header(&transport.requests()[0], "x-request-id"), Some("req_from_caller"));
    }

    #[tokio::test]
    async fn request_envelope_and_url_are_built_once() {
        let (client, transport) = client_with(
            config(1),
            vec![
                ReplayStep::status(503),
                ReplayStep::json(200, &json!({"reply": {"total_count": 1}})),
            ],
        );
        let spec = RequestSpec::post("/public_api/v1/incidents/get_incidents/")
            .query("limit", "1")
            .wrap_request(["request_data"])
            .unwrap_response(["reply"]);

        let response: ApiResponse<Value> = client
            .post(&RequestContext::new(), &spec, &json!({"filters": []}))
            .await
            .unwrap();

        assert_eq!(response.data, Some(json!({"total_count": 1})));
        for request in transport.requests() {
            assert_eq!(request.method, HttpMethod::Post);
            assert_eq!(
                request.url,
                "https://server.com/api/public_api/v1/incidents/get_incidents?limit=1"
            );
            let body: Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
            assert_eq!(body, json!({"request_data": {"filters": []}}));
            assert_eq!(header(&request, "content-type"), Some("application/json"));
            assert_eq!(header(&request, "authorization"), Some("test-key"));
        }
    }

    #[tokio::test]
    async fn missing_response_wrapper_key() {
        let (client, _) =
            client_with(config(0), vec![ReplayStep::json(200, &json!({"data": []}))]);
        let spec = RequestSpec::get("v1/items").unwrap_response(["reply"]);

        let err = client.get::<Value>(&RequestContext::new(), &spec).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::WrapperKeyNotFound);
    }

    #[tokio::test]
    async fn success_with_mismatched_body_is_deserialization_failure() {
        let (client, _) =
            client_with(config(0), vec![ReplayStep::json(200, &json!({"status": 5}))]);

        let err = client
            .get::<Status>(&RequestContext::new(), &RequestSpec::get("v1/health"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Deserialization);
    }

    #[tokio::test]
    async fn empty_body_skips_decoding() {
        let (client, _) = client_with(config(0), vec![ReplayStep::status(200)]);

        let response: ApiResponse<Status> =
            client.get(&RequestContext::new(), &RequestSpec::get("v1/health")).await.unwrap();

        assert_eq!(response.status, 200);
        assert!(response.data.is_none());
    }

    #[tokio::test]
    async fn invalid_base_url_fails_before_sending() {
        let config = ClientConfig { api_url: "::not-a-url".into(), ..config(3) };
        let (client, transport) = client_with(config, vec![ReplayStep::status(200)]);

        let err = client
            .get::<Value>(&RequestContext::new(), &RequestSpec::get("v1/items"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UrlConstruction);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn serialization_failure_fails_before_sending() {
        use std::collections::HashMap;

        let (client, transport) = client_with(config(3), vec![ReplayStep::status(200)]);
        let mut input = HashMap::new();
        input.insert((1, 2), "tuple keys are not JSON object keys");

        let err = client
            .post::<_, Value>(&RequestContext::new(), &RequestSpec::post("v1/items"), &input)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert_eq!(transport.attempts(), 0);
    }

    #[test]
    fn build_requires_config() {
        let err = XdrClient::builder().build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
    }

    #[test]
    fn build_validates_config() {
        let err = XdrClient::builder().config(ClientConfig::default()).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn configured_user_agent_wins() {
        let config = ClientConfig { user_agent: Some("my-agent/1.0".into()), ..config(0) };
        let (client, _) = client_with(config, vec![]);
        assert_eq!(client.user_agent(), "my-agent/1.0");

        let (default_client, _) = client_with(self::config(0), vec![]);
        assert!(default_client.user_agent().starts_with("xdr-sdk-rust/"));
    }
}
