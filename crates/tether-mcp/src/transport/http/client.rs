//! Streamable HTTP Transport
//!
//! Client side of the MCP streamable HTTP transport (2025-03-26), with the
//! legacy 2024-11-05 HTTP+SSE flow behind the same surface. Outbound
//! messages are HTTP POSTs against the endpoint; inbound messages arrive
//! either as POST response bodies (JSON or per-request SSE) or on the
//! long-lived GET event stream, and all of them surface as
//! [`TransportEvent`]s on one channel.
//!
//! # Architecture
//!
//! ```text
//! caller -> send(bytes) -> POST (retry/backoff) -> response body ----+
//!                                                                    v
//! GET /endpoint (SSE, auto-reconnect, Last-Event-ID) --> parser -> events -> session
//! ```
//!
//! The transport holds no session pointer. Session affinity is a header
//! (`Mcp-Session-Id`) captured from responses and echoed on every
//! subsequent request; in the legacy flow the POST target and session id
//! instead come from the stream's `endpoint` event.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::{debug, trace, warn};
use url::Url;

// Layer 3: Internal module imports
use crate::protocol::constants::{defaults, headers};
use crate::protocol::codec;
use crate::transport::error::{TransportError, TransportResult};
use crate::transport::http::auth::{compose_headers, Authenticator};
use crate::transport::http::config::HttpConfig;
use crate::transport::http::sse::{resolve_endpoint, SseParser};
use crate::transport::TransportEvent;

/// HTTP statuses that are worth retrying
const RETRIABLE_STATUSES: &[u16] = &[408, 429, 500, 502, 503, 504, 507, 509];

/// Compute the backoff delay for a retry attempt (0-based)
///
/// Starts at `base` and doubles each attempt, with +/-10% jitter.
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponential = base.as_secs_f64() * 2f64.powi(attempt as i32);
    let jitter = 1.0 + (fastrand::f64() - 0.5) * 0.2;
    Duration::from_secs_f64((exponential * jitter).max(0.0))
}

/// Whether a status code is in the retriable set
pub(crate) fn is_retriable_status(status: StatusCode) -> bool {
    RETRIABLE_STATUSES.contains(&status.as_u16())
}

/// Extract a session id from a legacy endpoint URL
///
/// In the 2024-11-05 flow the session id rides in the endpoint URL query
/// rather than in a header.
pub(crate) fn session_id_from_endpoint(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "session_id" || key == "sessionId")
        .map(|(_, value)| value.into_owned())
}

/// State shared between the transport handle and its background tasks
struct HttpShared {
    connected: AtomicBool,
    posts_sent: AtomicU64,
    retries: AtomicU64,
    sse_reconnects: AtomicU64,
    events_received: AtomicU64,
    /// POST target; replaced by the legacy `endpoint` event
    post_url: RwLock<Url>,
    /// Session header value captured from responses
    session_id: RwLock<Option<String>>,
    /// Resumption cursor for the SSE stream
    last_event_id: RwLock<Option<String>>,
    events_tx: mpsc::Sender<TransportEvent>,
    endpoint_tx: watch::Sender<bool>,
}

/// Point-in-time statistics for an HTTP transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStats {
    /// POSTs that reached the wire (including retries)
    pub posts_sent: u64,
    /// Retry attempts performed
    pub retries: u64,
    /// SSE reconnections performed
    pub sse_reconnects: u64,
    /// SSE events received
    pub events_received: u64,
}

/// Streamable HTTP transport handle
///
/// Created with [`HttpTransport::connect`]; no network traffic happens
/// until the first `send` or `start_sse` call.
pub struct HttpTransport {
    config: HttpConfig,
    client: reqwest::Client,
    shared: Arc<HttpShared>,
    authenticator: Option<Arc<dyn Authenticator>>,
    events_rx: Option<mpsc::Receiver<TransportEvent>>,
    sse_task: Mutex<Option<JoinHandle<()>>>,
    endpoint_rx: watch::Receiver<bool>,
    last_post: Mutex<Option<Instant>>,
}

impl HttpTransport {
    /// Build a transport for the given configuration
    ///
    /// # Errors
    ///
    /// Fails with `InvalidConfig` for a bad configuration or an HTTP
    /// client that cannot be constructed.
    pub fn connect(
        config: HttpConfig,
        authenticator: Option<Arc<dyn Authenticator>>,
    ) -> TransportResult<Self> {
        config.validate()?;

        let client = build_client(&config)?;
        let (events_tx, events_rx) = mpsc::channel::<TransportEvent>(256);
        let (endpoint_tx, endpoint_rx) = watch::channel(false);

        let shared = Arc::new(HttpShared {
            connected: AtomicBool::new(true),
            posts_sent: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            sse_reconnects: AtomicU64::new(0),
            events_received: AtomicU64::new(0),
            post_url: RwLock::new(config.base_url.clone()),
            session_id: RwLock::new(None),
            last_event_id: RwLock::new(None),
            events_tx,
            endpoint_tx,
        });

        Ok(Self {
            config,
            client,
            shared,
            authenticator,
            events_rx: Some(events_rx),
            sse_task: Mutex::new(None),
            endpoint_rx,
            last_post: Mutex::new(None),
        })
    }

    /// Queue one encoded message for delivery as an HTTP POST
    ///
    /// Retries transient failures with exponential backoff. The response
    /// body (JSON or per-request SSE) surfaces on the event channel; this
    /// method resolves once the POST has been accepted.
    pub async fn send(&self, bytes: Bytes) -> TransportResult<()> {
        if !self.is_connected() {
            return Err(TransportError::Closed);
        }
        if bytes.len() > defaults::MAX_REQUEST_SIZE {
            return Err(TransportError::message_too_large(
                bytes.len(),
                defaults::MAX_REQUEST_SIZE,
            ));
        }

        self.rate_limit().await;

        let accept = if self.config.json_response_mode {
            "application/json"
        } else {
            "text/event-stream, application/json"
        };

        let mut attempt: u32 = 0;
        loop {
            match self.post_once(&bytes, accept).await {
                Ok(response) => return self.handle_response(response).await,
                Err(failure) if failure.retriable => {
                    if attempt >= self.config.max_retries {
                        return Err(TransportError::RetriesExhausted {
                            attempts: attempt + 1,
                            last_error: failure.error.to_string(),
                        });
                    }
                    let delay = backoff_delay(self.config.retry_delay, attempt);
                    debug!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure.error,
                        "retrying POST after transient failure"
                    );
                    self.shared.retries.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    /// Start the long-lived GET event stream
    ///
    /// While the transport stays connected the stream reconnects
    /// automatically, presenting `Last-Event-ID` so the server can replay
    /// missed events. Calling it twice is a no-op.
    pub async fn start_sse(&self) {
        let mut sse_task = self.sse_task.lock().await;
        if sse_task.is_some() {
            return;
        }

        let client = self.client.clone();
        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);
        let authenticator = self.authenticator.clone();

        *sse_task = Some(tokio::spawn(async move {
            sse_listener_loop(client, config, shared, authenticator).await;
        }));
    }

    /// Wait until the legacy `endpoint` event has resolved the POST target
    pub async fn wait_for_endpoint(&self, wait: Duration) -> TransportResult<()> {
        let mut endpoint_rx = self.endpoint_rx.clone();
        timeout(wait, async {
            loop {
                if *endpoint_rx.borrow() {
                    return;
                }
                if endpoint_rx.changed().await.is_err() {
                    return;
                }
            }
        })
        .await
        .map_err(|_| TransportError::io_timeout("endpoint discovery", wait))?;

        if *self.endpoint_rx.borrow() {
            Ok(())
        } else {
            Err(TransportError::Closed)
        }
    }

    /// Take the inbound event channel (once)
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TransportEvent>> {
        self.events_rx.take()
    }

    /// The server-assigned session id, when one has been captured
    pub async fn session_id(&self) -> Option<String> {
        self.shared.session_id.read().await.clone()
    }

    /// The resumption cursor from the SSE stream
    pub async fn last_event_id(&self) -> Option<String> {
        self.shared.last_event_id.read().await.clone()
    }

    /// The current POST target (base URL, or the legacy endpoint)
    pub async fn post_url(&self) -> Url {
        self.shared.post_url.read().await.clone()
    }

    /// Whether the transport is still open
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Current transport statistics
    pub fn stats(&self) -> HttpStats {
        HttpStats {
            posts_sent: self.shared.posts_sent.load(Ordering::Relaxed),
            retries: self.shared.retries.load(Ordering::Relaxed),
            sse_reconnects: self.shared.sse_reconnects.load(Ordering::Relaxed),
            events_received: self.shared.events_received.load(Ordering::Relaxed),
        }
    }

    /// Close the transport
    ///
    /// Sends the session DELETE when configured, stops the SSE stream, and
    /// emits a final `Closed` event. Idempotent.
    pub async fn close(&self) -> TransportResult<()> {
        if !self.shared.connected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        if let Some(task) = self.sse_task.lock().await.take() {
            task.abort();
        }

        if self.config.terminate_on_close {
            if let Some(session_id) = self.session_id().await {
                let url = self.post_url().await;
                let request = self
                    .client
                    .delete(url)
                    .header(headers::MCP_SESSION_ID, &session_id);
                // Best effort; the server may already be gone.
                if let Err(e) = timeout(Duration::from_secs(5), request.send()).await {
                    debug!(error = %e, "session DELETE timed out");
                }
            }
        }

        let _ = self.shared.events_tx.send(TransportEvent::Closed).await;
        debug!("http transport closed");
        Ok(())
    }

    /// Enforce the minimum interval between outbound POSTs
    async fn rate_limit(&self) {
        let mut last_post = self.last_post.lock().await;
        if let Some(previous) = *last_post {
            let elapsed = previous.elapsed();
            if elapsed < self.config.min_request_interval {
                tokio::time::sleep(self.config.min_request_interval - elapsed).await;
            }
        }
        *last_post = Some(Instant::now());
    }

    /// Issue a single POST attempt and classify the outcome
    async fn post_once(&self, bytes: &Bytes, accept: &str) -> Result<reqwest::Response, PostFailure> {
        let url = self.post_url().await;
        let session_id = self.session_id().await;

        let composed = compose_headers(
            &self.config,
            accept,
            session_id.as_deref(),
            self.authenticator.as_deref(),
        )
        .await
        .map_err(PostFailure::fatal)?;

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.config.timeout)
            .body(bytes.clone());
        for (name, value) in composed {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_redirect() {
                // Redirect policy violations (scheme, hop limit) are final.
                PostFailure::fatal(TransportError::connection(format!("redirect rejected: {e}")))
            } else {
                PostFailure::retriable(TransportError::connection(format!("POST failed: {e}")))
            }
        })?;

        self.shared.posts_sent.fetch_add(1, Ordering::Relaxed);

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PostFailure::fatal(TransportError::Auth {
                status: status.as_u16(),
            }));
        }
        if is_retriable_status(status) {
            return Err(PostFailure::retriable(TransportError::HttpStatus {
                status: status.as_u16(),
            }));
        }
        Err(PostFailure::fatal(TransportError::HttpStatus {
            status: status.as_u16(),
        }))
    }

    /// Route a successful POST response into the event channel
    async fn handle_response(&self, response: reqwest::Response) -> TransportResult<()> {
        capture_session_id(&self.shared, &response).await;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("text/event-stream") {
            // Per-request SSE stream: drain it in the background so the
            // caller is not pinned to this response's lifetime.
            let shared = Arc::clone(&self.shared);
            let config = self.config.clone();
            tokio::spawn(async move {
                if let Err(e) = read_sse_response(response, &shared, &config).await {
                    debug!(error = %e, "POST response stream ended with error");
                }
            });
            return Ok(());
        }

        let body = read_bounded_body(response).await?;
        if body.is_empty() {
            // 202 Accepted for notifications.
            return Ok(());
        }

        match codec::decode(&body) {
            Ok(message) => {
                let _ = self
                    .shared
                    .events_tx
                    .send(TransportEvent::Message(message))
                    .await;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    preview = %String::from_utf8_lossy(&body[..body.len().min(120)]),
                    "dropping undecodable POST response body"
                );
                let _ = self.shared.events_tx.send(TransportEvent::Invalid(e)).await;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.config.base_url.as_str())
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// A classified POST failure
struct PostFailure {
    error: TransportError,
    retriable: bool,
}

impl PostFailure {
    fn retriable(error: TransportError) -> Self {
        Self {
            error,
            retriable: true,
        }
    }

    fn fatal(error: TransportError) -> Self {
        Self {
            error,
            retriable: false,
        }
    }
}

fn build_client(config: &HttpConfig) -> TransportResult<reqwest::Client> {
    let redirects = if config.follow_redirects {
        let max_redirects = config.max_redirects as usize;
        let force_https = config.force_https;
        reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                return attempt.error("too many redirects");
            }
            match attempt.url().scheme() {
                "https" => attempt.follow(),
                "http" if !force_https => attempt.follow(),
                "http" => attempt.error("redirect to insecure scheme rejected"),
                _ => attempt.error("redirect to non-HTTP scheme rejected"),
            }
        })
    } else {
        reqwest::redirect::Policy::none()
    };

    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .min_tls_version(config.min_tls_version.as_reqwest())
        .redirect(redirects);

    // The rustls backend has no hostname-only override: hostname checks
    // are part of certificate validation, so either switch downgrades to
    // accepting any certificate. That is broader than a hostname-only
    // skip; warn when verify_hostname alone asked for the downgrade.
    if !config.validate_ssl || !config.verify_hostname {
        if config.validate_ssl && !config.verify_hostname {
            warn!(
                "verify_hostname=false disables full certificate validation \
                 with the rustls backend, not just hostname checks"
            );
        }
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| TransportError::invalid_config(format!("failed to build HTTP client: {e}")))
}

/// Record the session header from a response if the server provided one
async fn capture_session_id(shared: &HttpShared, response: &reqwest::Response) {
    if let Some(value) = response.headers().get(headers::MCP_SESSION_ID) {
        if let Ok(session_id) = value.to_str() {
            let mut guard = shared.session_id.write().await;
            if guard.as_deref() != Some(session_id) {
                debug!(session_id = %session_id, "captured session header");
                *guard = Some(session_id.to_string());
            }
        }
    }
}

/// Read a response body with the hard size cap applied
async fn read_bounded_body(mut response: reqwest::Response) -> TransportResult<Vec<u8>> {
    if let Some(length) = response.content_length() {
        if length as usize > defaults::MAX_RESPONSE_SIZE {
            return Err(TransportError::message_too_large(
                length as usize,
                defaults::MAX_RESPONSE_SIZE,
            ));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| TransportError::connection(format!("failed to read response body: {e}")))?
    {
        body.extend_from_slice(&chunk);
        if body.len() > defaults::MAX_RESPONSE_SIZE {
            return Err(TransportError::message_too_large(
                body.len(),
                defaults::MAX_RESPONSE_SIZE,
            ));
        }
    }
    Ok(body)
}

/// Drain one SSE response body into the event channel
async fn read_sse_response(
    mut response: reqwest::Response,
    shared: &HttpShared,
    config: &HttpConfig,
) -> TransportResult<()> {
    let mut parser = SseParser::new();

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| TransportError::connection(format!("SSE stream read error: {e}")))?
    {
        for event in parser.feed(&chunk) {
            dispatch_sse_event(event, shared, config).await;
        }
    }
    Ok(())
}

/// Route one parsed SSE event
async fn dispatch_sse_event(
    event: crate::transport::http::sse::SseEvent,
    shared: &HttpShared,
    config: &HttpConfig,
) {
    shared.events_received.fetch_add(1, Ordering::Relaxed);

    if let Some(id) = &event.id {
        *shared.last_event_id.write().await = Some(id.clone());
    }

    if event.is_endpoint() {
        // Legacy 2024-11-05: the event data names the POST target, either
        // as a bare URI string or as {"uri": "..."}.
        let uri = serde_json::from_str::<serde_json::Value>(&event.data)
            .ok()
            .and_then(|value| {
                value
                    .get("uri")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| event.data.trim().to_string());

        match resolve_endpoint(&config.base_url, &uri) {
            Ok(resolved) => {
                if config.check_scheme(&resolved).is_err() {
                    warn!(url = %resolved, "endpoint event resolved to insecure URL, ignoring");
                    return;
                }
                debug!(url = %resolved, "legacy endpoint resolved");
                if let Some(session_id) = session_id_from_endpoint(&resolved) {
                    *shared.session_id.write().await = Some(session_id);
                }
                *shared.post_url.write().await = resolved;
                let _ = shared.endpoint_tx.send(true);
            }
            Err(e) => warn!(error = %e, uri = %uri, "ignoring unresolvable endpoint event"),
        }
        return;
    }

    match codec::decode(event.data.as_bytes()) {
        Ok(message) => {
            trace!(method = ?message.method(), "SSE message event");
            let _ = shared.events_tx.send(TransportEvent::Message(message)).await;
        }
        Err(e) => {
            warn!(
                error = %e,
                preview = %&event.data[..event.data.len().min(120)],
                "dropping undecodable SSE event"
            );
            let _ = shared.events_tx.send(TransportEvent::Invalid(e)).await;
        }
    }
}

/// Long-lived GET listener with automatic resumption
async fn sse_listener_loop(
    client: reqwest::Client,
    config: HttpConfig,
    shared: Arc<HttpShared>,
    authenticator: Option<Arc<dyn Authenticator>>,
) {
    let mut reconnect_delay = config.retry_delay;
    let mut first_connect = true;

    loop {
        if !shared.connected.load(Ordering::Acquire) {
            return;
        }

        let composed = match compose_headers(
            &config,
            "text/event-stream",
            shared.session_id.read().await.as_deref(),
            authenticator.as_deref(),
        )
        .await
        {
            Ok(composed) => composed,
            Err(e) => {
                let _ = shared.events_tx.send(TransportEvent::Error(e)).await;
                return;
            }
        };

        let mut request = client
            .get(config.base_url.clone())
            .header("Cache-Control", "no-cache");
        for (name, value) in composed {
            request = request.header(name, value);
        }
        if let Some(last_event_id) = shared.last_event_id.read().await.as_deref() {
            request = request.header(headers::LAST_EVENT_ID, last_event_id);
        }

        let response = match timeout(config.sse_timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                debug!(error = %e, "SSE connection failed");
                sleep_before_reconnect(&shared, &mut reconnect_delay, &config).await;
                continue;
            }
            Err(_) => {
                debug!("SSE connection timed out");
                sleep_before_reconnect(&shared, &mut reconnect_delay, &config).await;
                continue;
            }
        };

        let status = response.status();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            // The server does not offer a GET stream; not an error.
            debug!("server does not support the GET event stream");
            return;
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let _ = shared
                .events_tx
                .send(TransportEvent::Error(TransportError::Auth {
                    status: status.as_u16(),
                }))
                .await;
            return;
        }
        if !status.is_success() {
            debug!(status = %status, "SSE stream rejected");
            sleep_before_reconnect(&shared, &mut reconnect_delay, &config).await;
            continue;
        }

        if !first_connect {
            shared.sse_reconnects.fetch_add(1, Ordering::Relaxed);
        }
        first_connect = false;
        reconnect_delay = config.retry_delay;
        debug!("SSE stream established");

        let mut response = response;
        let mut parser = SseParser::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    for event in parser.feed(&chunk) {
                        if let Some(retry) = event.retry {
                            reconnect_delay = Duration::from_millis(retry);
                        }
                        dispatch_sse_event(event, &shared, &config).await;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "SSE stream dropped");
                    break;
                }
            }
        }

        if !config.session_resumable {
            let _ = shared.events_tx.send(TransportEvent::Closed).await;
            return;
        }
        sleep_before_reconnect(&shared, &mut reconnect_delay, &config).await;
    }
}

async fn sleep_before_reconnect(
    shared: &HttpShared,
    reconnect_delay: &mut Duration,
    config: &HttpConfig,
) {
    if !shared.connected.load(Ordering::Acquire) {
        return;
    }
    tokio::time::sleep(*reconnect_delay).await;
    // Cap exponential growth at 16x the configured delay.
    *reconnect_delay = (*reconnect_delay * 2).min(config.retry_delay * 16);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_sequence_doubles_with_bounded_jitter() {
        let base = Duration::from_secs(1);
        for (attempt, expected) in [(0u32, 1.0f64), (1, 2.0), (2, 4.0)] {
            for _ in 0..50 {
                let delay = backoff_delay(base, attempt).as_secs_f64();
                assert!(
                    delay >= expected * 0.9 - 1e-9 && delay <= expected * 1.1 + 1e-9,
                    "attempt {attempt}: delay {delay} outside [{:.2}, {:.2}]",
                    expected * 0.9,
                    expected * 1.1
                );
            }
        }
    }

    #[test]
    fn retriable_status_set_matches_policy() {
        for status in [408u16, 429, 500, 502, 503, 504, 507, 509] {
            assert!(is_retriable_status(StatusCode::from_u16(status).unwrap()));
        }
        for status in [400u16, 401, 403, 404, 410] {
            assert!(!is_retriable_status(StatusCode::from_u16(status).unwrap()));
        }
    }

    #[test]
    fn session_id_extraction_from_endpoint_url() {
        let url = Url::parse("https://srv/mcp/post?session_id=abc-123").unwrap();
        assert_eq!(session_id_from_endpoint(&url).as_deref(), Some("abc-123"));

        let url = Url::parse("https://srv/mcp/post?sessionId=xyz").unwrap();
        assert_eq!(session_id_from_endpoint(&url).as_deref(), Some("xyz"));

        let url = Url::parse("https://srv/mcp/post").unwrap();
        assert_eq!(session_id_from_endpoint(&url), None);
    }

    #[test]
    fn connect_validates_configuration() {
        let mut config = HttpConfig::new("http://example.com/mcp").unwrap();
        config.force_https = true;
        assert!(HttpTransport::connect(config, None).is_err());
    }

    #[tokio::test]
    async fn send_rejects_oversized_bodies() {
        let config = HttpConfig::new("https://example.invalid/mcp").unwrap();
        let transport = HttpTransport::connect(config, None).unwrap();

        let oversized = Bytes::from(vec![b'x'; defaults::MAX_REQUEST_SIZE + 1]);
        let err = transport.send(oversized).await.unwrap_err();
        assert!(matches!(err, TransportError::MessageTooLarge { .. }));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_marks_disconnected() {
        let config = HttpConfig::new("https://example.invalid/mcp").unwrap();
        let mut transport = HttpTransport::connect(config, None).unwrap();

        transport.close().await.unwrap();
        transport.close().await.unwrap();
        assert!(!transport.is_connected());

        let err = transport.send(Bytes::from_static(b"{}")).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
