//! MCP Session
//!
//! The typed facade over codec + transport + protocol state machine. A
//! session owns exactly one transport, drives the initialize handshake,
//! correlates requests with responses by id, delivers server-initiated
//! traffic to host callbacks, and guarantees that every pending request
//! is signalled exactly once - response, server error, cancellation, or
//! timeout - before the session leaves its ready state.
//!
//! # Lifecycle
//!
//! ```text
//! New -> Initializing -> Ready -> Closing -> Closed
//!            \______________\________________-> Error (terminal)
//! ```
//!
//! States never move backward. `Error` is terminal for fatal transport
//! failures not recoverable by retry.
//!
//! # Concurrency
//!
//! N caller tasks may issue requests concurrently; a reader task consumes
//! the transport's event channel and completes waiters; notifications are
//! decoupled from the read path through a bounded queue drained by a
//! dispatch task (overflow drops notifications, never responses). No
//! public operation holds a lock across an await of the transport.

// Layer 1: Standard library imports
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tokio::time::timeout;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use crate::error::{McpError, McpResult};
use crate::protocol::constants::{defaults, error_codes, methods};
use crate::protocol::{
    codec, CallToolRequest, CallToolResponse, CancelledParams, ClientCapabilities, ClientInfo,
    GetPromptRequest, GetPromptResponse, InitializeRequest, InitializeResponse, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ListPromptsRequest, ListPromptsResponse,
    ListResourceTemplatesRequest, ListResourceTemplatesResponse, ListResourcesRequest,
    ListResourcesResponse, ListToolsRequest, ListToolsResponse, ProtocolVersion,
    ReadResourceRequest, ReadResourceResponse, RequestId, ServerCapabilities, ServerInfo,
    SubscribeResourceRequest,
};
use crate::session::pending::{PendingRequests, RequestIdGenerator};
use crate::transport::{Transport, TransportError, TransportEvent, VersionPreference};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no traffic yet
    New,
    /// Initialize request in flight
    Initializing,
    /// Handshake complete, operations allowed
    Ready,
    /// Close requested, teardown in progress
    Closing,
    /// Transport torn down
    Closed,
    /// Fatal failure; terminal
    Error,
}

impl SessionState {
    fn rank(self) -> u8 {
        match self {
            SessionState::New => 0,
            SessionState::Initializing => 1,
            SessionState::Ready => 2,
            SessionState::Closing => 3,
            SessionState::Closed => 4,
            SessionState::Error => 5,
        }
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::New => "new",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
            SessionState::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// Callback slot for server-initiated notifications
///
/// Invoked from the dispatch task in arrival order, one at a time, after
/// the session reaches `Ready` and never after `close()`.
pub type NotificationCallback = Arc<dyn Fn(JsonRpcNotification) + Send + Sync>;

/// Callback slot for server-initiated requests (`sampling/createMessage`,
/// `roots/list`)
///
/// The returned value becomes the JSON-RPC response; an error becomes an
/// internal-error reply. Without a registered callback the session
/// answers method-not-found.
pub type ServerRequestCallback = Arc<dyn Fn(JsonRpcRequest) -> McpResult<Value> + Send + Sync>;

/// Configuration for session behavior
#[derive(Clone)]
pub struct SessionConfig {
    /// Client identity sent during initialization
    pub client_info: ClientInfo,
    /// Client capabilities to advertise
    pub capabilities: ClientCapabilities,
    /// Protocol revision preference (Auto enables the HTTP fallback path)
    pub protocol_version: VersionPreference,
    /// Default deadline for a single request (initialize uses twice this)
    pub response_timeout: Duration,
    /// Bound on the server-initiated notification queue
    pub notification_queue_capacity: usize,
    /// How long to wait for the legacy `endpoint` event
    pub endpoint_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_info: ClientInfo {
                name: defaults::CLIENT_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: ClientCapabilities::default(),
            protocol_version: VersionPreference::Auto,
            response_timeout: defaults::RESPONSE_TIMEOUT,
            notification_queue_capacity: defaults::NOTIFICATION_QUEUE_CAPACITY,
            endpoint_timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("client_info", &self.client_info)
            .field("protocol_version", &self.protocol_version)
            .field("response_timeout", &self.response_timeout)
            .finish()
    }
}

/// Point-in-time session statistics
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Stable local session id
    pub session_id: String,
    /// Current lifecycle state
    pub state: SessionState,
    /// Requests sent
    pub requests_sent: u64,
    /// Responses correlated to a waiter
    pub responses_received: u64,
    /// Notifications sent to the server
    pub notifications_sent: u64,
    /// Notifications received from the server
    pub notifications_received: u64,
    /// Notifications dropped on queue overflow
    pub notifications_dropped: u64,
    /// Protocol violations observed (duplicate/unknown ids, bad payloads)
    pub protocol_violations: u64,
    /// Requests currently awaiting completion
    pub pending_requests: usize,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SessionCounters {
    requests_sent: AtomicU64,
    responses_received: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_received: AtomicU64,
    notifications_dropped: AtomicU64,
    protocol_violations: AtomicU64,
}

struct SessionInner {
    local_id: String,
    config: SessionConfig,
    transport: Transport,
    id_generator: RequestIdGenerator,
    pending: PendingRequests,
    state: RwLock<SessionState>,
    negotiated_version: RwLock<Option<ProtocolVersion>>,
    server_info: RwLock<Option<ServerInfo>>,
    server_capabilities: RwLock<Option<ServerCapabilities>>,
    notification_callback: RwLock<Option<NotificationCallback>>,
    server_request_callback: RwLock<Option<ServerRequestCallback>>,
    notification_tx: mpsc::Sender<JsonRpcNotification>,
    counters: SessionCounters,
    created_at: DateTime<Utc>,
}

impl SessionInner {
    async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// Atomically move `New` to `Initializing`; false when already past it
    async fn begin_initializing(&self) -> bool {
        let mut state = self.state.write().await;
        if *state != SessionState::New {
            return false;
        }
        debug!(session_id = %self.local_id, from = %*state, to = %SessionState::Initializing, "session state");
        *state = SessionState::Initializing;
        true
    }

    /// Forward-only state transition; returns false when refused
    async fn advance_state(&self, to: SessionState) -> bool {
        let mut state = self.state.write().await;
        let from = *state;
        let allowed = if from.is_terminal() {
            false
        } else if to == SessionState::Error {
            true
        } else {
            to.rank() > from.rank()
        };
        if allowed {
            debug!(session_id = %self.local_id, from = %from, to = %to, "session state");
            *state = to;
        }
        allowed
    }

    /// Connection-scoped failure: every pending request is signalled and
    /// the session moves to its terminal error state
    async fn fail_connection(&self, reason: &str) {
        if !self.advance_state(SessionState::Error).await {
            return;
        }
        warn!(session_id = %self.local_id, reason = %reason, "session failed");
        let reason = reason.to_string();
        self.pending.drain_all(|_| {
            McpError::Transport(TransportError::connection(reason.clone()))
        });
    }

    /// Route one correlated response
    async fn handle_response(&self, response: JsonRpcResponse) {
        let Some(id) = response.id.clone() else {
            self.counters
                .protocol_violations
                .fetch_add(1, Ordering::Relaxed);
            warn!(session_id = %self.local_id, "dropping response with null id");
            return;
        };

        let outcome = match response.error {
            Some(error) => Err(McpError::Server(error)),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };

        match self.pending.complete(&id, outcome) {
            Some(_) => {
                self.counters
                    .responses_received
                    .fetch_add(1, Ordering::Relaxed);
            }
            None => {
                // Duplicate, late (cancelled or timed out), or never ours.
                self.counters
                    .protocol_violations
                    .fetch_add(1, Ordering::Relaxed);
                debug!(
                    session_id = %self.local_id,
                    request_id = %id,
                    "dropping response for unknown request id"
                );
            }
        }
    }

    /// Queue one inbound notification; overflow drops it, never a response
    fn handle_notification(&self, notification: JsonRpcNotification) {
        self.counters
            .notifications_received
            .fetch_add(1, Ordering::Relaxed);
        if let Err(mpsc::error::TrySendError::Full(dropped)) =
            self.notification_tx.try_send(notification)
        {
            self.counters
                .notifications_dropped
                .fetch_add(1, Ordering::Relaxed);
            warn!(
                session_id = %self.local_id,
                method = %dropped.method,
                "notification queue overflow, dropping"
            );
        }
    }

}

/// Answer a server-initiated request through the registered callback
fn handle_server_request(inner: &Arc<SessionInner>, request: JsonRpcRequest) {
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        let callback = inner.server_request_callback.read().await.clone();
        let id = request.id.clone();
        let method = request.method.clone();

        let bytes = match callback {
            Some(callback) => match callback(request) {
                Ok(result) => codec::encode_response(id, result),
                Err(e) => codec::encode_error(
                    Some(id),
                    error_codes::INTERNAL_ERROR,
                    &e.to_string(),
                    None,
                ),
            },
            None => codec::encode_error(
                Some(id),
                error_codes::METHOD_NOT_FOUND,
                &format!("no handler for {method}"),
                None,
            ),
        };

        match bytes {
            Ok(bytes) => {
                if let Err(e) = inner.transport.send(bytes).await {
                    debug!(
                        session_id = %inner.local_id,
                        error = %e,
                        "failed to answer server request"
                    );
                }
            }
            Err(e) => {
                warn!(session_id = %inner.local_id, error = %e, "failed to encode reply");
            }
        }
    });
}

/// Reply to an undecodable inbound payload with a parse error
///
/// The connection survives; the reply carries a null id because the
/// offending message could not be identified.
fn handle_invalid(inner: &Arc<SessionInner>, error: crate::protocol::ProtocolError) {
    inner
        .counters
        .protocol_violations
        .fetch_add(1, Ordering::Relaxed);

    use crate::protocol::ProtocolError;
    let code = match &error {
        ProtocolError::Parse { .. } | ProtocolError::Encoding { .. } => error_codes::PARSE_ERROR,
        _ => error_codes::INVALID_REQUEST,
    };

    if let Ok(bytes) = codec::encode_error(None, code, &error.to_string(), None) {
        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            let _ = inner.transport.send(bytes).await;
        });
    }
}

/// An MCP session over one transport
///
/// Cheap to share: clone the handle freely across tasks.
///
/// # Examples
///
/// ```rust,no_run
/// use tether_mcp::session::{Session, SessionConfig};
/// use tether_mcp::transport::{StdioConfig, Transport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Transport::stdio(StdioConfig::new(["my-mcp-server"])).await?;
/// let session = Session::connect(transport, SessionConfig::default())?;
///
/// session.initialize().await?;
/// let tools = session.list_tools(None).await?;
/// println!("{} tools", tools.tools.len());
///
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Wrap a connected transport in a session
    ///
    /// Spawns the reader and notification-dispatch tasks. No protocol
    /// traffic happens until [`Session::initialize`].
    pub fn connect(mut transport: Transport, config: SessionConfig) -> McpResult<Session> {
        let events = transport.take_events().ok_or_else(|| {
            McpError::internal("transport event channel was already taken")
        })?;

        let local_id = match &transport {
            Transport::Stdio(stdio) => stdio.session_id().to_string(),
            Transport::Http(_) => format!("http-{}", uuid::Uuid::new_v4()),
        };

        let (notification_tx, notification_rx) =
            mpsc::channel(config.notification_queue_capacity.max(1));

        let inner = Arc::new(SessionInner {
            local_id,
            config,
            transport,
            id_generator: RequestIdGenerator::new(),
            pending: PendingRequests::new(),
            state: RwLock::new(SessionState::New),
            negotiated_version: RwLock::new(None),
            server_info: RwLock::new(None),
            server_capabilities: RwLock::new(None),
            notification_callback: RwLock::new(None),
            server_request_callback: RwLock::new(None),
            notification_tx,
            counters: SessionCounters::default(),
            created_at: Utc::now(),
        });

        tokio::spawn(reader_loop(Arc::clone(&inner), events));
        tokio::spawn(dispatch_loop(Arc::clone(&inner), notification_rx));

        Ok(Session { inner })
    }

    /// Stable local session id
    ///
    /// For HTTP sessions the server-assigned id (when any) is available
    /// from [`Session::remote_session_id`] after initialization.
    pub fn id(&self) -> &str {
        &self.inner.local_id
    }

    /// The server-assigned session id, when the transport carries one
    pub async fn remote_session_id(&self) -> Option<String> {
        self.inner.transport.session_id().await
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        self.inner.state().await
    }

    /// Negotiated protocol version (after initialization)
    pub async fn negotiated_version(&self) -> Option<ProtocolVersion> {
        self.inner.negotiated_version.read().await.clone()
    }

    /// Server identity (after initialization)
    pub async fn server_info(&self) -> Option<ServerInfo> {
        self.inner.server_info.read().await.clone()
    }

    /// Server capabilities (after initialization)
    pub async fn server_capabilities(&self) -> Option<ServerCapabilities> {
        self.inner.server_capabilities.read().await.clone()
    }

    /// The SSE resumption cursor, for HTTP sessions
    pub async fn last_event_id(&self) -> Option<String> {
        match &self.inner.transport {
            Transport::Http(http) => http.last_event_id().await,
            Transport::Stdio(_) => None,
        }
    }

    /// Register the notification callback slot
    pub async fn on_notification(&self, callback: NotificationCallback) {
        *self.inner.notification_callback.write().await = Some(callback);
    }

    /// Register the server-initiated-request callback slot
    pub async fn on_server_request(&self, callback: ServerRequestCallback) {
        *self.inner.server_request_callback.write().await = Some(callback);
    }

    /// Point-in-time statistics
    pub async fn stats(&self) -> SessionStats {
        let counters = &self.inner.counters;
        SessionStats {
            session_id: self.inner.local_id.clone(),
            state: self.state().await,
            requests_sent: counters.requests_sent.load(Ordering::Relaxed),
            responses_received: counters.responses_received.load(Ordering::Relaxed),
            notifications_sent: counters.notifications_sent.load(Ordering::Relaxed),
            notifications_received: counters.notifications_received.load(Ordering::Relaxed),
            notifications_dropped: counters.notifications_dropped.load(Ordering::Relaxed),
            protocol_violations: counters.protocol_violations.load(Ordering::Relaxed),
            pending_requests: self.inner.pending.len(),
            created_at: self.inner.created_at,
        }
    }

    // Handshake

    /// Run the initialize handshake
    ///
    /// Sends `initialize`, validates the negotiated protocol version,
    /// emits `notifications/initialized`, and moves the session to
    /// `Ready`. With `VersionPreference::Auto` over HTTP, a
    /// protocol-level rejection of the current revision triggers one
    /// retry through the legacy 2024-11-05 HTTP+SSE flow.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the session is not `New`; `VersionMismatch`
    /// when the server offers a revision this runtime does not speak
    /// (terminal); transport and server errors otherwise.
    pub async fn initialize(&self) -> McpResult<InitializeResponse> {
        if !self.inner.begin_initializing().await {
            let state = self.state().await;
            return Err(McpError::invalid_state("new", state.to_string()));
        }

        match self.initialize_inner().await {
            Ok(response) => Ok(response),
            Err(e) => {
                if matches!(e, McpError::Cancelled { .. }) {
                    // Cancelling initialize aborts the session entirely.
                    let _ = self.close().await;
                } else {
                    // A failed handshake leaves no usable session behind.
                    self.inner.fail_connection(&e.to_string()).await;
                }
                Err(e)
            }
        }
    }

    async fn initialize_inner(&self) -> McpResult<InitializeResponse> {
        let preference = self.inner.config.protocol_version;

        // The legacy flow receives its POST endpoint over the SSE stream,
        // so the stream must be up before the first request.
        if matches!(preference, VersionPreference::V2024_11_05) {
            self.enter_legacy_flow().await?;
        }

        let first_version = match preference {
            VersionPreference::V2024_11_05 => ProtocolVersion::legacy(),
            _ => ProtocolVersion::current(),
        };

        match self.send_initialize(first_version.clone()).await {
            Ok(response) => self.finish_initialize(first_version, response).await,
            Err(e) if self.should_fall_back(preference, &e) => {
                debug!(
                    session_id = %self.id(),
                    error = %e,
                    "initialize rejected, retrying with legacy protocol"
                );
                self.enter_legacy_flow().await.map_err(|_| e)?;
                let legacy = ProtocolVersion::legacy();
                let response = self.send_initialize(legacy.clone()).await?;
                self.finish_initialize(legacy, response).await
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a failed initialize should retry through the legacy flow
    fn should_fall_back(&self, preference: VersionPreference, error: &McpError) -> bool {
        matches!(preference, VersionPreference::Auto)
            && matches!(&self.inner.transport, Transport::Http(_))
            && matches!(
                error,
                McpError::Server(_) | McpError::VersionMismatch { .. }
            )
    }

    async fn enter_legacy_flow(&self) -> McpResult<()> {
        let Transport::Http(http) = &self.inner.transport else {
            return Err(McpError::validation(
                "the legacy 2024-11-05 flow requires the HTTP transport",
            ));
        };
        http.start_sse().await;
        http.wait_for_endpoint(self.inner.config.endpoint_timeout)
            .await?;
        Ok(())
    }

    async fn send_initialize(&self, version: ProtocolVersion) -> McpResult<InitializeResponse> {
        let request = InitializeRequest::with_version(
            version,
            self.inner.config.capabilities.clone(),
            self.inner.config.client_info.clone(),
        );
        let params = serde_json::to_value(&request)
            .map_err(|e| McpError::internal(format!("failed to serialize initialize: {e}")))?;

        // Initialize gets twice the normal deadline.
        let value = self
            .request_in_state(
                methods::INITIALIZE,
                Some(params),
                self.inner.config.response_timeout * 2,
                SessionState::Initializing,
            )
            .await?;

        serde_json::from_value(value).map_err(|e| {
            McpError::protocol_violation(format!("malformed initialize response: {e}"))
        })
    }

    async fn finish_initialize(
        &self,
        requested: ProtocolVersion,
        response: InitializeResponse,
    ) -> McpResult<InitializeResponse> {
        let offered = response.protocol_version.clone();
        if offered != requested && !offered.is_supported() {
            return Err(McpError::VersionMismatch {
                requested: requested.to_string(),
                offered: offered.to_string(),
            });
        }

        *self.inner.negotiated_version.write().await = Some(offered.clone());
        *self.inner.server_info.write().await = Some(response.server_info.clone());
        *self.inner.server_capabilities.write().await = Some(response.capabilities.clone());

        // Ready only after the initialized notification has been flushed.
        self.notify(methods::NOTIFICATION_INITIALIZED, None).await?;
        self.inner.advance_state(SessionState::Ready).await;

        // The modern flow opens the server-push stream after the handshake
        // (the legacy flow already has it up; start_sse is idempotent).
        self.inner.transport.start_sse().await;

        debug!(
            session_id = %self.id(),
            version = %offered,
            server = %response.server_info.name,
            "session ready"
        );
        Ok(response)
    }

    // Generic request/notify surface

    /// Send a request and await its correlated response
    ///
    /// Fails synchronously with `InvalidState` unless the session is
    /// `Ready`.
    pub async fn request(&self, method: &str, params: Option<Value>) -> McpResult<Value> {
        self.request_in_state(
            method,
            params,
            self.inner.config.response_timeout,
            SessionState::Ready,
        )
        .await
    }

    async fn request_in_state(
        &self,
        method: &str,
        params: Option<Value>,
        deadline: Duration,
        required_state: SessionState,
    ) -> McpResult<Value> {
        let state = self.state().await;
        if state != required_state {
            return Err(McpError::invalid_state("ready", state.to_string()));
        }

        let id = self.inner.id_generator.next_id();
        let receiver = self.inner.pending.register(id.clone(), method);
        let bytes = codec::encode_request(method, params, id.clone())?;

        debug!(
            session_id = %self.id(),
            request_id = %id,
            method = %method,
            "sending request"
        );

        if let Err(e) = self.inner.transport.send(bytes).await {
            self.inner.pending.remove(&id);
            let error: McpError = e.into();
            if error.is_connection_fatal() {
                self.inner.fail_connection(&error.to_string()).await;
            }
            return Err(error);
        }
        self.inner
            .counters
            .requests_sent
            .fetch_add(1, Ordering::Relaxed);

        match timeout(deadline, receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                // The sender vanished: the session drained around us.
                Err(McpError::cancelled(None))
            }
            Err(_) => {
                // Deadline expired: remove the entry; no cancellation
                // notification is sent unless the caller cancels.
                self.inner.pending.remove(&id);
                warn!(
                    session_id = %self.id(),
                    request_id = %id,
                    method = %method,
                    "request timed out"
                );
                Err(McpError::Timeout { duration: deadline })
            }
        }
    }

    /// Send a one-way notification
    pub async fn notify(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        let bytes = codec::encode_notification(method, params)?;
        self.inner.transport.send(bytes).await?;
        self.inner
            .counters
            .notifications_sent
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Cancel a pending request
    ///
    /// Signals the local waiter with `Cancelled` immediately and sends
    /// `notifications/cancelled` to the server; a late response for the
    /// id is silently dropped. Returns whether the id was pending.
    /// Cancelling the in-flight initialize aborts the session.
    pub async fn cancel(&self, request_id: RequestId, reason: Option<String>) -> McpResult<bool> {
        let was_pending = self.inner.pending.cancel(&request_id, reason.clone());
        if !was_pending {
            return Ok(false);
        }

        let params = CancelledParams::new(request_id.clone(), reason);
        let params = serde_json::to_value(&params)
            .map_err(|e| McpError::internal(format!("failed to serialize cancellation: {e}")))?;
        if let Err(e) = self.notify(methods::NOTIFICATION_CANCELLED, Some(params)).await {
            debug!(
                session_id = %self.id(),
                request_id = %request_id,
                error = %e,
                "failed to send cancellation notification"
            );
        }

        if self.state().await == SessionState::Initializing {
            let _ = self.close().await;
        }
        Ok(true)
    }

    // Typed MCP operations

    /// `ping`: liveness check
    pub async fn ping(&self) -> McpResult<()> {
        self.request(methods::PING, Some(Value::Object(Default::default())))
            .await?;
        Ok(())
    }

    /// `tools/list`: enumerate tools (one page)
    pub async fn list_tools(&self, cursor: Option<String>) -> McpResult<ListToolsResponse> {
        let request = ListToolsRequest { cursor };
        self.call(methods::TOOLS_LIST, &request).await
    }

    /// `tools/call`: invoke a tool
    pub async fn call_tool(
        &self,
        name: impl Into<String>,
        arguments: Option<Value>,
    ) -> McpResult<CallToolResponse> {
        let request = CallToolRequest::new(name, arguments);
        self.call(methods::TOOLS_CALL, &request).await
    }

    /// `resources/list`: enumerate resources (one page)
    pub async fn list_resources(
        &self,
        cursor: Option<String>,
    ) -> McpResult<ListResourcesResponse> {
        let request = ListResourcesRequest { cursor };
        self.call(methods::RESOURCES_LIST, &request).await
    }

    /// `resources/templates/list`: enumerate resource templates (one page)
    pub async fn list_resource_templates(
        &self,
        cursor: Option<String>,
    ) -> McpResult<ListResourceTemplatesResponse> {
        let request = ListResourceTemplatesRequest { cursor };
        self.call(methods::RESOURCES_TEMPLATES_LIST, &request).await
    }

    /// `resources/read`: read one resource by URI
    pub async fn read_resource(&self, uri: impl Into<String>) -> McpResult<ReadResourceResponse> {
        let request = ReadResourceRequest::new(uri)?;
        self.call(methods::RESOURCES_READ, &request).await
    }

    /// `resources/subscribe`: watch one resource for updates
    pub async fn subscribe(&self, uri: impl Into<String>) -> McpResult<()> {
        let request = SubscribeResourceRequest::new(uri)?;
        let _: Value = self.call(methods::RESOURCES_SUBSCRIBE, &request).await?;
        Ok(())
    }

    /// `resources/unsubscribe`: stop watching one resource
    pub async fn unsubscribe(&self, uri: impl Into<String>) -> McpResult<()> {
        let request = SubscribeResourceRequest::new(uri)?;
        let _: Value = self.call(methods::RESOURCES_UNSUBSCRIBE, &request).await?;
        Ok(())
    }

    /// `prompts/list`: enumerate prompts (one page)
    pub async fn list_prompts(&self, cursor: Option<String>) -> McpResult<ListPromptsResponse> {
        let request = ListPromptsRequest { cursor };
        self.call(methods::PROMPTS_LIST, &request).await
    }

    /// `prompts/get`: expand a prompt
    pub async fn get_prompt(
        &self,
        name: impl Into<String>,
        arguments: Option<std::collections::HashMap<String, String>>,
    ) -> McpResult<GetPromptResponse> {
        let request = GetPromptRequest::new(name, arguments);
        self.call(methods::PROMPTS_GET, &request).await
    }

    /// Close the session
    ///
    /// Signals every pending completion with `Cancelled`, then tears the
    /// transport down. Idempotent: calling it twice is a no-op. After it
    /// returns no further I/O is initiated and no callback fires.
    pub async fn close(&self) -> McpResult<()> {
        let state = self.state().await;
        if matches!(state, SessionState::Closing | SessionState::Closed) {
            return Ok(());
        }
        if state == SessionState::Error {
            // Terminal already; just make sure the transport is gone.
            let _ = self.inner.transport.close().await;
            return Ok(());
        }

        self.inner.advance_state(SessionState::Closing).await;
        self.inner.pending.drain_all(|_| McpError::cancelled(None));

        let result = self.inner.transport.close().await;
        self.inner.advance_state(SessionState::Closed).await;

        debug!(session_id = %self.id(), "session closed");
        result.map_err(Into::into)
    }

    /// Serialize params, issue the request, deserialize the result
    async fn call<P, R>(&self, method: &str, params: &P) -> McpResult<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let params = serde_json::to_value(params)
            .map_err(|e| McpError::internal(format!("failed to serialize params: {e}")))?;
        let params = match &params {
            Value::Object(map) if map.is_empty() => None,
            _ => Some(params),
        };

        let value = self.request(method, params).await?;
        serde_json::from_value(value).map_err(|e| {
            McpError::protocol_violation(format!("malformed {method} response: {e}"))
        })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.inner.local_id)
            .field("transport", &self.inner.transport.transport_type())
            .finish()
    }
}

/// Reader task: consumes the transport event channel
async fn reader_loop(inner: Arc<SessionInner>, mut events: mpsc::Receiver<TransportEvent>) {
    while let Some(event) = events.recv().await {
        if inner.state().await == SessionState::Closed {
            break;
        }

        match event {
            TransportEvent::Message(message) => match message {
                crate::protocol::JsonRpcMessage::Response(response) => {
                    inner.handle_response(response).await;
                }
                crate::protocol::JsonRpcMessage::Notification(notification) => {
                    inner.handle_notification(notification);
                }
                crate::protocol::JsonRpcMessage::Request(request) => {
                    handle_server_request(&inner, request);
                }
            },
            TransportEvent::Invalid(error) => {
                handle_invalid(&inner, error);
            }
            TransportEvent::Error(error) => {
                if error.is_fatal() {
                    inner.fail_connection(&error.to_string()).await;
                } else {
                    warn!(
                        session_id = %inner.local_id,
                        error = %error,
                        "transport error"
                    );
                }
            }
            TransportEvent::Closed => {
                let state = inner.state().await;
                if matches!(state, SessionState::Closing | SessionState::Closed) {
                    break;
                }
                inner.fail_connection("transport closed unexpectedly").await;
            }
        }
    }
}

/// Dispatch task: drains the bounded notification queue into the callback
async fn dispatch_loop(
    inner: Arc<SessionInner>,
    mut notification_rx: mpsc::Receiver<JsonRpcNotification>,
) {
    while let Some(notification) = notification_rx.recv().await {
        // No callbacks after close.
        if matches!(
            inner.state().await,
            SessionState::Closing | SessionState::Closed
        ) {
            continue;
        }
        let callback = inner.notification_callback.read().await.clone();
        if let Some(callback) = callback {
            callback(notification);
        }
    }
}
