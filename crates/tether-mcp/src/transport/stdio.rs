//! Stdio Transport
//!
//! Runs an MCP server as a child process and exchanges newline-delimited
//! compact JSON over its stdin/stdout. Each message is one UTF-8 line
//! terminated by `\n`; the encoder never emits interior line breaks, so
//! framing is unambiguous.
//!
//! # Architecture
//!
//! ```text
//! caller -> send(bytes) -> writer task -> child stdin
//! child stdout -> reader task -> TransportEvent channel -> session
//! child stderr -> stderr task -> bounded tail (diagnostics)
//! ```
//!
//! A single writer task drains an outbound queue so message framing is
//! never interleaved; the reader task owns stdout until EOF. The transport
//! holds no session pointer: inbound traffic surfaces as opaque
//! [`TransportEvent`]s on a channel the session consumes.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use bytes::Bytes;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

// Layer 3: Internal module imports
use crate::protocol::codec;
use crate::protocol::constants::defaults;
use crate::transport::error::{TransportError, TransportResult};
use crate::transport::TransportEvent;

/// Configuration for the stdio transport
///
/// `command` is the only required field: the program to spawn followed by
/// its arguments.
///
/// # Examples
///
/// ```rust
/// use tether_mcp::transport::StdioConfig;
///
/// let config = StdioConfig::new(["python3", "-m", "my_mcp_server"]);
/// assert!(config.validate().is_ok());
/// assert!(StdioConfig::default().validate().is_err()); // no command
/// ```
#[derive(Debug, Clone)]
pub struct StdioConfig {
    /// Program and arguments to spawn (required, non-empty)
    pub command: Vec<String>,

    /// Deadline for a single continuation read of a partially received line
    pub read_timeout: Duration,

    /// Deadline for flushing one outbound message to the child
    pub write_timeout: Duration,

    /// Grace period for child exit after stdin EOF before a forced kill
    pub shutdown_timeout: Duration,

    /// Maximum bytes buffered for one inbound line
    pub buffer_size: usize,

    /// Whether the child inherits the parent environment
    pub inherit_environment: bool,

    /// Whether outbound messages are re-decoded before hitting the wire
    pub validate_messages: bool,

    /// Whether child stderr is captured into the diagnostic tail
    pub capture_stderr: bool,

    /// Environment overrides applied after inheritance
    pub env: HashMap<String, String>,
}

impl Default for StdioConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
            shutdown_timeout: defaults::SHUTDOWN_TIMEOUT,
            buffer_size: defaults::BUFFER_SIZE,
            inherit_environment: true,
            validate_messages: false,
            capture_stderr: true,
            env: HashMap::new(),
        }
    }
}

impl StdioConfig {
    /// Create a configuration for the given command line
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set an environment override for the child
    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Disable parent environment inheritance
    pub fn clean_environment(mut self) -> Self {
        self.inherit_environment = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> TransportResult<()> {
        if self.command.is_empty() || self.command[0].is_empty() {
            return Err(TransportError::invalid_config(
                "stdio transport requires a non-empty command",
            ));
        }
        if self.buffer_size == 0 {
            return Err(TransportError::invalid_config(
                "buffer_size must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Build a configuration from a neutral key-value map
    ///
    /// Unknown keys are ignored with a warning; recognized keys with the
    /// wrong JSON type fail validation. Durations are given in seconds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use serde_json::json;
    /// use tether_mcp::transport::StdioConfig;
    ///
    /// let mut map = HashMap::new();
    /// map.insert("command".to_string(), json!(["node", "server.js"]));
    /// map.insert("read_timeout".to_string(), json!(5.0));
    ///
    /// let config = StdioConfig::from_map(&map)?;
    /// assert_eq!(config.command, vec!["node", "server.js"]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_map(map: &HashMap<String, Value>) -> TransportResult<Self> {
        let mut config = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "command" => {
                    config.command = value
                        .as_array()
                        .map(|items| {
                            items
                                .iter()
                                .map(|item| {
                                    item.as_str().map(str::to_string).ok_or_else(|| {
                                        TransportError::invalid_config(
                                            "command entries must be strings",
                                        )
                                    })
                                })
                                .collect::<TransportResult<Vec<_>>>()
                        })
                        .transpose()?
                        .ok_or_else(|| {
                            TransportError::invalid_config("command must be an array of strings")
                        })?;
                }
                "read_timeout" => config.read_timeout = duration_value(key, value)?,
                "write_timeout" => config.write_timeout = duration_value(key, value)?,
                "shutdown_timeout" => config.shutdown_timeout = duration_value(key, value)?,
                "buffer_size" => {
                    config.buffer_size = value.as_u64().ok_or_else(|| {
                        TransportError::invalid_config("buffer_size must be a positive integer")
                    })? as usize;
                }
                "inherit_environment" => config.inherit_environment = bool_value(key, value)?,
                "validate_messages" => config.validate_messages = bool_value(key, value)?,
                "capture_stderr" => config.capture_stderr = bool_value(key, value)?,
                "env" => {
                    let entries = value.as_object().ok_or_else(|| {
                        TransportError::invalid_config("env must be an object of strings")
                    })?;
                    for (name, entry) in entries {
                        let entry = entry.as_str().ok_or_else(|| {
                            TransportError::invalid_config("env values must be strings")
                        })?;
                        config.env.insert(name.clone(), entry.to_string());
                    }
                }
                unknown => warn!(key = unknown, "ignoring unknown stdio config key"),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn duration_value(key: &str, value: &Value) -> TransportResult<Duration> {
    value
        .as_f64()
        .filter(|seconds| *seconds >= 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| {
            TransportError::invalid_config(format!("{key} must be a non-negative number of seconds"))
        })
}

fn bool_value(key: &str, value: &Value) -> TransportResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| TransportError::invalid_config(format!("{key} must be a boolean")))
}

/// Shared counters published by the background tasks
#[derive(Debug, Default)]
struct StdioShared {
    connected: AtomicBool,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
}

/// Point-in-time statistics for a stdio transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioStats {
    /// Messages successfully queued to the child
    pub messages_sent: u64,
    /// Messages decoded from the child
    pub messages_received: u64,
    /// Child exit code, once the process has terminated
    pub exit_code: Option<i32>,
}

/// Stdio transport over a spawned child process
///
/// Created with [`StdioTransport::connect`], which spawns the child and
/// starts the background reader/writer tasks. Inbound messages arrive on
/// the event channel obtained from [`StdioTransport::take_events`].
pub struct StdioTransport {
    config: StdioConfig,
    session_id: String,
    child: Mutex<Option<Child>>,
    writer_tx: Mutex<Option<mpsc::Sender<Bytes>>>,
    events_rx: Option<mpsc::Receiver<TransportEvent>>,
    shared: Arc<StdioShared>,
    stderr_tail: Arc<Mutex<String>>,
    /// Child exit code; `i64::MIN` until the process has been reaped
    exit_code: AtomicI64,
}

impl StdioTransport {
    /// Spawn the configured child process and start exchanging messages
    ///
    /// # Errors
    ///
    /// Fails with `InvalidConfig` for a bad configuration and `Connection`
    /// when the child cannot be spawned or its pipes attached.
    pub async fn connect(config: StdioConfig) -> TransportResult<Self> {
        config.validate()?;

        let session_id = format!("stdio-{}", uuid::Uuid::new_v4());

        let mut command = Command::new(&config.command[0]);
        command
            .args(&config.command[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if config.capture_stderr {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        if !config.inherit_environment {
            command.env_clear();
        }
        command.envs(&config.env);

        let mut child = command.spawn().map_err(|e| {
            TransportError::connection(format!(
                "failed to spawn child process '{}': {e}",
                config.command[0]
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::connection("failed to attach child stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::connection("failed to attach child stdout"))?;

        let shared = Arc::new(StdioShared {
            connected: AtomicBool::new(true),
            ..Default::default()
        });
        let stderr_tail = Arc::new(Mutex::new(String::new()));

        let (writer_tx, writer_rx) = mpsc::channel::<Bytes>(64);
        let (events_tx, events_rx) = mpsc::channel::<TransportEvent>(256);

        tokio::spawn(writer_loop(
            stdin,
            writer_rx,
            config.write_timeout,
            Arc::clone(&shared),
            events_tx.clone(),
        ));

        tokio::spawn(reader_loop(
            stdout,
            config.buffer_size,
            config.read_timeout,
            Arc::clone(&shared),
            events_tx,
            session_id.clone(),
        ));

        if config.capture_stderr {
            if let Some(stderr) = child.stderr.take() {
                tokio::spawn(stderr_loop(
                    stderr,
                    Arc::clone(&stderr_tail),
                    session_id.clone(),
                ));
            }
        }

        debug!(
            session_id = %session_id,
            command = %config.command[0],
            "stdio transport connected"
        );

        Ok(Self {
            config,
            session_id,
            child: Mutex::new(Some(child)),
            writer_tx: Mutex::new(Some(writer_tx)),
            events_rx: Some(events_rx),
            shared,
            stderr_tail,
            exit_code: AtomicI64::new(i64::MIN),
        })
    }

    /// Queue one encoded message for delivery to the child
    ///
    /// The bytes must be a single compact JSON document; the framing
    /// newline is appended by the writer task.
    pub async fn send(&self, bytes: Bytes) -> TransportResult<()> {
        if !self.is_connected() {
            return Err(TransportError::Closed);
        }

        if bytes.len() > self.config.buffer_size {
            return Err(TransportError::message_too_large(
                bytes.len(),
                self.config.buffer_size,
            ));
        }
        if bytes.contains(&b'\n') {
            return Err(TransportError::format(
                "stdio messages must not contain raw line breaks",
            ));
        }
        if self.config.validate_messages {
            codec::decode(&bytes)
                .map_err(|e| TransportError::format(format!("outbound message invalid: {e}")))?;
        }

        let writer_tx = self
            .writer_tx
            .lock()
            .await
            .clone()
            .ok_or(TransportError::Closed)?;
        writer_tx
            .send(bytes)
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Take the inbound event channel (once)
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TransportEvent>> {
        self.events_rx.take()
    }

    /// The locally synthesized session id
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the child is still exchanging messages
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Bounded tail of captured child stderr
    pub async fn stderr_tail(&self) -> String {
        self.stderr_tail.lock().await.clone()
    }

    /// Current transport statistics
    pub fn stats(&self) -> StdioStats {
        let exit_code = self.exit_code.load(Ordering::Acquire);
        StdioStats {
            messages_sent: self.shared.messages_sent.load(Ordering::Relaxed),
            messages_received: self.shared.messages_received.load(Ordering::Relaxed),
            exit_code: (exit_code != i64::MIN).then_some(exit_code as i32),
        }
    }

    /// Close the transport: EOF on stdin, then wait, then force kill
    ///
    /// Sequence: drop the writer (child sees EOF on stdin), wait up to
    /// `shutdown_timeout` for a voluntary exit, then kill and reap.
    /// Idempotent - later calls return immediately.
    pub async fn close(&self) -> TransportResult<()> {
        self.shared.connected.store(false, Ordering::Release);

        // Dropping the sender ends the writer task, which drops stdin: EOF.
        self.writer_tx.lock().await.take();

        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        let exit_status = match timeout(self.config.shutdown_timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(TransportError::Io(e)),
            Err(_) => {
                warn!(
                    session_id = %self.session_id,
                    "child did not exit within shutdown timeout, killing"
                );
                child.kill().await.map_err(TransportError::Io)?;
                child.wait().await.map_err(TransportError::Io)?
            }
        };

        if let Some(code) = exit_status.code() {
            self.exit_code.store(code as i64, Ordering::Release);
        }
        debug!(
            session_id = %self.session_id,
            exit_code = ?exit_status.code(),
            "stdio transport closed"
        );
        Ok(())
    }
}

impl std::fmt::Debug for StdioTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioTransport")
            .field("session_id", &self.session_id)
            .field("command", &self.config.command)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Writer task: drains the outbound queue onto child stdin
///
/// Exits when the queue closes (transport close) or a write fails; stdin
/// is dropped on exit, delivering EOF to the child.
async fn writer_loop(
    mut stdin: tokio::process::ChildStdin,
    mut writer_rx: mpsc::Receiver<Bytes>,
    write_timeout: Duration,
    shared: Arc<StdioShared>,
    events_tx: mpsc::Sender<TransportEvent>,
) {
    while let Some(bytes) = writer_rx.recv().await {
        let write = async {
            stdin.write_all(&bytes).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await?;
            Ok::<(), std::io::Error>(())
        };

        match timeout(write_timeout, write).await {
            Ok(Ok(())) => {
                shared.messages_sent.fetch_add(1, Ordering::Relaxed);
                trace!(bytes = bytes.len(), "stdio message written");
            }
            Ok(Err(e)) => {
                shared.connected.store(false, Ordering::Release);
                let _ = events_tx.send(TransportEvent::Error(TransportError::Io(e))).await;
                return;
            }
            Err(_) => {
                shared.connected.store(false, Ordering::Release);
                let _ = events_tx
                    .send(TransportEvent::Error(TransportError::io_timeout(
                        "write",
                        write_timeout,
                    )))
                    .await;
                return;
            }
        }
    }
    // Queue closed: fall through and drop stdin (EOF).
}

/// Reader task: turns child stdout lines into transport events
///
/// The first read of a line waits indefinitely (an idle server is not an
/// error); continuation reads of a partially received line are bounded by
/// `read_timeout`. A line that reaches `buffer_size` without a newline is
/// a fatal framing error.
async fn reader_loop<R>(
    stdout: R,
    buffer_size: usize,
    read_timeout: Duration,
    shared: Arc<StdioShared>,
    events_tx: mpsc::Sender<TransportEvent>,
    session_id: String,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(stdout);
    let mut line: Vec<u8> = Vec::new();

    loop {
        line.clear();
        let mut complete = false;

        loop {
            // Bound the line buffer: read at most the remaining budget.
            let budget = (buffer_size + 1).saturating_sub(line.len());
            let line_started = !line.is_empty();
            let mut limited = (&mut reader).take(budget as u64);

            let read = limited.read_until(b'\n', &mut line);
            let n = if !line_started {
                read.await
            } else {
                match timeout(read_timeout, read).await {
                    Ok(result) => result,
                    Err(_) => {
                        shared.connected.store(false, Ordering::Release);
                        let _ = events_tx
                            .send(TransportEvent::Error(TransportError::io_timeout(
                                "read",
                                read_timeout,
                            )))
                            .await;
                        return;
                    }
                }
            };

            match n {
                Ok(0) => {
                    // EOF, or the budget ran out mid-line.
                    if line.len() > buffer_size {
                        shared.connected.store(false, Ordering::Release);
                        let _ = events_tx
                            .send(TransportEvent::Error(TransportError::message_too_large(
                                line.len(),
                                buffer_size,
                            )))
                            .await;
                        return;
                    }
                    shared.connected.store(false, Ordering::Release);
                    let _ = events_tx.send(TransportEvent::Closed).await;
                    return;
                }
                Ok(_) => {
                    if line.last() == Some(&b'\n') {
                        line.pop();
                        if line.last() == Some(&b'\r') {
                            line.pop();
                        }
                        complete = true;
                        break;
                    }
                    if line.len() > buffer_size {
                        shared.connected.store(false, Ordering::Release);
                        let _ = events_tx
                            .send(TransportEvent::Error(TransportError::message_too_large(
                                line.len(),
                                buffer_size,
                            )))
                            .await;
                        return;
                    }
                    // Partial line: keep reading under the timeout.
                }
                Err(e) => {
                    shared.connected.store(false, Ordering::Release);
                    let _ = events_tx.send(TransportEvent::Error(TransportError::Io(e))).await;
                    return;
                }
            }
        }

        if !complete || line.is_empty() {
            continue;
        }

        match codec::decode(&line) {
            Ok(message) => {
                shared.messages_received.fetch_add(1, Ordering::Relaxed);
                if events_tx.send(TransportEvent::Message(message)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    preview = %String::from_utf8_lossy(&line[..line.len().min(120)]),
                    "dropping undecodable stdio line"
                );
                if events_tx.send(TransportEvent::Invalid(e)).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Stderr task: captures diagnostic output into a bounded tail
async fn stderr_loop<R>(stderr: R, tail: Arc<Mutex<String>>, session_id: String)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(session_id = %session_id, stderr = %line, "child stderr");
        let mut tail = tail.lock().await;
        tail.push_str(&line);
        tail.push('\n');
        if tail.len() > defaults::STDERR_TAIL_BYTES {
            let excess = tail.len() - defaults::STDERR_TAIL_BYTES;
            // Trim from the front on a char boundary.
            let cut = (excess..tail.len())
                .find(|i| tail.is_char_boundary(*i))
                .unwrap_or(0);
            tail.drain(..cut);
        }
    }
}
