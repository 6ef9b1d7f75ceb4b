//! Request Correlation Table
//!
//! Tracks every outbound request awaiting a response. Each entry owns a
//! oneshot completion channel that is signalled exactly once - with the
//! response, a server error, a cancellation, or a timeout - before the
//! session leaves its ready state.
//!
//! Correlation is purely by id: the server may answer out of order.
//! Duplicate and unknown response ids are not found here, which the
//! session logs and drops as protocol violations.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::trace;

// Layer 3: Internal module imports
use crate::error::{McpError, McpResult};
use crate::protocol::RequestId;

/// Monotonic request id generator
///
/// Lives inside a session - ids are unique per open session, not
/// globally, and there is no global mutable state.
#[derive(Debug)]
pub struct RequestIdGenerator {
    counter: AtomicI64,
}

impl RequestIdGenerator {
    /// Start counting from 1
    pub fn new() -> Self {
        Self {
            counter: AtomicI64::new(1),
        }
    }

    /// Produce the next id
    pub fn next_id(&self) -> RequestId {
        RequestId::Number(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// One registered completion handle
#[derive(Debug)]
struct PendingRequest {
    sender: oneshot::Sender<McpResult<Value>>,
    method: String,
    registered_at: Instant,
}

/// The pending-request table
///
/// Thread safe; mutated from the session's caller tasks and its reader
/// task under the map's internal sharded locking, never across an await.
#[derive(Debug, Default)]
pub struct PendingRequests {
    requests: DashMap<RequestId, PendingRequest>,
}

impl PendingRequests {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request and return its completion receiver
    pub fn register(
        &self,
        id: RequestId,
        method: impl Into<String>,
    ) -> oneshot::Receiver<McpResult<Value>> {
        let (sender, receiver) = oneshot::channel();
        self.requests.insert(
            id,
            PendingRequest {
                sender,
                method: method.into(),
                registered_at: Instant::now(),
            },
        );
        receiver
    }

    /// Signal the completion for `id`; returns the request's method, or
    /// `None` when the id is unknown (already completed, timed out, or
    /// never registered)
    pub fn complete(&self, id: &RequestId, result: McpResult<Value>) -> Option<String> {
        let (_, pending) = self.requests.remove(id)?;
        trace!(
            request_id = %id,
            method = %pending.method,
            elapsed_ms = pending.registered_at.elapsed().as_millis() as u64,
            "completing request"
        );
        // The receiver may have given up (timeout path); that is fine.
        let _ = pending.sender.send(result);
        Some(pending.method)
    }

    /// Remove an entry without signalling (the waiter already gave up)
    pub fn remove(&self, id: &RequestId) -> bool {
        self.requests.remove(id).is_some()
    }

    /// Cancel one request, signalling `Cancelled`
    pub fn cancel(&self, id: &RequestId, reason: Option<String>) -> bool {
        self.complete(id, Err(McpError::cancelled(reason))).is_some()
    }

    /// Whether `id` is currently awaiting completion
    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.requests.contains_key(id)
    }

    /// Number of requests awaiting completion
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Ids currently awaiting completion
    pub fn pending_ids(&self) -> Vec<RequestId> {
        self.requests
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Complete every pending request with an error from `error_for`
    ///
    /// Used when the scope of a failure is the connection: session close
    /// and fatal transport errors. Returns how many were signalled.
    pub fn drain_all(&self, error_for: impl Fn(&RequestId) -> McpError) -> usize {
        let ids = self.pending_ids();
        let mut drained = 0;
        for id in ids {
            if let Some((_, pending)) = self.requests.remove(&id) {
                let _ = pending.sender.send(Err(error_for(&id)));
                drained += 1;
            }
        }
        drained
    }
}
