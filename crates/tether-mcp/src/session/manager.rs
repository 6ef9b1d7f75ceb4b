//! Session Manager
//!
//! A registry of live sessions keyed by session id. Operations are O(1)
//! map accesses under a concurrent map; nothing here blocks.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tracing::debug;

// Layer 3: Internal module imports
use crate::error::{McpError, McpResult};
use crate::session::session::{Session, SessionStats};

/// Aggregated statistics over every registered session
#[derive(Debug, Clone)]
pub struct ManagerStats {
    /// Number of registered sessions
    pub sessions: usize,
    /// Per-session snapshots
    pub per_session: Vec<SessionStats>,
}

/// Error report from [`SessionManager::close_all`]
///
/// Closing is best effort: one failing session never aborts the others.
#[derive(Debug)]
pub struct CloseReport {
    /// Sessions closed cleanly
    pub closed: usize,
    /// Failures, keyed by session id
    pub failures: Vec<(String, McpError)>,
}

impl CloseReport {
    /// Whether every session closed cleanly
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for CloseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} closed, {} failed", self.closed, self.failures.len())?;
        for (session_id, error) in &self.failures {
            write!(f, "; {session_id}: {error}")?;
        }
        Ok(())
    }
}

/// Registry of live sessions
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<String, Session>,
}

impl SessionManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its id
    ///
    /// # Errors
    ///
    /// Fails with `Validation` when the id is already registered.
    pub fn add(&self, session: Session) -> McpResult<()> {
        let session_id = session.id().to_string();
        match self.sessions.entry(session_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(McpError::validation(format!(
                "session id already registered: {session_id}"
            ))),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!(session_id = %session_id, "session registered");
                entry.insert(session);
                Ok(())
            }
        }
    }

    /// Look up a session by id
    pub fn get(&self, session_id: &str) -> McpResult<Session> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| McpError::session_not_found(session_id))
    }

    /// Whether a session id is registered
    pub fn has(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Remove a session from the registry (without closing it)
    pub fn remove(&self, session_id: &str) -> McpResult<Session> {
        self.sessions
            .remove(session_id)
            .map(|(_, session)| session)
            .ok_or_else(|| McpError::session_not_found(session_id))
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every session, best effort
    ///
    /// Errors are collected into the report, never propagated in a way
    /// that aborts the remaining closes. The registry is left empty.
    pub async fn close_all(&self) -> CloseReport {
        let sessions: Vec<(String, Session)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        self.sessions.clear();

        let mut report = CloseReport {
            closed: 0,
            failures: Vec::new(),
        };
        for (session_id, session) in sessions {
            match session.close().await {
                Ok(()) => report.closed += 1,
                Err(error) => report.failures.push((session_id, error)),
            }
        }
        report
    }

    /// Aggregated statistics snapshot
    pub async fn stats(&self) -> ManagerStats {
        let sessions: Vec<Session> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut per_session = Vec::with_capacity(sessions.len());
        for session in &sessions {
            per_session.push(session.stats().await);
        }

        ManagerStats {
            sessions: per_session.len(),
            per_session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::session::{SessionConfig, SessionState};
    use crate::transport::{StdioConfig, Transport};

    async fn idle_session() -> Session {
        let transport = Transport::stdio(StdioConfig::new(["sleep", "5"]))
            .await
            .unwrap();
        Session::connect(transport, SessionConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn add_get_has_remove() {
        let manager = SessionManager::new();
        let session = idle_session().await;
        let session_id = session.id().to_string();

        manager.add(session).unwrap();
        assert!(manager.has(&session_id));
        assert_eq!(manager.len(), 1);

        let looked_up = manager.get(&session_id).unwrap();
        assert_eq!(looked_up.id(), session_id);

        let removed = manager.remove(&session_id).unwrap();
        assert!(!manager.has(&session_id));
        assert!(manager.is_empty());

        removed.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_session_errors() {
        let manager = SessionManager::new();
        let err = manager.get("ghost").unwrap_err();
        assert!(matches!(err, McpError::SessionNotFound { .. }));

        let err = manager.remove("ghost").unwrap_err();
        assert!(matches!(err, McpError::SessionNotFound { .. }));
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let manager = SessionManager::new();
        let session = idle_session().await;

        manager.add(session.clone()).unwrap();
        let err = manager.add(session.clone()).unwrap_err();
        assert!(matches!(err, McpError::Validation { .. }));

        manager.close_all().await;
    }

    #[tokio::test]
    async fn close_all_closes_everything() {
        let manager = SessionManager::new();
        let first = idle_session().await;
        let second = idle_session().await;
        manager.add(first.clone()).unwrap();
        manager.add(second.clone()).unwrap();

        let report = manager.close_all().await;
        assert!(report.is_clean(), "report: {report}");
        assert_eq!(report.closed, 2);
        assert!(manager.is_empty());

        assert_eq!(first.state().await, SessionState::Closed);
        assert_eq!(second.state().await, SessionState::Closed);
    }

    #[tokio::test]
    async fn stats_aggregates_sessions() {
        let manager = SessionManager::new();
        manager.add(idle_session().await).unwrap();
        manager.add(idle_session().await).unwrap();

        let stats = manager.stats().await;
        assert_eq!(stats.sessions, 2);
        assert_eq!(stats.per_session.len(), 2);

        manager.close_all().await;
    }
}
