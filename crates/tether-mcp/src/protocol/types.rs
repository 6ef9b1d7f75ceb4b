//! Common Protocol Types
//!
//! Core domain newtypes with validation and proper encapsulation, plus the
//! client/server identity structures exchanged during the handshake.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::constants::versions;
use super::errors::{ProtocolError, ProtocolResult};

/// Protocol version with validation and proper encapsulation
///
/// Represents an MCP protocol revision in the format YYYY-MM-DD. The
/// internal string is private so every constructed value is known valid.
///
/// # Examples
///
/// ```rust
/// use tether_mcp::protocol::ProtocolVersion;
///
/// let version = ProtocolVersion::current();
/// assert_eq!(version.as_str(), "2025-03-26");
///
/// let legacy = ProtocolVersion::new("2024-11-05")?;
/// assert!(legacy.is_supported());
///
/// assert!(ProtocolVersion::new("not-a-date").is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProtocolVersion(String);

impl ProtocolVersion {
    /// Preferred MCP protocol revision
    pub const CURRENT: &'static str = versions::V2025_03_26;

    /// Legacy HTTP+SSE revision used by the automatic fallback path
    pub const LEGACY: &'static str = versions::V2024_11_05;

    /// Create a new protocol version with validation
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidProtocolVersion` if the version
    /// format is not YYYY-MM-DD.
    pub fn new(version: impl Into<String>) -> ProtocolResult<Self> {
        let version = version.into();
        if Self::is_valid_version(&version) {
            Ok(Self(version))
        } else {
            Err(ProtocolError::InvalidProtocolVersion(version))
        }
    }

    /// Create the preferred protocol version (never fails)
    pub fn current() -> Self {
        Self(Self::CURRENT.to_string())
    }

    /// Create the legacy protocol version (never fails)
    pub fn legacy() -> Self {
        Self(Self::LEGACY.to_string())
    }

    /// Get the version string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this runtime knows how to speak the revision
    pub fn is_supported(&self) -> bool {
        versions::SUPPORTED.contains(&self.0.as_str())
    }

    fn is_valid_version(version: &str) -> bool {
        // YYYY-MM-DD
        if version.len() != 10 {
            return false;
        }
        let bytes = version.as_bytes();
        bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes[0..4].iter().all(u8::is_ascii_digit)
            && bytes[5..7].iter().all(u8::is_ascii_digit)
            && bytes[8..10].iter().all(u8::is_ascii_digit)
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// URI with validation and type safety
///
/// Resource identity key. Validation is deliberately light: a scheme
/// followed by `:` — resource URIs routinely use custom schemes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Uri(String);

impl Uri {
    /// Create a new URI with validation
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidUri` if the string has no scheme.
    pub fn new(uri: impl Into<String>) -> ProtocolResult<Self> {
        let uri = uri.into();
        let scheme_ok = uri
            .split_once(':')
            .map(|(scheme, _)| {
                !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            })
            .unwrap_or(false);
        if scheme_ok {
            Ok(Self(uri))
        } else {
            Err(ProtocolError::InvalidUri(uri))
        }
    }

    /// Get the URI string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scheme portion, if well formed
    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once(':').map(|(scheme, _)| scheme)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client identity advertised during the initialize handshake
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client implementation name
    pub name: String,
    /// Client implementation version
    pub version: String,
}

/// Server identity returned in the initialize response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server implementation name
    pub name: String,
    /// Server implementation version
    pub version: String,
}
