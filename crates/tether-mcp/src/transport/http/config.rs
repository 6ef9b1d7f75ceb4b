//! HTTP Transport Configuration
//!
//! Strongly-typed configuration for the streamable HTTP transport, with a
//! defaulting helper that accepts a neutral key-value map.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde_json::Value;
use tracing::warn;
use url::Url;

// Layer 3: Internal module imports
use crate::protocol::constants::{defaults, versions};
use crate::transport::error::{TransportError, TransportResult};

/// Authentication configuration for outbound HTTP requests
///
/// Auth headers are applied before user-configured headers, so the user's
/// headers win on conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// No authentication headers
    #[default]
    None,
    /// `Authorization: Bearer <token>`
    Bearer {
        /// The bearer token
        token: String,
    },
    /// `Authorization: Basic <base64(user:pass)>`
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// Arbitrary headers merged verbatim
    Custom {
        /// Header name/value pairs
        headers: HashMap<String, String>,
    },
}

/// Minimum TLS version accepted for HTTPS connections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsVersion {
    /// TLS 1.2 (default)
    #[default]
    V1_2,
    /// TLS 1.3
    V1_3,
}

impl TlsVersion {
    pub(crate) fn as_reqwest(self) -> reqwest::tls::Version {
        match self {
            TlsVersion::V1_2 => reqwest::tls::Version::TLS_1_2,
            TlsVersion::V1_3 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

/// Protocol revision preference for the handshake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionPreference {
    /// Try the current revision, fall back to the legacy one on rejection
    #[default]
    Auto,
    /// Speak `2025-03-26` only
    V2025_03_26,
    /// Speak `2024-11-05` (legacy HTTP+SSE) only
    V2024_11_05,
}

/// Event replay store selection
///
/// Only the in-memory store ships with the runtime; `File` and `Redis`
/// are accepted grammar but rejected at validation until an
/// implementation is registered behind the same interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventStoreKind {
    /// Bounded in-memory store (default)
    #[default]
    Memory,
    /// File-backed store (not implemented)
    File,
    /// Redis-backed store (not implemented)
    Redis,
}

/// Configuration for the streamable HTTP transport
///
/// # Examples
///
/// ```rust
/// use tether_mcp::transport::HttpConfig;
///
/// let config = HttpConfig::new("https://mcp.example.com/api").unwrap();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Endpoint all POSTs and the SSE GET are issued against (required)
    pub base_url: Url,

    /// Deadline for a single POST round trip
    pub timeout: Duration,

    /// Deadline for establishing the SSE stream (not for its lifetime)
    pub sse_timeout: Duration,

    /// Maximum retry attempts for a failed POST
    pub max_retries: u32,

    /// Initial retry delay; doubles per attempt with jitter
    pub retry_delay: Duration,

    /// Whether the SSE stream reconnects with `Last-Event-ID`
    pub session_resumable: bool,

    /// Whether TLS certificates are verified
    ///
    /// Disabling this accepts any certificate, including self-signed
    /// and expired ones.
    pub validate_ssl: bool,

    /// Reject any non-HTTPS URL, including redirect targets
    pub force_https: bool,

    /// Minimum accepted TLS version
    pub min_tls_version: TlsVersion,

    /// Whether the certificate hostname is verified
    ///
    /// Not independent of `validate_ssl` in this build: the rustls
    /// backend has no hostname-only override, so setting this to
    /// `false` disables certificate validation entirely - the same
    /// effect as `validate_ssl = false`. The transport logs a warning
    /// when this flag alone triggers the downgrade. Leave it `true`
    /// unless accepting any certificate is acceptable.
    pub verify_hostname: bool,

    /// Redirect hop limit
    pub max_redirects: u32,

    /// Whether redirects are followed at all
    pub follow_redirects: bool,

    /// User-Agent header value
    pub user_agent: String,

    /// User-configured headers, merged last (they win on conflict)
    pub headers: HashMap<String, String>,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Protocol revision preference
    pub protocol_version: VersionPreference,

    /// Event replay store selection
    pub event_store_type: EventStoreKind,

    /// Store-specific settings (opaque to the transport)
    pub event_store_config: HashMap<String, Value>,

    /// Request `application/json` responses only (no SSE POST responses)
    pub json_response_mode: bool,

    /// Send a DELETE with the session header on close
    pub terminate_on_close: bool,

    /// Minimum interval between outbound POSTs
    pub min_request_interval: Duration,
}

impl HttpConfig {
    /// Create a configuration for the given endpoint
    ///
    /// # Errors
    ///
    /// Fails when the URL does not parse or uses a non-HTTP scheme.
    pub fn new(base_url: impl AsRef<str>) -> TransportResult<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|e| {
            TransportError::invalid_config(format!("invalid base_url: {e}"))
        })?;

        let config = Self {
            base_url,
            timeout: defaults::RESPONSE_TIMEOUT,
            sse_timeout: Duration::from_secs(10),
            max_retries: defaults::MAX_RETRIES,
            retry_delay: defaults::RETRY_DELAY,
            session_resumable: true,
            validate_ssl: true,
            force_https: false,
            min_tls_version: TlsVersion::default(),
            verify_hostname: true,
            max_redirects: 5,
            follow_redirects: true,
            user_agent: defaults::USER_AGENT.to_string(),
            headers: HashMap::new(),
            auth: AuthConfig::None,
            protocol_version: VersionPreference::Auto,
            event_store_type: EventStoreKind::Memory,
            event_store_config: HashMap::new(),
            json_response_mode: false,
            terminate_on_close: true,
            min_request_interval: defaults::MIN_REQUEST_INTERVAL,
        };
        config.check_scheme(&config.base_url)?;
        Ok(config)
    }

    /// Set bearer authentication
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthConfig::Bearer {
            token: token.into(),
        };
        self
    }

    /// Set basic authentication
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthConfig::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Add a user-configured header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Check a URL against the scheme policy
    pub fn check_scheme(&self, url: &Url) -> TransportResult<()> {
        match url.scheme() {
            "https" => Ok(()),
            "http" if !self.force_https => Ok(()),
            "http" => Err(TransportError::InsecureScheme {
                url: url.to_string(),
            }),
            _ => Err(TransportError::InsecureScheme {
                url: url.to_string(),
            }),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> TransportResult<()> {
        self.check_scheme(&self.base_url)?;

        if self.timeout.is_zero() {
            return Err(TransportError::invalid_config("timeout must be positive"));
        }

        match self.event_store_type {
            EventStoreKind::Memory => Ok(()),
            EventStoreKind::File | EventStoreKind::Redis => {
                Err(TransportError::invalid_config(
                    "only the in-memory event store is implemented; \
                     register a custom EventStore for other backends",
                ))
            }
        }
    }

    /// Build a configuration from a neutral key-value map
    ///
    /// Unknown keys are ignored with a warning; recognized keys with the
    /// wrong JSON type fail validation. Durations are given in seconds.
    pub fn from_map(map: &HashMap<String, Value>) -> TransportResult<Self> {
        let base_url = map
            .get("base_url")
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::invalid_config("base_url is required"))?;
        let mut config = Self::new(base_url)?;

        for (key, value) in map {
            match key.as_str() {
                "base_url" => {}
                "timeout" => config.timeout = duration_value(key, value)?,
                "sse_timeout" => config.sse_timeout = duration_value(key, value)?,
                "retry_delay" => config.retry_delay = duration_value(key, value)?,
                "max_retries" => config.max_retries = u32_value(key, value)?,
                "max_redirects" => config.max_redirects = u32_value(key, value)?,
                "session_resumable" => config.session_resumable = bool_value(key, value)?,
                "validate_ssl" => config.validate_ssl = bool_value(key, value)?,
                "force_https" => config.force_https = bool_value(key, value)?,
                "verify_hostname" => config.verify_hostname = bool_value(key, value)?,
                "follow_redirects" => config.follow_redirects = bool_value(key, value)?,
                "json_response_mode" => config.json_response_mode = bool_value(key, value)?,
                "terminate_on_close" => config.terminate_on_close = bool_value(key, value)?,
                "user_agent" => {
                    config.user_agent = string_value(key, value)?;
                }
                "min_tls_version" => {
                    config.min_tls_version = match value.as_str() {
                        Some("1.2") => TlsVersion::V1_2,
                        Some("1.3") => TlsVersion::V1_3,
                        _ => {
                            return Err(TransportError::invalid_config(
                                "min_tls_version must be \"1.2\" or \"1.3\"",
                            ))
                        }
                    };
                }
                "protocol_version" => {
                    config.protocol_version = match value.as_str() {
                        Some("auto") => VersionPreference::Auto,
                        Some(versions::V2025_03_26) => VersionPreference::V2025_03_26,
                        Some(versions::V2024_11_05) => VersionPreference::V2024_11_05,
                        _ => {
                            return Err(TransportError::invalid_config(format!(
                                "protocol_version must be one of auto, {}, {}",
                                versions::V2025_03_26,
                                versions::V2024_11_05
                            )))
                        }
                    };
                }
                "event_store_type" => {
                    config.event_store_type = match value.as_str() {
                        Some("memory") => EventStoreKind::Memory,
                        Some("file") => EventStoreKind::File,
                        Some("redis") => EventStoreKind::Redis,
                        _ => {
                            return Err(TransportError::invalid_config(
                                "event_store_type must be one of memory, file, redis",
                            ))
                        }
                    };
                }
                "event_store_config" => {
                    let entries = value.as_object().ok_or_else(|| {
                        TransportError::invalid_config("event_store_config must be an object")
                    })?;
                    config.event_store_config =
                        entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                }
                "headers" => {
                    let entries = value.as_object().ok_or_else(|| {
                        TransportError::invalid_config("headers must be an object of strings")
                    })?;
                    for (name, entry) in entries {
                        let entry = entry.as_str().ok_or_else(|| {
                            TransportError::invalid_config("header values must be strings")
                        })?;
                        config.headers.insert(name.clone(), entry.to_string());
                    }
                }
                "auth" => config.auth = auth_from_value(value)?,
                unknown => warn!(key = unknown, "ignoring unknown http config key"),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn auth_from_value(value: &Value) -> TransportResult<AuthConfig> {
    let object = value
        .as_object()
        .ok_or_else(|| TransportError::invalid_config("auth must be an object"))?;

    match object.get("type").and_then(Value::as_str) {
        Some("bearer") => {
            let token = object.get("token").and_then(Value::as_str).ok_or_else(|| {
                TransportError::invalid_config("bearer auth requires a token")
            })?;
            Ok(AuthConfig::Bearer {
                token: token.to_string(),
            })
        }
        Some("basic") => {
            let username = object
                .get("username")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    TransportError::invalid_config("basic auth requires a username")
                })?;
            let password = object
                .get("password")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Ok(AuthConfig::Basic {
                username: username.to_string(),
                password: password.to_string(),
            })
        }
        Some("custom") => {
            let entries = object
                .get("headers")
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    TransportError::invalid_config("custom auth requires a headers object")
                })?;
            let mut headers = HashMap::new();
            for (name, entry) in entries {
                let entry = entry.as_str().ok_or_else(|| {
                    TransportError::invalid_config("custom auth header values must be strings")
                })?;
                headers.insert(name.clone(), entry.to_string());
            }
            Ok(AuthConfig::Custom { headers })
        }
        Some(other) => Err(TransportError::invalid_config(format!(
            "auth type must be bearer, basic, or custom, got {other}"
        ))),
        None => Err(TransportError::invalid_config("auth requires a type field")),
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

fn u32_value(key: &str, value: &Value) -> TransportResult<u32> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            TransportError::invalid_config(format!("{key} must be a non-negative integer"))
        })
}

fn bool_value(key: &str, value: &Value) -> TransportResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| TransportError::invalid_config(format!("{key} must be a boolean")))
}

fn string_value(key: &str, value: &Value) -> TransportResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| TransportError::invalid_config(format!("{key} must be a string")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_rejects_unsupported_schemes() {
        assert!(HttpConfig::new("ftp://example.com").is_err());
        assert!(HttpConfig::new("https://example.com/mcp").is_ok());
        assert!(HttpConfig::new("not a url").is_err());
    }

    #[test]
    fn force_https_rejects_plain_http() {
        let mut config = HttpConfig::new("http://example.com/mcp").unwrap();
        config.force_https = true;
        assert!(matches!(
            config.validate(),
            Err(TransportError::InsecureScheme { .. })
        ));
    }

    #[test]
    fn unimplemented_event_stores_fail_validation() {
        let mut config = HttpConfig::new("https://example.com").unwrap();
        config.event_store_type = EventStoreKind::Redis;
        assert!(matches!(
            config.validate(),
            Err(TransportError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn from_map_requires_base_url() {
        assert!(HttpConfig::from_map(&HashMap::new()).is_err());
    }

    #[test]
    fn from_map_parses_full_configuration() {
        let mut map = HashMap::new();
        map.insert("base_url".to_string(), json!("https://srv/api"));
        map.insert("timeout".to_string(), json!(12.0));
        map.insert("max_retries".to_string(), json!(5));
        map.insert("retry_delay".to_string(), json!(0.5));
        map.insert("force_https".to_string(), json!(true));
        map.insert("min_tls_version".to_string(), json!("1.3"));
        map.insert("protocol_version".to_string(), json!("2024-11-05"));
        map.insert("json_response_mode".to_string(), json!(true));
        map.insert("headers".to_string(), json!({"X-Tenant": "acme"}));
        map.insert(
            "auth".to_string(),
            json!({"type": "bearer", "token": "tok-123"}),
        );

        let config = HttpConfig::from_map(&map).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert!(config.force_https);
        assert_eq!(config.min_tls_version, TlsVersion::V1_3);
        assert_eq!(config.protocol_version, VersionPreference::V2024_11_05);
        assert!(config.json_response_mode);
        assert_eq!(
            config.headers.get("X-Tenant").map(String::as_str),
            Some("acme")
        );
        assert_eq!(
            config.auth,
            AuthConfig::Bearer {
                token: "tok-123".to_string()
            }
        );
    }

    #[test]
    fn from_map_rejects_unknown_auth_type() {
        let mut map = HashMap::new();
        map.insert("base_url".to_string(), json!("https://srv"));
        map.insert("auth".to_string(), json!({"type": "kerberos"}));
        assert!(HttpConfig::from_map(&map).is_err());
    }

    #[test]
    fn from_map_rejects_bad_version_strings() {
        let mut map = HashMap::new();
        map.insert("base_url".to_string(), json!("https://srv"));
        map.insert("protocol_version".to_string(), json!("2023-01-01"));
        assert!(HttpConfig::from_map(&map).is_err());
    }
}
