//! Authentication Header Composition
//!
//! Builds the header set for every outbound HTTP request. Composition
//! order is fixed and documented: protocol headers first, then the session
//! header, then auth headers (static config, then the [`Authenticator`]
//! hook), then user-configured headers last so they win on conflict.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use base64::Engine;

// Layer 3: Internal module imports
use crate::protocol::constants::headers;
use crate::transport::error::TransportResult;
use crate::transport::http::config::{AuthConfig, HttpConfig};

/// Hook for host-managed credentials (token refresh, signing, vaults)
///
/// Invoked on every outbound request after the static [`AuthConfig`]
/// headers have been applied and before user-configured headers are
/// merged. Implementations receive the headers composed so far and may
/// add or replace entries.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Augment the outbound header set
    async fn augment_headers(
        &self,
        headers: HashMap<String, String>,
    ) -> TransportResult<HashMap<String, String>>;
}

/// Compose the full header map for one outbound request
///
/// `accept` varies by request kind (POST vs SSE GET), so the caller
/// provides it; everything else follows the documented order.
pub(crate) async fn compose_headers(
    config: &HttpConfig,
    accept: &str,
    session_id: Option<&str>,
    authenticator: Option<&dyn Authenticator>,
) -> TransportResult<HashMap<String, String>> {
    let mut composed = HashMap::new();
    composed.insert("Accept".to_string(), accept.to_string());
    composed.insert("User-Agent".to_string(), config.user_agent.clone());

    if let Some(session_id) = session_id {
        composed.insert(headers::MCP_SESSION_ID.to_string(), session_id.to_string());
    }

    apply_auth(&config.auth, &mut composed);

    if let Some(authenticator) = authenticator {
        composed = authenticator.augment_headers(composed).await?;
    }

    // User-configured headers merge last: they win on conflict.
    for (name, value) in &config.headers {
        composed.insert(name.clone(), value.clone());
    }

    Ok(composed)
}

fn apply_auth(auth: &AuthConfig, headers: &mut HashMap<String, String>) {
    match auth {
        AuthConfig::None => {}
        AuthConfig::Bearer { token } => {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        AuthConfig::Basic { username, password } => {
            let credentials = base64::engine::general_purpose::STANDARD
                .encode(format!("{username}:{password}"));
            headers.insert("Authorization".to_string(), format!("Basic {credentials}"));
        }
        AuthConfig::Custom { headers: custom } => {
            for (name, value) in custom {
                headers.insert(name.clone(), value.clone());
            }
        }
    }
}
