//! Streamable HTTP Transport
//!
//! POST-based sends with retry and backoff, an SSE receive stream with
//! automatic resumption, header/auth composition, and the configuration
//! surface for all of it.

pub mod auth;
pub mod client;
pub mod config;
pub mod sse;

pub use auth::Authenticator;
pub use client::{HttpStats, HttpTransport};
pub use config::{AuthConfig, EventStoreKind, HttpConfig, TlsVersion, VersionPreference};
