//! HTTP client factory with consistent timeout configuration.
//!
//! All outbound HTTP clients go through this module so every external call
//! (YooKassa, Resend) carries both a connect and a total request timeout.

use reqwest::Client;
use std::time::Duration;

/// Default connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request timeout (total request/response time).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build an HTTP client with an explicit request timeout.
///
/// Panics if the client cannot be built (e.g., TLS misconfiguration). This is
/// acceptable for singleton constructors since the app cannot function
/// without HTTP clients.
pub fn build_client(request_timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .expect("Failed to build HTTP client")
}

/// Build an HTTP client with default timeouts.
pub fn build_default_client() -> Client {
    build_client(DEFAULT_REQUEST_TIMEOUT)
}
