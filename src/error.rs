//! Request-path and startup error types.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors produced while dispatching a single request.
///
/// Each variant maps to one response status (see `http::response`).
#[derive(Debug, Error)]
pub enum BalancerError {
    /// The client exhausted its request quota for the current window.
    #[error("rate limit exceeded for {client}")]
    RateLimited { client: String, retry_after: Duration },

    /// The healthy subset is empty and the policy is fail-closed.
    #[error("no healthy server available")]
    NoHealthyServer,

    /// Connection refused, reset, or timed out while proxying.
    #[error("backend {backend} unreachable: {reason}")]
    BackendUnreachable { backend: String, reason: String },

    /// The inbound request could not be rewritten for the chosen backend.
    #[error("cannot build upstream request: {0}")]
    UpstreamRequest(String),
}

/// Fatal errors raised before the balancer begins serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load TLS material: {0}")]
    Tls(std::io::Error),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
