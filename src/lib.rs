//! Reverse-proxy load balancer library.
//!
//! Distributes inbound HTTP requests over a fixed pool of backends with
//! round-robin or least-connections selection, optional cookie-based sticky
//! sessions, per-client fixed-window rate limiting and active health checks.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod security;
pub mod session;

pub use config::{BalancerConfig, ValidatedConfig};
pub use error::{BalancerError, StartupError};
pub use http::{Dispatcher, HttpServer};
pub use lifecycle::Shutdown;
