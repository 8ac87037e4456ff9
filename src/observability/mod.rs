//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher, health monitor, limiter, sticky sessions
//!     → tracing events (request_id, server_id, backend fields)
//!     → metrics.rs (balancer_* series)
//!
//! Sinks:
//!     → logging.rs subscriber (stdout, RUST_LOG or configured level)
//!     → Prometheus exporter (only when metrics_enabled)
//! ```

pub mod logging;
pub mod metrics;
