//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe every backend concurrently (GET <base>/health-check)
//!     → Join all probes
//!     → ServerPool::mark_healthy / mark_unhealthy
//! ```
//!
//! # State machine
//! ```text
//! Healthy   → Unhealthy: probe fails, times out, or returns non-200
//! Unhealthy → Healthy:   probe returns 200
//! ```
//!
//! # Design Decisions
//! - Backends start Healthy (optimistic) until the first probe completes
//! - No retries within a cycle; the next cycle is the retry
//! - The request path never changes health state

pub mod active;

pub use active::{HealthMonitor, ProbeFailure};
