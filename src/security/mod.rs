//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP fixed window, 429 on excess)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → Pass to backend selection
//! ```
//!
//! # Design Decisions
//! - Rate limiting runs before any backend is selected
//! - No trust in client-supplied hop-by-hop headers

pub mod headers;
pub mod rate_limit;

pub use rate_limit::{RateDecision, RateLimiter};
