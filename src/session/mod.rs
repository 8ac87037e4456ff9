//! Sticky session subsystem.
//!
//! # Data Flow
//! ```text
//! Request headers
//!     → cookie.rs (find `sticky-session`)
//!     → token.rs (base64 → "session_id@target")
//!     → affinity.rs (target healthy? reuse : balancer + new cookie)
//! ```
//!
//! # Design Decisions
//! - Stateless: the token is the session, nothing is stored server side
//! - Targets are re-validated against the healthy subset on every request
//! - Malformed cookies are never surfaced to the client

pub mod affinity;
pub mod cookie;
pub mod token;

pub use affinity::{Affinity, StickyRoute, StickySessions};
pub use token::{StickyToken, TokenError};
