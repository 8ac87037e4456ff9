//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → dispatcher.rs (rate limit, affinity, selection, forwarding)
//!     → response.rs (429/502/503 for requests the balancer answers itself)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::Dispatcher;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
