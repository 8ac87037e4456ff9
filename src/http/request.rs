//! Request identification.
//!
//! # Responsibilities
//! - Name the request ID header shared by the ID layers and the dispatcher
//! - Build the per-request trace span carrying that ID
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (outermost layer)
//! - Existing client-supplied IDs are kept and propagated to the backend

use axum::http::{HeaderMap, HeaderName, Request};
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request's ID, or "unknown" if the ID layer did not run.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for tower-http's TraceLayer.
pub fn make_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request.headers()),
        method = %request.method(),
        uri = %request.uri(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_or_defaults_request_id() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }
}
