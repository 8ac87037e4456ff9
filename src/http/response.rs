//! Response handling for errors produced by the balancer itself.
//!
//! Backend responses are relayed untouched; only requests that never reach
//! a backend (or fail to) get a response built here.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::BalancerError;

impl BalancerError {
    pub fn status(&self) -> StatusCode {
        match self {
            BalancerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            BalancerError::NoHealthyServer => StatusCode::SERVICE_UNAVAILABLE,
            BalancerError::BackendUnreachable { .. } | BalancerError::UpstreamRequest(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for BalancerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            BalancerError::RateLimited { retry_after, .. } => {
                let mut response = (status, Json(json!({ "message": "Too many requests" }))).into_response();
                let secs = retry_after.as_secs().max(1);
                if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            BalancerError::NoHealthyServer => (status, "No healthy backends").into_response(),
            BalancerError::BackendUnreachable { .. } | BalancerError::UpstreamRequest(_) => {
                (status, "Upstream request failed").into_response()
            }
        }
    }
}
