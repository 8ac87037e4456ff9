//! Header manipulation for proxied requests and responses.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Preserve the client's Host under X-Forwarded-Host
//! - Append the client IP to X-Forwarded-For

use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::HeaderMap;
use std::net::IpAddr;

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    // Proxy-Connection is non-standard but still sent by some clients.
    headers.remove("proxy-connection");
}

/// Prepare inbound headers for forwarding to `backend_authority`.
///
/// `request_authority` is the authority of the inbound request URI. HTTP/2
/// clients send the host there (`:authority`) instead of in `Host`.
pub fn prepare_forward_headers(
    headers: &mut HeaderMap,
    client_ip: IpAddr,
    request_authority: Option<&str>,
    backend_authority: &str,
) {
    strip_hop_by_hop(headers);

    let original_host = headers
        .remove(header::HOST)
        .or_else(|| request_authority.and_then(|a| HeaderValue::from_str(a).ok()));
    if let Some(original_host) = original_host {
        headers.insert(X_FORWARDED_HOST, original_host);
    }
    if let Ok(host) = HeaderValue::from_str(backend_authority) {
        headers.insert(header::HOST, host);
    }

    let forwarded_for = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{prior}, {client_ip}"),
        None => client_ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_standard_and_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close, x-private"));
        headers.insert("x-private", HeaderValue::from_static("secret"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT));
    }

    #[test]
    fn moves_host_and_appends_client() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("shop.example.com"));
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));

        prepare_forward_headers(&mut headers, "10.1.2.3".parse().unwrap(), None, "127.0.0.1:8081");

        assert_eq!(headers[X_FORWARDED_HOST], "shop.example.com");
        assert_eq!(headers[header::HOST], "127.0.0.1:8081");
        assert_eq!(headers[X_FORWARDED_FOR], "203.0.113.7, 10.1.2.3");
    }

    #[test]
    fn missing_host_leaves_forwarded_host_unset() {
        let mut headers = HeaderMap::new();
        prepare_forward_headers(&mut headers, "::1".parse().unwrap(), None, "backend:80");
        assert!(!headers.contains_key(X_FORWARDED_HOST));
        assert_eq!(headers[X_FORWARDED_FOR], "::1");
    }

    #[test]
    fn uri_authority_stands_in_for_missing_host() {
        let mut headers = HeaderMap::new();
        prepare_forward_headers(&mut headers, "10.1.2.3".parse().unwrap(), Some("shop.example.com"), "backend:80");
        assert_eq!(headers[X_FORWARDED_HOST], "shop.example.com");
        assert_eq!(headers[header::HOST], "backend:80");
    }

    #[test]
    fn host_header_wins_over_uri_authority() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("shop.example.com"));
        prepare_forward_headers(&mut headers, "10.1.2.3".parse().unwrap(), Some("other.example.com"), "backend:80");
        assert_eq!(headers[X_FORWARDED_HOST], "shop.example.com");
    }
}
