//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use reverse_balancer::config::{BalancerConfig, ValidatedConfig};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Response header carrying the mock backend's own address.
pub const BACKEND_HEADER: &str = "x-backend";
/// Response header echoing the `X-Forwarded-Host` the backend received.
pub const ECHO_FORWARDED_HOST: &str = "x-echo-forwarded-host";
/// Response header echoing the `X-Forwarded-For` the backend received.
pub const ECHO_FORWARDED_FOR: &str = "x-echo-forwarded-for";

#[derive(Debug)]
struct MockState {
    addr: SocketAddr,
    health_status: AtomicU16,
    delay_ms: AtomicU64,
    hits: AtomicUsize,
}

/// A programmable HTTP backend on an ephemeral port.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<MockState>,
}

impl MockBackend {
    /// Start a backend that answers `/health-check` with 200 and every other
    /// path with its own address.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(MockState {
            addr,
            health_status: AtomicU16::new(200),
            delay_ms: AtomicU64::new(0),
            hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/health-check", get(health_handler))
            .fallback(echo_handler)
            .with_state(state.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { state }
    }

    pub fn addr(&self) -> SocketAddr {
        self.state.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.state.addr)
    }

    /// Status code returned by `/health-check` from now on.
    pub fn set_health_status(&self, status: u16) {
        self.state.health_status.store(status, Ordering::SeqCst);
    }

    /// Delay applied before every response, including health checks.
    pub fn set_delay(&self, delay: Duration) {
        self.state.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Proxied (non health check) requests served so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

async fn delay(state: &MockState) {
    let ms = state.delay_ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

async fn health_handler(State(state): State<Arc<MockState>>) -> StatusCode {
    delay(&state).await;
    StatusCode::from_u16(state.health_status.load(Ordering::SeqCst)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn echo_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    delay(&state).await;
    state.hits.fetch_add(1, Ordering::SeqCst);

    let mut response = format!("backend {}", state.addr).into_response();
    let out = response.headers_mut();
    out.insert(BACKEND_HEADER, state.addr.to_string().parse().unwrap());
    for (received, echo) in [("x-forwarded-host", ECHO_FORWARDED_HOST), ("x-forwarded-for", ECHO_FORWARDED_FOR)] {
        if let Some(value) = headers.get(received) {
            out.insert(echo, value.clone());
        }
    }
    response
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn http_client() -> Client<HttpConnector, Body> {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Validated config for `servers` with health checks off, adjusted by `tweak`.
pub fn config_for(servers: &[String], tweak: impl FnOnce(&mut BalancerConfig)) -> ValidatedConfig {
    let mut config = BalancerConfig {
        servers: servers.to_vec(),
        health_check: false,
        ..Default::default()
    };
    tweak(&mut config);
    ValidatedConfig::try_from(config).unwrap()
}

pub fn client_addr() -> SocketAddr {
    "192.0.2.10:40000".parse().unwrap()
}

pub fn get_request(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(path: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Backend address reported by a proxied response.
pub fn served_by(response: &Response) -> String {
    response
        .headers()
        .get(BACKEND_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// The `name=value` pair of a `Set-Cookie` header, ready to send back.
pub fn cookie_pair(response: &Response) -> Option<String> {
    response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
