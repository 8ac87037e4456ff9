//! Per-request pipeline.
//!
//! ```text
//! rate limit → (sticky | balancer) → rewrite + forward → relay
//! ```
//!
//! Load on the chosen backend is held from selection until the relayed
//! response body has been fully sent or dropped.

use axum::body::Body;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, Request, Uri, Version};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time;

use crate::config::ValidatedConfig;
use crate::error::BalancerError;
use crate::http::request::request_id;
use crate::load_balancer::backend::LoadGuard;
use crate::load_balancer::pool::ServerPool;
use crate::load_balancer::{build_strategy, Balancer};
use crate::observability::metrics;
use crate::security::headers::{prepare_forward_headers, strip_hop_by_hop};
use crate::security::{RateDecision, RateLimiter};
use crate::session::StickySessions;

/// Composes the rate limiter, affinity, selection and forwarding.
#[derive(Debug)]
pub struct Dispatcher {
    balancer: Arc<Balancer>,
    sticky: Option<StickySessions>,
    limiter: Option<Arc<RateLimiter>>,
    client: Client<HttpConnector, Body>,
    upstream_timeout: Duration,
}

impl Dispatcher {
    /// Build the pool and every enabled component from configuration.
    pub fn new(validated: &ValidatedConfig, client: Client<HttpConnector, Body>) -> Self {
        let config = &validated.config;
        let pool = Arc::new(ServerPool::new(validated.server_urls.clone()));
        let balancer = Arc::new(Balancer::new(
            pool,
            build_strategy(config.selection_type),
            config.no_healthy_policy,
        ));

        let sticky = config
            .sticky_sessions
            .then(|| StickySessions::new(balancer.clone(), &config.sticky));
        let limiter = config
            .rate_limit
            .then(|| Arc::new(RateLimiter::new(&config.limiter)));

        Self {
            balancer,
            sticky,
            limiter,
            client,
            upstream_timeout: config.timeouts.upstream(),
        }
    }

    pub fn pool(&self) -> &Arc<ServerPool> {
        self.balancer.pool()
    }

    pub fn limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.limiter.as_ref()
    }

    /// Handle one inbound request from `client_addr`.
    pub async fn dispatch(&self, client_addr: SocketAddr, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().to_string();
        let request_id = request_id(request.headers()).to_string();

        // 1. Rate limit
        if let Some(limiter) = &self.limiter {
            let client = client_addr.ip().to_string();
            if let RateDecision::Reject { retry_after } = limiter.check(&client) {
                tracing::info!(request_id = %request_id, client = %client, "Rate limit exceeded");
                metrics::record_rate_limited();
                metrics::record_request(&method, 429, "none", start);
                return BalancerError::RateLimited { client, retry_after }.into_response();
            }
        }

        // 2. Select backend (sticky or strategy)
        let (guard, set_cookie) = match self.route(request.headers()) {
            Ok(routed) => routed,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "No backend selected");
                metrics::record_request(&method, e.status().as_u16(), "none", start);
                return e.into_response();
            }
        };
        let backend = guard.base().to_string();
        tracing::debug!(
            request_id = %request_id,
            server_id = guard.id,
            backend = %backend,
            strategy = self.balancer.strategy_name(),
            "Proxying request"
        );

        // 3. Forward
        let mut response = match self.forward(guard, client_addr, request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(request_id = %request_id, backend = %backend, error = %e, "Upstream error");
                e.into_response()
            }
        };

        if let Some(cookie) = set_cookie {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        metrics::record_request(&method, response.status().as_u16(), &backend, start);
        response
    }

    fn route(&self, headers: &HeaderMap) -> Result<(LoadGuard, Option<HeaderValue>), BalancerError> {
        match &self.sticky {
            Some(sticky) => {
                let route = sticky.route(headers)?;
                Ok((route.guard, route.set_cookie))
            }
            None => Ok((self.balancer.select()?, None)),
        }
    }

    async fn forward(
        &self,
        guard: LoadGuard,
        client_addr: SocketAddr,
        request: Request<Body>,
    ) -> Result<Response, BalancerError> {
        let (mut parts, body) = request.into_parts();

        let request_authority = parts.uri.authority().map(|a| a.to_string());
        let uri = upstream_uri(guard.base(), &parts.uri)?;
        let authority = uri.authority().map(|a| a.to_string()).unwrap_or_default();
        prepare_forward_headers(
            &mut parts.headers,
            client_addr.ip(),
            request_authority.as_deref(),
            &authority,
        );
        parts.uri = uri;
        // Upstream connections are HTTP/1.1 regardless of the client's protocol.
        parts.version = Version::HTTP_11;

        let upstream = Request::from_parts(parts, body);
        let response = match time::timeout(self.upstream_timeout, self.client.request(upstream)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(BalancerError::BackendUnreachable {
                    backend: guard.base().to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(BalancerError::BackendUnreachable {
                    backend: guard.base().to_string(),
                    reason: format!("no response within {:?}", self.upstream_timeout),
                });
            }
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        // The guard rides along with the body stream and is released when it ends.
        let body = Body::new(body).into_data_stream().map(move |chunk| {
            let _load = &guard;
            chunk
        });
        Ok(Response::from_parts(parts, Body::from_stream(body)))
    }
}

/// Point `original` at the backend, keeping path and query and prefixing the
/// backend's base path.
fn upstream_uri(base: &str, original: &Uri) -> Result<Uri, BalancerError> {
    let path_and_query = original.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{base}{path_and_query}")
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| BalancerError::UpstreamRequest(e.to_string()))
}
