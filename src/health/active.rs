//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend concurrently
//! - Join all probes of a cycle before the next one starts
//! - Update backend health state based on results

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use futures_util::future::join_all;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthConfig;
use crate::load_balancer::backend::ServerEntry;
use crate::load_balancer::pool::ServerPool;
use crate::observability::metrics;

/// Why a single probe counted as a failure.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("invalid probe request: {0}")]
    Request(String),
}

pub struct HealthMonitor {
    pool: Arc<ServerPool>,
    config: HealthConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(pool: Arc<ServerPool>, config: HealthConfig, client: Client<HttpConnector, Body>) -> Self {
        Self { pool, config, client }
    }

    /// Probe on every interval until shutdown. The first cycle runs immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one probe cycle over the whole pool.
    pub async fn check_all(&self) {
        let probes = self.pool.all_servers().iter().map(|server| self.check_one(server));
        let results = join_all(probes).await;
        let healthy = results.iter().filter(|ok| **ok).count();
        tracing::debug!(healthy, total = results.len(), "Health check cycle complete");
    }

    async fn check_one(&self, server: &Arc<ServerEntry>) -> bool {
        let result = self.probe(server).await;
        server.record_probe();

        let healthy = match result {
            Ok(()) => {
                self.pool.mark_healthy(server.id);
                true
            }
            Err(failure) => {
                tracing::warn!(
                    server_id = server.id,
                    url = %server.base_url,
                    error = %failure,
                    "Health check failed"
                );
                self.pool.mark_unhealthy(server.id);
                false
            }
        };

        metrics::record_backend_health(server.base(), healthy);
        healthy
    }

    async fn probe(&self, server: &ServerEntry) -> Result<(), ProbeFailure> {
        let uri = format!("{}/{}", server.base(), self.config.path.trim_start_matches('/'));
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, "reverse-balancer-health-check")
            .body(Body::empty())
            .map_err(|e| ProbeFailure::Request(e.to_string()))?;

        let timeout = self.config.timeout();
        match time::timeout(timeout, self.client.request(request)).await {
            Err(_) => Err(ProbeFailure::Timeout(timeout)),
            Ok(Err(e)) => Err(ProbeFailure::Transport(e.to_string())),
            Ok(Ok(response)) if response.status() == StatusCode::OK => Ok(()),
            Ok(Ok(response)) => Err(ProbeFailure::Status(response.status())),
        }
    }
}
