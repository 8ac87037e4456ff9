//! Startup orchestration.
//!
//! Order: metrics exporter → server (pool, strategy, limiter) → signal
//! watcher → listener. Traffic is accepted only once everything is built.

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ValidatedConfig;
use crate::error::StartupError;
use crate::http::HttpServer;
use crate::lifecycle::{signals::shutdown_signal, Shutdown};
use crate::net::tls::load_tls_config;
use crate::observability::metrics;

/// Run the balancer until a shutdown signal arrives.
pub async fn run(validated: ValidatedConfig) -> Result<(), StartupError> {
    let config = validated.config.clone();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        servers = validated.server_urls.len(),
        selection = %config.selection_type,
        sticky_sessions = config.sticky_sessions,
        health_check = config.health_check,
        rate_limit = config.rate_limit,
        tls = config.tls,
        "Configuration loaded"
    );

    let server = HttpServer::new(validated);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    if config.tls {
        let address = config.listener.tls_bind_address;
        let addr: SocketAddr = address.parse().map_err(|e| StartupError::Bind {
            address: address.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        })?;
        let tls = load_tls_config(&config.certificates).await?;
        server.run_tls(addr, tls, server_shutdown).await?;
    } else {
        let address = config.listener.bind_address;
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind { address, source })?;
        server.run(listener, server_shutdown).await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
