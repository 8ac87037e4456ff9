//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the wildcard proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to a plain or TLS listener
//! - Start background tasks (health monitor, rate window sweeper)
//! - Stop everything on the shutdown broadcast

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{BalancerConfig, ValidatedConfig};
use crate::health::HealthMonitor;
use crate::http::dispatcher::Dispatcher;
use crate::http::request::{make_span, X_REQUEST_ID};

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP front end of the load balancer.
pub struct HttpServer {
    router: Router,
    config: BalancerConfig,
    dispatcher: Arc<Dispatcher>,
    client: Client<HttpConnector, Body>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(validated: ValidatedConfig) -> Self {
        // One client shared by proxying and health probes.
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let dispatcher = Arc::new(Dispatcher::new(&validated, client.clone()));

        let state = AppState {
            dispatcher: dispatcher.clone(),
        };
        let router = Self::build_router(state);

        Self {
            router,
            config: validated.config,
            dispatcher,
            client,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| make_span(request)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID));

        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// Spawn the health monitor and rate window sweeper, if enabled.
    fn spawn_background_tasks(&self, shutdown: &broadcast::Receiver<()>) {
        if self.config.health_check {
            let monitor = HealthMonitor::new(
                self.dispatcher.pool().clone(),
                self.config.health.clone(),
                self.client.clone(),
            );
            tokio::spawn(monitor.run(shutdown.resubscribe()));
        } else {
            tracing::info!("Active health checks disabled");
        }

        if let Some(limiter) = self.dispatcher.limiter() {
            tokio::spawn(limiter.clone().run_sweeper(shutdown.resubscribe()));
        }
    }

    /// Run the server, accepting plain HTTP connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        self.spawn_background_tasks(&shutdown);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server terminating TLS on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        self.spawn_background_tasks(&shutdown);

        let handle = axum_server::Handle::new();
        let trigger = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            trigger.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls).handle(handle).serve(app).await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Wildcard handler: every method, every path.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    state.dispatcher.dispatch(client_addr, request).await
}
