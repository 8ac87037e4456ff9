//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher / sticky sessions ask the Balancer for a server
//!     → pool.rs (healthy subset snapshot)
//!     → Apply the configured strategy:
//!         - round_robin.rs (rotate through healthy servers)
//!         - least_conn.rs (pick server with fewest in-flight requests)
//!     → backend.rs (LoadGuard increments, drop decrements)
//!     → Empty subset: NoHealthyPolicy decides 503 vs fail-open
//! ```
//!
//! # Design Decisions
//! - Strategy chosen once at startup; the Dispatcher only sees the trait
//! - Unhealthy backends excluded from selection
//! - Load is a hint, not a lease: no per-backend connection cap

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod round_robin;

use std::fmt::Debug;
use std::sync::Arc;

use crate::config::{NoHealthyPolicy, SelectionType};
use crate::error::BalancerError;
use backend::{LoadGuard, ServerEntry};
use least_conn::LeastConnections;
use pool::ServerPool;
use round_robin::RoundRobin;

/// A server selection algorithm.
pub trait SelectionStrategy: Debug + Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Pick one of `candidates`, or `None` if there are none.
    fn next_server(&self, candidates: &[Arc<ServerEntry>]) -> Option<Arc<ServerEntry>>;

    /// Pick a server and take one unit of load on it.
    ///
    /// Strategies that read load must override this so the read and the
    /// increment are one atomic step.
    fn acquire(&self, candidates: &[Arc<ServerEntry>]) -> Option<LoadGuard> {
        self.next_server(candidates).map(|server| server.acquire())
    }
}

/// Build the strategy named in configuration.
pub fn build_strategy(kind: SelectionType) -> Box<dyn SelectionStrategy> {
    match kind {
        SelectionType::RoundRobin => Box::new(RoundRobin::new()),
        SelectionType::LeastConnections => Box::new(LeastConnections::new()),
    }
}

/// Pool + strategy + the policy for an empty healthy subset.
#[derive(Debug)]
pub struct Balancer {
    pool: Arc<ServerPool>,
    strategy: Box<dyn SelectionStrategy>,
    policy: NoHealthyPolicy,
}

impl Balancer {
    pub fn new(
        pool: Arc<ServerPool>,
        strategy: Box<dyn SelectionStrategy>,
        policy: NoHealthyPolicy,
    ) -> Self {
        tracing::info!(
            strategy = strategy.name(),
            servers = pool.len(),
            policy = ?policy,
            "Load balancer ready"
        );
        Self {
            pool,
            strategy,
            policy,
        }
    }

    pub fn pool(&self) -> &Arc<ServerPool> {
        &self.pool
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Select a server from the healthy subset and hold load on it.
    pub fn select(&self) -> Result<LoadGuard, BalancerError> {
        let healthy = self.pool.healthy_servers();
        if let Some(guard) = self.strategy.acquire(&healthy) {
            return Ok(guard);
        }

        match self.policy {
            NoHealthyPolicy::FailClosed => {
                tracing::debug!(servers = self.pool.len(), "No healthy servers in pool");
                Err(BalancerError::NoHealthyServer)
            }
            NoHealthyPolicy::FailOpen => {
                tracing::warn!("No healthy servers, failing open over the whole pool");
                self.strategy
                    .acquire(self.pool.all_servers())
                    .ok_or(BalancerError::NoHealthyServer)
            }
        }
    }
}
