//! Backend pool registry.
//!
//! # Responsibilities
//! - Own the static set of backends, ordered by id
//! - Expose the healthy subset to selection strategies
//! - Apply health transitions and load accounting by server id

use std::sync::Arc;
use url::Url;

use crate::load_balancer::backend::{HealthState, LoadGuard, ServerEntry};

/// The fixed set of backends and their live state.
#[derive(Debug)]
pub struct ServerPool {
    servers: Vec<Arc<ServerEntry>>,
}

impl ServerPool {
    /// Build the pool; each URL's index becomes its server id.
    pub fn new(urls: Vec<Url>) -> Self {
        let servers = urls
            .into_iter()
            .enumerate()
            .map(|(id, url)| Arc::new(ServerEntry::new(id, url)))
            .collect();
        Self { servers }
    }

    /// Every backend, in id order.
    pub fn all_servers(&self) -> &[Arc<ServerEntry>] {
        &self.servers
    }

    /// Snapshot of the backends currently marked healthy, in id order.
    pub fn healthy_servers(&self) -> Vec<Arc<ServerEntry>> {
        self.servers
            .iter()
            .filter(|s| s.is_healthy())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Arc<ServerEntry>> {
        self.servers.get(id)
    }

    /// Find a healthy member whose base URL equals `url`.
    pub fn find_healthy(&self, url: &Url) -> Option<&Arc<ServerEntry>> {
        self.servers
            .iter()
            .find(|s| s.is_healthy() && same_base(&s.base_url, url))
    }

    pub fn mark_healthy(&self, id: usize) {
        self.set_health(id, true);
    }

    pub fn mark_unhealthy(&self, id: usize) {
        self.set_health(id, false);
    }

    fn set_health(&self, id: usize, healthy: bool) {
        let Some(server) = self.get(id) else {
            tracing::warn!(server_id = id, "Health update for unknown server ignored");
            return;
        };
        let previous = server.set_healthy(healthy);
        match (previous, HealthState::from(healthy)) {
            (HealthState::Unhealthy, HealthState::Healthy) => {
                tracing::info!(server_id = id, url = %server.base_url, "Server recovered");
            }
            (HealthState::Healthy, HealthState::Unhealthy) => {
                tracing::warn!(server_id = id, url = %server.base_url, "Server marked unhealthy");
            }
            _ => {}
        }
    }

    pub fn increment_load(&self, id: usize) {
        match self.get(id) {
            Some(server) => server.inc_connections(),
            None => tracing::warn!(server_id = id, "Load increment for unknown server ignored"),
        }
    }

    pub fn decrement_load(&self, id: usize) {
        match self.get(id) {
            Some(server) => server.dec_connections(),
            None => tracing::warn!(server_id = id, "Load decrement for unknown server ignored"),
        }
    }

    /// Take one unit of load on `id`, released when the guard drops.
    pub fn acquire(&self, id: usize) -> Option<LoadGuard> {
        self.get(id).map(|server| server.acquire())
    }
}

// Trailing slashes are insignificant: "http://a:1" and "http://a:1/" name the same backend.
fn same_base(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
        && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
}
