//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track active connections (for Least Connections LB)
//! - Track health state (Healthy/Unhealthy) and the last probe time

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

/// Health State enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl From<bool> for HealthState {
    fn from(healthy: bool) -> Self {
        if healthy {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        }
    }
}

/// A single backend server.
#[derive(Debug)]
pub struct ServerEntry {
    /// Stable position in the pool.
    pub id: usize,
    /// Scheme, host and optional base path, parsed once at startup.
    pub base_url: Url,
    /// Number of requests currently routed here.
    active_connections: AtomicUsize,
    /// Optimistically true until the first failed probe.
    healthy: AtomicBool,
    /// Unix millis of the last completed probe; 0 = never probed.
    last_probe_at: AtomicU64,
}

impl ServerEntry {
    /// Create a new backend.
    pub fn new(id: usize, base_url: Url) -> Self {
        Self {
            id,
            base_url,
            active_connections: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
            last_probe_at: AtomicU64::new(0),
        }
    }

    /// Get the current number of active connections.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Acquire)
    }

    /// Increment active connection count.
    pub fn inc_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::AcqRel);
    }

    /// Decrement active connection count, never below zero.
    pub fn dec_connections(&self) {
        let result = self
            .active_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if result.is_err() {
            tracing::warn!(server_id = self.id, "Connection count already zero on decrement");
        }
    }

    /// Increment the load counter and return a guard that undoes it on drop.
    pub fn acquire(self: &Arc<Self>) -> LoadGuard {
        self.inc_connections();
        LoadGuard {
            server: Arc::clone(self),
        }
    }

    // --- Health Logic ---

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    pub fn health_state(&self) -> HealthState {
        self.is_healthy().into()
    }

    /// Store the new flag and return the previous state.
    pub(crate) fn set_healthy(&self, healthy: bool) -> HealthState {
        self.healthy.swap(healthy, Ordering::AcqRel).into()
    }

    /// Remember that a probe just completed.
    pub fn record_probe(&self) {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.last_probe_at.store(millis.max(1), Ordering::Release);
    }

    /// When the last probe completed, if any.
    pub fn last_probe_at(&self) -> Option<SystemTime> {
        match self.last_probe_at.load(Ordering::Acquire) {
            0 => None,
            millis => Some(UNIX_EPOCH + Duration::from_millis(millis)),
        }
    }

    /// Base URL without a trailing slash, used for joining paths and for
    /// affinity tokens.
    pub fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

/// A RAII guard that holds one unit of load on a server.
///
/// The count returns to its pre-request value however the request ends.
#[derive(Debug)]
pub struct LoadGuard {
    server: Arc<ServerEntry>,
}

impl LoadGuard {
    pub fn server(&self) -> &Arc<ServerEntry> {
        &self.server
    }
}

impl Deref for LoadGuard {
    type Target = ServerEntry;
    fn deref(&self) -> &Self::Target {
        &self.server
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.server.dec_connections();
    }
}
