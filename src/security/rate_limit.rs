//! Fixed-window rate limiting per client.
//!
//! Each client key gets `limit` requests per window. A window resets when a
//! request arrives more than `window` after it started, so a client can send
//! up to `2 × limit` requests across a boundary.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::LimiterConfig;
use crate::observability::metrics;

/// Accounting for one client key.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// Outcome of one rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admit { remaining: u32 },
    Reject { retry_after: Duration },
}

impl RateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, RateDecision::Admit { .. })
    }
}

/// Per-client fixed-window limiter. Each key is locked independently.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    limit: u32,
    window: Duration,
    idle_after: Duration,
}

impl RateLimiter {
    pub fn new(config: &LimiterConfig) -> Self {
        let window = config.window();
        Self {
            windows: DashMap::new(),
            limit: config.requests,
            window,
            idle_after: window.saturating_mul(config.idle_windows.max(1)),
        }
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Count one request from `key` at `now` and decide.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut entry = self.windows.entry(key.to_string()).or_insert(RateWindow {
            count: 0,
            window_start: now,
        });
        let window = entry.value_mut();

        if now.saturating_duration_since(window.window_start) > self.window {
            window.count = 0;
            window.window_start = now;
        }
        window.count = window.count.saturating_add(1);

        if window.count <= self.limit {
            RateDecision::Admit {
                remaining: self.limit - window.count,
            }
        } else {
            let elapsed = now.saturating_duration_since(window.window_start);
            RateDecision::Reject {
                retry_after: self.window.saturating_sub(elapsed),
            }
        }
    }

    /// Number of client windows currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Drop windows that started more than `idle_windows × window` before `now`.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.window_start) <= self.idle_after);
        before.saturating_sub(self.windows.len())
    }

    /// Periodically evict idle windows until shutdown.
    pub async fn run_sweeper(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.window);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.sweep(Instant::now());
                    if evicted > 0 {
                        tracing::debug!(evicted, remaining = self.tracked_clients(), "Swept idle rate windows");
                    }
                    metrics::record_tracked_clients(self.tracked_clients());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate window sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
