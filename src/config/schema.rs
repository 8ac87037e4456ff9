//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.
//! Top-level flags also accept the camelCase spellings used by older
//! YAML-era configs (`stickySessions`, `selectionType`, ...).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Backend base URLs, in pool order (index = server id).
    pub servers: Vec<String>,

    /// Pin clients to a backend through the affinity cookie.
    #[serde(alias = "stickySessions")]
    pub sticky_sessions: bool,

    /// Run the background health monitor.
    #[serde(alias = "healthCheck")]
    pub health_check: bool,

    /// Terminate TLS on `listener.tls_bind_address`.
    pub tls: bool,

    /// Enforce the per-client fixed-window request quota.
    #[serde(alias = "rateLimit")]
    pub rate_limit: bool,

    /// Server selection algorithm, fixed for the process lifetime.
    #[serde(alias = "selectionType", alias = "type")]
    pub selection_type: SelectionType,

    /// What to do when no backend is healthy.
    #[serde(alias = "noHealthyPolicy")]
    pub no_healthy_policy: NoHealthyPolicy,

    /// Listener configuration (bind addresses).
    pub listener: ListenerConfig,

    /// Certificate files used when `tls` is enabled.
    pub certificates: CertificateConfig,

    /// Health probe settings.
    pub health: HealthConfig,

    /// Rate limiter settings.
    pub limiter: LimiterConfig,

    /// Affinity cookie settings.
    pub sticky: StickyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            sticky_sessions: false,
            health_check: true,
            tls: false,
            rate_limit: false,
            selection_type: SelectionType::default(),
            no_healthy_policy: NoHealthyPolicy::default(),
            listener: ListenerConfig::default(),
            certificates: CertificateConfig::default(),
            health: HealthConfig::default(),
            limiter: LimiterConfig::default(),
            sticky: StickyConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Server selection algorithm.
///
/// Unknown names fail deserialization, which makes them a fatal startup error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    #[default]
    RoundRobin,
    LeastConnections,
}

impl std::fmt::Display for SelectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionType::RoundRobin => f.write_str("roundrobin"),
            SelectionType::LeastConnections => f.write_str("leastconnections"),
        }
    }
}

/// Behavior when the healthy subset is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoHealthyPolicy {
    /// Answer 503 Service Unavailable.
    #[default]
    FailClosed,
    /// Select from the whole pool, ignoring health.
    FailOpen,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Plain HTTP bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// HTTPS bind address, used when `tls = true`.
    pub tls_bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls_bind_address: "0.0.0.0:8443".to_string(),
        }
    }
}

/// TLS certificate locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Path to certificate chain (PEM).
    pub cert_path: String,

    /// Path to private key (PEM).
    pub key_path: String,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            cert_path: "./certs/cert.pem".to_string(),
            key_path: "./certs/key.pem".to_string(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Seconds between probe cycles.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Path appended to each backend base URL.
    pub path: String,
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            timeout_secs: 5,
            path: "/health-check".to_string(),
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Requests admitted per client per window.
    pub requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Windows idle for this many window lengths are evicted.
    pub idle_windows: u32,
}

impl LimiterConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            requests: 100,
            window_secs: 60,
            idle_windows: 10,
        }
    }
}

/// Affinity cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StickyConfig {
    pub cookie_name: String,
    pub max_age_secs: u64,
}

impl Default for StickyConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sticky-session".to_string(),
            max_age_secs: 3600,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for a backend to produce response headers, in seconds.
    pub upstream_secs: u64,
}

impl TimeoutConfig {
    pub fn upstream(&self) -> Duration {
        Duration::from_secs(self.upstream_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { upstream_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
