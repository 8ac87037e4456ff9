//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse backend URLs once and reject unusable ones
//! - Validate value ranges (intervals, windows, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<Vec<Url>, Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::BalancerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one server is required")]
    NoServers,

    #[error("server `{url}` is not a valid URL: {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("server `{url}` uses unsupported scheme `{scheme}` (only http is proxied)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("server `{0}` is listed more than once")]
    DuplicateServer(String),

    #[error("`{field}` must be greater than zero")]
    Zero { field: &'static str },

    #[error("`{field}` is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a configuration and return the parsed server URLs in pool order.
pub fn validate_config(config: &BalancerConfig) -> Result<Vec<Url>, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let urls = parse_servers(&config.servers, &mut errors);

    if config.health_check {
        if config.health.interval_secs == 0 {
            errors.push(ValidationError::Zero { field: "health.interval_secs" });
        }
        if config.health.timeout_secs == 0 {
            errors.push(ValidationError::Zero { field: "health.timeout_secs" });
        }
    }

    if config.rate_limit {
        if config.limiter.requests == 0 {
            errors.push(ValidationError::Zero { field: "limiter.requests" });
        }
        if config.limiter.window_secs == 0 {
            errors.push(ValidationError::Zero { field: "limiter.window_secs" });
        }
        if config.limiter.idle_windows == 0 {
            errors.push(ValidationError::Zero { field: "limiter.idle_windows" });
        }
    }

    if config.sticky_sessions && config.sticky.max_age_secs == 0 {
        errors.push(ValidationError::Zero { field: "sticky.max_age_secs" });
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.upstream_secs" });
    }

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.tls {
        check_address("listener.tls_bind_address", &config.listener.tls_bind_address, &mut errors);
    }
    if config.observability.metrics_enabled {
        check_address("observability.metrics_address", &config.observability.metrics_address, &mut errors);
    }

    if errors.is_empty() {
        Ok(urls)
    } else {
        Err(errors)
    }
}

fn parse_servers(raw: &[String], errors: &mut Vec<ValidationError>) -> Vec<Url> {
    if raw.is_empty() {
        errors.push(ValidationError::NoServers);
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut urls = Vec::with_capacity(raw.len());
    for entry in raw {
        let url = match Url::parse(entry) {
            Ok(url) => url,
            Err(e) => {
                errors.push(ValidationError::InvalidServerUrl {
                    url: entry.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if url.scheme() != "http" {
            errors.push(ValidationError::UnsupportedScheme {
                url: entry.clone(),
                scheme: url.scheme().to_string(),
            });
            continue;
        }
        if url.host_str().is_none() {
            errors.push(ValidationError::InvalidServerUrl {
                url: entry.clone(),
                reason: "missing host".to_string(),
            });
            continue;
        }
        if !seen.insert(url.clone()) {
            errors.push(ValidationError::DuplicateServer(entry.clone()));
            continue;
        }
        urls.push(url);
    }
    urls
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(servers: &[&str]) -> BalancerConfig {
        BalancerConfig {
            servers: servers.iter().map(|s| s.to_string()).collect(),
            ..BalancerConfig::default()
        }
    }

    #[test]
    fn accepts_valid_servers_in_order() {
        let config = config_with(&["http://127.0.0.1:8081", "http://127.0.0.1:8082/api"]);
        let urls = validate_config(&config).unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].port(), Some(8081));
        assert_eq!(urls[1].path(), "/api");
    }

    #[test]
    fn collects_every_error() {
        let mut config = config_with(&["not a url", "https://secure:443", "http://a:1", "http://a:1"]);
        config.rate_limit = true;
        config.limiter.requests = 0;
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidServerUrl { .. }));
        assert!(matches!(errors[1], ValidationError::UnsupportedScheme { .. }));
        assert_eq!(errors[2], ValidationError::DuplicateServer("http://a:1".into()));
        assert!(errors.contains(&ValidationError::Zero { field: "limiter.requests" }));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidAddress { field: "listener.bind_address", .. })));
    }

    #[test]
    fn rejects_empty_pool() {
        let errors = validate_config(&config_with(&[])).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoServers]);
    }

    #[test]
    fn disabled_features_skip_their_checks() {
        let mut config = config_with(&["http://127.0.0.1:8081"]);
        config.health_check = false;
        config.health.interval_secs = 0;
        config.rate_limit = false;
        config.limiter.window_secs = 0;
        assert!(validate_config(&config).is_ok());
    }
}
