//! Sticky session routing.
//!
//! A request carrying a valid token for a healthy pool member goes straight to
//! that member. Anything else (no cookie, undecodable cookie, dead or unknown
//! target) is routed by the balancer and receives a freshly issued cookie.

use axum::http::{HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

use crate::config::StickyConfig;
use crate::error::BalancerError;
use crate::load_balancer::backend::LoadGuard;
use crate::load_balancer::Balancer;
use crate::observability::metrics;
use crate::session::cookie::{find_cookie, set_cookie};
use crate::session::token::StickyToken;

/// How the affinity decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// The cookie's target was honored.
    Reused,
    /// No cookie was sent; a new one was issued.
    Issued,
    /// A cookie was sent but could not be honored; a new one was issued.
    Reissued,
}

impl Affinity {
    fn as_str(self) -> &'static str {
        match self {
            Affinity::Reused => "reused",
            Affinity::Issued => "issued",
            Affinity::Reissued => "reissued",
        }
    }
}

/// Result of routing one request with stickiness enabled.
#[derive(Debug)]
pub struct StickyRoute {
    pub guard: LoadGuard,
    /// `Set-Cookie` value to attach to the response, if a token was minted.
    pub set_cookie: Option<HeaderValue>,
    pub affinity: Affinity,
}

/// Cookie-based affinity on top of a [`Balancer`].
#[derive(Debug, Clone)]
pub struct StickySessions {
    balancer: Arc<Balancer>,
    cookie_name: String,
    max_age: Duration,
}

impl StickySessions {
    pub fn new(balancer: Arc<Balancer>, config: &StickyConfig) -> Self {
        Self {
            balancer,
            cookie_name: config.cookie_name.clone(),
            max_age: Duration::from_secs(config.max_age_secs),
        }
    }

    /// Route a request given its headers.
    pub fn route(&self, headers: &HeaderMap) -> Result<StickyRoute, BalancerError> {
        let route = match find_cookie(headers, &self.cookie_name) {
            None => self.issue(Affinity::Issued)?,
            Some(value) => match self.reuse(value) {
                Some(guard) => StickyRoute {
                    guard,
                    set_cookie: None,
                    affinity: Affinity::Reused,
                },
                None => self.issue(Affinity::Reissued)?,
            },
        };
        metrics::record_sticky(route.affinity.as_str());
        Ok(route)
    }

    fn reuse(&self, value: &str) -> Option<LoadGuard> {
        let token = match StickyToken::decode(value) {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed affinity cookie");
                return None;
            }
        };

        let pool = self.balancer.pool();
        match pool.find_healthy(&token.target) {
            Some(server) => Some(server.acquire()),
            None => {
                tracing::debug!(
                    session_id = %token.session_id,
                    target = %token.target,
                    "Affinity target is not a healthy pool member, re-selecting"
                );
                None
            }
        }
    }

    fn issue(&self, affinity: Affinity) -> Result<StickyRoute, BalancerError> {
        let guard = self.balancer.select()?;
        let token = StickyToken::issue(guard.base_url.clone());
        let set_cookie = match set_cookie(&self.cookie_name, &token.encode(), self.max_age) {
            Ok(value) => Some(value),
            Err(e) => {
                // Only reachable with a cookie name that is not a valid header token.
                tracing::error!(error = %e, cookie = %self.cookie_name, "Cannot render affinity cookie");
                None
            }
        };
        tracing::debug!(
            session_id = %token.session_id,
            server_id = guard.id,
            "Issued affinity cookie"
        );
        Ok(StickyRoute {
            guard,
            set_cookie,
            affinity,
        })
    }
}
