//! Least Connections load balancing strategy.

use std::sync::{Arc, Mutex, PoisonError};

use crate::load_balancer::{
    backend::{LoadGuard, ServerEntry},
    SelectionStrategy,
};

/// Least connections selector.
/// Selects the backend with the minimum number of active connections;
/// ties go to the lowest server id.
#[derive(Debug, Default)]
pub struct LeastConnections {
    // Serializes scan + increment so two selections never read the same
    // snapshot of counters.
    select_lock: Mutex<()>,
}

impl LeastConnections {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for LeastConnections {
    fn name(&self) -> &'static str {
        "leastconnections"
    }

    fn next_server(&self, candidates: &[Arc<ServerEntry>]) -> Option<Arc<ServerEntry>> {
        candidates
            .iter()
            .min_by_key(|s| (s.active_connections(), s.id))
            .cloned()
    }

    fn acquire(&self, candidates: &[Arc<ServerEntry>]) -> Option<LoadGuard> {
        let _held = self.select_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.next_server(candidates).map(|server| server.acquire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn servers(n: usize) -> Vec<Arc<ServerEntry>> {
        (0..n)
            .map(|id| {
                let url = Url::parse(&format!("http://127.0.0.1:{}", 9000 + id)).unwrap();
                Arc::new(ServerEntry::new(id, url))
            })
            .collect()
    }

    #[test]
    fn test_least_conn() {
        let lb = LeastConnections::new();
        let backends = servers(2);

        // artificially increase connections on b0
        backends[0].inc_connections();

        // Should pick b1 (0 connections)
        let s1 = lb.next_server(&backends).unwrap();
        assert_eq!(s1.id, 1);

        // now b1 has 2, b0 has 1
        backends[1].inc_connections();
        backends[1].inc_connections();

        let s2 = lb.next_server(&backends).unwrap();
        assert_eq!(s2.id, 0);
    }

    #[test]
    fn ties_go_to_lowest_id() {
        let lb = LeastConnections::new();
        let backends = servers(3);
        // Present them out of order; the id still decides.
        let shuffled = vec![backends[2].clone(), backends[1].clone(), backends[0].clone()];
        assert_eq!(lb.next_server(&shuffled).unwrap().id, 0);

        backends[0].inc_connections();
        assert_eq!(lb.next_server(&shuffled).unwrap().id, 1);
    }

    #[test]
    fn chosen_is_never_above_any_candidate() {
        let lb = LeastConnections::new();
        let backends = servers(4);
        for (server, load) in backends.iter().zip([3, 1, 4, 1]) {
            for _ in 0..load {
                server.inc_connections();
            }
        }
        let chosen = lb.next_server(&backends).unwrap();
        assert_eq!(chosen.id, 1);
        assert!(backends.iter().all(|s| chosen.active_connections() <= s.active_connections()));
    }

    #[test]
    fn acquire_increments_chosen() {
        let lb = LeastConnections::new();
        let backends = servers(2);
        let g0 = lb.acquire(&backends).unwrap();
        let g1 = lb.acquire(&backends).unwrap();
        assert_eq!((g0.id, g1.id), (0, 1));
        assert_eq!(backends[0].active_connections(), 1);
        assert_eq!(backends[1].active_connections(), 1);
    }

    #[test]
    fn concurrent_acquires_lose_no_increment() {
        let lb = Arc::new(LeastConnections::new());
        let backends = Arc::new(servers(3));
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let lb = lb.clone();
                let backends = backends.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| lb.acquire(&backends).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let guards: Vec<_> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        let total: usize = backends.iter().map(|s| s.active_connections()).sum();
        assert_eq!(total, 600);
        // Serialized selection keeps the spread perfectly even.
        assert!(backends.iter().all(|s| s.active_connections() == 200));

        drop(guards);
        assert!(backends.iter().all(|s| s.active_connections() == 0));
    }
}
