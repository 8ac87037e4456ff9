//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::ServerEntry, SelectionStrategy};

/// Round-robin selector.
/// The cursor indexes into whatever the healthy subset is at call time,
/// so each call advances exactly one position modulo the current count.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn name(&self) -> &'static str {
        "roundrobin"
    }

    fn next_server(&self, candidates: &[Arc<ServerEntry>]) -> Option<Arc<ServerEntry>> {
        let len = candidates.len();
        if len == 0 {
            return None;
        }

        // Closure always returns Some, so fetch_update cannot fail.
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);
        candidates.get((previous + 1) % len).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn servers(n: usize) -> Vec<Arc<ServerEntry>> {
        (0..n)
            .map(|id| {
                let url = Url::parse(&format!("http://127.0.0.1:{}", 8080 + id)).unwrap();
                Arc::new(ServerEntry::new(id, url))
            })
            .collect()
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let backends = servers(2);

        let s1 = lb.next_server(&backends).unwrap();
        assert_eq!(s1.id, 1);

        let s2 = lb.next_server(&backends).unwrap();
        assert_eq!(s2.id, 0);

        let s3 = lb.next_server(&backends).unwrap();
        assert_eq!(s3.id, 1);
    }

    #[test]
    fn visits_each_server_once_per_cycle() {
        for n in 1..=7 {
            let lb = RoundRobin::new();
            let backends = servers(n);
            let first: Vec<_> = (0..n).map(|_| lb.next_server(&backends).unwrap().id).collect();
            let second: Vec<_> = (0..n).map(|_| lb.next_server(&backends).unwrap().id).collect();

            let mut sorted = first.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..n).collect::<Vec<_>>(), "n = {n}");
            assert_eq!(first, second, "order must be stable for n = {n}");
        }
    }

    #[test]
    fn adapts_to_shrinking_subset() {
        let lb = RoundRobin::new();
        let backends = servers(4);
        for _ in 0..3 {
            lb.next_server(&backends);
        }
        // Cursor is 3; a two-element subset wraps it to 0.
        let subset = vec![backends[0].clone(), backends[2].clone()];
        assert_eq!(lb.next_server(&subset).unwrap().id, 0);
        assert_eq!(lb.next_server(&subset).unwrap().id, 2);
    }

    #[test]
    fn empty_subset_yields_none() {
        assert!(RoundRobin::new().next_server(&[]).is_none());
    }

    #[test]
    fn concurrent_selections_are_balanced() {
        let lb = Arc::new(RoundRobin::new());
        let backends = Arc::new(servers(4));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lb = lb.clone();
                let backends = backends.clone();
                std::thread::spawn(move || {
                    let mut counts = [0usize; 4];
                    for _ in 0..1000 {
                        counts[lb.next_server(&backends).unwrap().id] += 1;
                    }
                    counts
                })
            })
            .collect();

        let mut totals = [0usize; 4];
        for handle in handles {
            for (total, count) in totals.iter_mut().zip(handle.join().unwrap()) {
                *total += count;
            }
        }
        assert_eq!(totals, [2000; 4]);
    }
}
