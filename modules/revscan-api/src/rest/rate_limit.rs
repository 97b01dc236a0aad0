use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Analyses allowed per client address in any rolling hour. Each analysis
/// costs one billed provider call per queried domain.
pub const ANALYSES_PER_HOUR: usize = 10;

const WINDOW: Duration = Duration::from_secs(3600);

/// Tracked addresses above which idle ones are swept on the next request.
const SWEEP_THRESHOLD: usize = 1000;

/// Sliding-window request budget keyed by client address.
pub struct RateLimiter {
    limit: usize,
    hits: Mutex<HashMap<IpAddr, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Spend one unit of `ip`'s budget at `now`. Returns false, and records
    /// nothing, once the address has used its whole window.
    pub async fn try_acquire(&self, ip: IpAddr, now: Instant) -> bool {
        let mut hits = self.hits.lock().await;
        let cutoff = now.checked_sub(WINDOW);
        let live = |t: &Instant| cutoff.map_or(true, |c| *t > c);

        if hits.len() > SWEEP_THRESHOLD {
            hits.retain(|_, times| {
                times.retain(live);
                !times.is_empty()
            });
        }

        let times = hits.entry(ip).or_default();
        times.retain(live);
        if times.len() >= self.limit {
            return false;
        }
        times.push(now);
        true
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.hits.lock().await.len()
    }
}
