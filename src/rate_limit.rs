use dashmap::DashMap;
use std::time::{Duration, Instant};

// Fixed window per source address
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    pub count: u32,
    pub window_start: Instant,
}

// Admission control for increments. Bursts straddling two windows can exceed
// the limit, and entries are never evicted.
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn admit(&self, source: &str) -> bool {
        self.admit_at(source, Instant::now())
    }

    // The entry guard holds the shard lock for the whole check-and-update
    pub fn admit_at(&self, source: &str, now: Instant) -> bool {
        let mut entry = self
            .windows
            .entry(source.to_string())
            .or_insert(RateWindow {
                count: 0,
                window_start: now,
            });

        // window expired..? start a new one
        if now.saturating_duration_since(entry.window_start) > self.window {
            entry.count = 1;
            entry.window_start = now;
            return true;
        }

        // over limit, leave the window as it is
        if entry.count >= self.max_requests {
            return false;
        }

        entry.count += 1;
        true
    }

    pub fn tracked_sources(&self) -> usize {
        self.windows.len()
    }

    #[cfg(test)]
    pub fn window_of(&self, source: &str) -> Option<RateWindow> {
        self.windows.get(source).map(|entry| *entry)
    }
}
