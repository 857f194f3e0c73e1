use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for the Riot API requests issued during one run.
#[derive(Debug)]
pub struct RequestMetrics {
    start: Instant,
    requests: AtomicU64,
    throttled: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            requests: AtomicU64::new(0),
            throttled: AtomicU64::new(0),
        })
    }

    pub fn inc(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_throttled(&self) {
        self.throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn throttled(&self) -> u64 {
        self.throttled.load(Ordering::Relaxed)
    }

    pub fn log_summary(&self) {
        let total = self.requests();
        let elapsed_min = self.start.elapsed().as_secs_f64() / 60.0;
        let avg = if elapsed_min > 0.0 {
            total as f64 / elapsed_min
        } else {
            0.0
        };
        tracing::info!(
            requests = total,
            throttled = self.throttled(),
            "📊 {} requests executed (avg {:.2} req/min)",
            total,
            avg
        );
    }
}
