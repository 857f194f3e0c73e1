//! Dual sliding-window admission control matching Riot's development key
//! limits: 20 requests per second and 100 requests per two minutes.

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::trace;

use crate::clock::Clock;
use crate::error::AppError;
use crate::shutdown::Shutdown;

const SHORT_HORIZON: Duration = Duration::from_secs(1);
const LONG_HORIZON: Duration = Duration::from_secs(120);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Bounded ring of admission timestamps covering one horizon.
#[derive(Debug)]
struct SlidingWindow {
    capacity: usize,
    horizon: Duration,
    stamps: VecDeque<Instant>,
}

impl SlidingWindow {
    fn new(capacity: NonZeroU32, horizon: Duration) -> Self {
        let capacity = capacity.get() as usize;
        Self {
            capacity,
            horizon,
            stamps: VecDeque::with_capacity(capacity),
        }
    }

    /// Drop every stamp strictly older than the horizon. A stamp exactly one
    /// horizon old still counts.
    fn evict(&mut self, now: Instant) {
        while let Some(oldest) = self.stamps.front() {
            if now.saturating_duration_since(*oldest) > self.horizon {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn has_room(&self) -> bool {
        self.stamps.len() < self.capacity
    }

    fn record(&mut self, now: Instant) {
        if self.stamps.len() == self.capacity {
            self.stamps.pop_front();
        }
        self.stamps.push_back(now);
    }
}

#[derive(Debug)]
struct Windows {
    short: SlidingWindow,
    long: SlidingWindow,
}

pub struct RateLimiter {
    windows: Mutex<Windows>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_capacities(
            NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN),
            NonZeroU32::new(100).unwrap_or(NonZeroU32::MIN),
            clock,
        )
    }

    pub fn with_capacities(
        per_second: NonZeroU32,
        per_two_minutes: NonZeroU32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            windows: Mutex::new(Windows {
                short: SlidingWindow::new(per_second, SHORT_HORIZON),
                long: SlidingWindow::new(per_two_minutes, LONG_HORIZON),
            }),
            clock,
        }
    }

    /// Wait until one more request fits in both windows, then record it.
    pub async fn admit(&self, shutdown: &Shutdown) -> Result<(), AppError> {
        loop {
            if shutdown.is_requested() {
                return Err(AppError::Cancelled);
            }

            {
                let mut windows = self.windows.lock().await;
                let now = self.clock.now();
                windows.short.evict(now);
                windows.long.evict(now);

                if windows.short.has_room() && windows.long.has_room() {
                    windows.short.record(now);
                    windows.long.record(now);
                    return Ok(());
                }

                trace!(
                    short = windows.short.stamps.len(),
                    long = windows.long.stamps.len(),
                    "🚦 Rate limit window full, waiting"
                );
            }

            shutdown.guard(self.clock.sleep(POLL_INTERVAL)).await?;
        }
    }

    /// Current occupancy of the (short, long) windows.
    pub async fn window_lengths(&self) -> (usize, usize) {
        let windows = self.windows.lock().await;
        (windows.short.stamps.len(), windows.long.stamps.len())
    }
}
