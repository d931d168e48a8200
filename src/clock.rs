use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::model::Tick;

/// Process-wide logical clock. Monotonically non-decreasing; the engine only
/// reads it, a ticker task (or a test) advances it.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    now: Arc<AtomicI64>,
}

impl Clock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(t: Tick) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(t)),
        }
    }

    pub fn now(&self) -> Tick {
        self.now.load(Ordering::Acquire)
    }

    /// Move time forward by `by` ticks (negative values are ignored).
    pub fn advance(&self, by: Tick) -> Tick {
        let by = by.max(0);
        self.now.fetch_add(by, Ordering::AcqRel) + by
    }
}

/// Background task that advances `clock` by one tick every `period`.
pub async fn run_ticker(clock: Clock, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // First tick completes immediately; time starts at the current value.
    interval.tick().await;
    loop {
        interval.tick().await;
        let now = clock.advance(1);
        debug!(now, "clock tick");
    }
}
