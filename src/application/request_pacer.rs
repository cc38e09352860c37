//! Per-worker politeness delay

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum gap between the starts of successive requests.
///
/// Each worker owns one; the first request is never delayed.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    last_start: Option<Instant>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next request may start, then record its start time
    pub async fn wait_turn(&mut self) {
        if let Some(last) = self.last_start {
            tokio::time::sleep_until(last + self.min_interval).await;
        }
        self.last_start = Some(Instant::now());
    }
}
