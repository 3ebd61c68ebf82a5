use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Time budget for a polling match, and the pause between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedPeriod {
    /// How long to keep retrying after the first failed attempt.
    pub timeout: Duration,
    /// Pause between attempts.
    pub pause: Duration,
}

impl Default for TimedPeriod {
    fn default() -> Self {
        Self::from_millis(2_000, 500)
    }
}

impl TimedPeriod {
    pub fn new(timeout: Duration, pause: Duration) -> Self {
        Self { timeout, pause }
    }

    pub fn from_millis(timeout_ms: u64, pause_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(pause_ms),
        )
    }

    /// A single attempt, no retries.
    pub fn once() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Deadline measured from now.
    pub fn start(&self) -> Deadline {
        Deadline(Instant::now() + self.timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn expired(&self) -> bool {
        Instant::now() > self.0
    }

    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }
}
