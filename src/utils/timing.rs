//! Execution timing for domain checks.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Wall-clock duration of a check, in the three shapes callers display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionTime {
    /// Seconds with two decimals, e.g. `"12.34"`
    pub seconds: String,
    /// `HH:MM:SS`
    pub formatted: String,
    /// Raw milliseconds
    pub ms: u64,
}

impl From<Duration> for ExecutionTime {
    fn from(elapsed: Duration) -> Self {
        let ms = duration_to_ms(elapsed);
        let total_secs = ms / 1000;
        Self {
            seconds: format!("{:.2}", ms as f64 / 1000.0),
            formatted: format!(
                "{:02}:{:02}:{:02}",
                total_secs / 3600,
                (total_secs % 3600) / 60,
                total_secs % 60
            ),
            ms,
        }
    }
}

/// Stopwatch started at the beginning of a check.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionTimer {
    started: Instant,
}

impl ExecutionTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stops the timer and returns the breakdown.
    pub fn stop(self) -> ExecutionTime {
        ExecutionTime::from(self.elapsed())
    }
}

/// Converts a duration to whole milliseconds (saturating).
pub fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
