//! Jittered exponential backoff.

use std::time::Duration;

use rand::Rng;

use crate::config::{BACKOFF_FACTOR, BACKOFF_JITTER};

/// Backoff iterator for `tokio_retry` strategies.
///
/// Every step computes `min(previous * 1.5 * (1 + jitter), max)` with
/// `jitter` drawn from `[0, 0.2)`, starting from `initial`. The sequence is
/// non-decreasing and never exceeds `max`.
#[derive(Debug, Clone)]
pub struct JitteredBackoff {
    current: Duration,
    max: Duration,
}

impl JitteredBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial.min(max),
            max,
        }
    }

    /// Computes the next delay for a given jitter fraction.
    ///
    /// Split out from `next` so the formula can be exercised deterministically.
    pub fn step(&self, jitter: f64) -> Duration {
        let factor = BACKOFF_FACTOR * (1.0 + jitter.clamp(0.0, BACKOFF_JITTER));
        self.current.mul_f64(factor).min(self.max)
    }
}

impl Iterator for JitteredBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let jitter = rand::rng().random_range(0.0..BACKOFF_JITTER);
        self.current = self.step(jitter);
        Some(self.current)
    }
}

/// Random delay in `[0, max_ms)` inserted before a request attempt.
pub fn request_jitter(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_ms))
}
