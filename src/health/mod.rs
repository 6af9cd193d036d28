//! Network health monitor for archive requests.
//!
//! A circuit breaker with a fixed cooldown: after N consecutive failures the
//! archive is considered unhealthy and consumers pause before dispatching more
//! work. Any success closes the circuit again.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::{HEALTH_FAILURE_THRESHOLD, HEALTH_PAUSE_SECS, HEALTH_WARNING_COOLDOWN_SECS};

/// Tracks consecutive archive failures shared by every in-flight request.
pub struct NetworkHealthMonitor {
    /// Consecutive failures before the network is considered unhealthy
    failure_threshold: u32,
    /// Minimum interval between two degradation warnings
    warning_cooldown: Duration,
    /// How long consumers back off when unhealthy
    pause_duration: Duration,
    consecutive_failures: AtomicU32,
    last_failure_at: Mutex<Option<Instant>>,
    last_warning_at: Mutex<Option<Instant>>,
}

impl NetworkHealthMonitor {
    /// Creates a monitor with default settings.
    ///
    /// Defaults:
    /// - Failure threshold: 5 consecutive failures
    /// - Warning cooldown: 60 seconds
    /// - Pause: 30 seconds
    pub fn new() -> Self {
        Self::with_settings(
            HEALTH_FAILURE_THRESHOLD,
            Duration::from_secs(HEALTH_WARNING_COOLDOWN_SECS),
            Duration::from_secs(HEALTH_PAUSE_SECS),
        )
    }

    /// Creates a monitor with custom settings.
    pub fn with_settings(
        failure_threshold: u32,
        warning_cooldown: Duration,
        pause_duration: Duration,
    ) -> Self {
        NetworkHealthMonitor {
            failure_threshold: failure_threshold.max(1),
            warning_cooldown,
            pause_duration,
            consecutive_failures: AtomicU32::new(0),
            last_failure_at: Mutex::new(None),
            last_warning_at: Mutex::new(None),
        }
    }

    /// Records a successful request; closes the circuit.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }

    /// Records a failed request.
    ///
    /// Returns `true` when this call emitted the degradation warning (threshold
    /// reached and the warning cooldown has elapsed).
    pub fn record_error(&self) -> bool {
        let count = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Instant::now();
        *self
            .last_failure_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(now);

        if count < self.failure_threshold {
            return false;
        }

        let mut last_warning = self
            .last_warning_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let cooled_down = last_warning
            .map(|at| now.duration_since(at) >= self.warning_cooldown)
            .unwrap_or(true);
        if !cooled_down {
            return false;
        }

        *last_warning = Some(now);
        log::warn!(
            "⚠️ Network connectivity issues detected: {} consecutive failed requests to the Wayback Machine. \
             The archive may be slow or rate limiting; results may be incomplete.",
            count
        );
        true
    }

    /// `false` once the failure count reaches the threshold.
    pub fn is_healthy(&self) -> bool {
        self.consecutive_failures.load(Ordering::SeqCst) < self.failure_threshold
    }

    /// Clears the failure count and timestamps.
    pub fn reset(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        *self
            .last_failure_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        *self
            .last_warning_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Current consecutive failure count (for monitoring).
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Time of the most recent failure, if any.
    pub fn last_failure_at(&self) -> Option<Instant> {
        *self
            .last_failure_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pauses for the cooldown and resets the monitor if it is unhealthy.
    ///
    /// Returns `true` if a pause was taken.
    pub async fn pause_if_unhealthy(&self) -> bool {
        if self.is_healthy() {
            return false;
        }
        log::warn!(
            "Network appears unhealthy, pausing for {}s before continuing",
            self.pause_duration.as_secs()
        );
        tokio::time::sleep(self.pause_duration).await;
        self.reset();
        true
    }

    /// One-line status for run summaries.
    pub fn status_line(&self) -> String {
        format!(
            "Network health: {} ({} consecutive failure(s))",
            if self.is_healthy() { "healthy" } else { "degraded" },
            self.consecutive_failures()
        )
    }
}

impl Default for NetworkHealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> NetworkHealthMonitor {
        NetworkHealthMonitor::with_settings(5, Duration::from_millis(50), Duration::from_millis(10))
    }

    #[test]
    fn test_unhealthy_after_threshold() {
        let m = monitor();
        for _ in 0..4 {
            m.record_error();
        }
        assert!(m.is_healthy());
        assert_eq!(m.consecutive_failures(), 4);

        m.record_error();
        assert!(!m.is_healthy());
        assert!(m.last_failure_at().is_some());
    }

    #[test]
    fn test_single_success_resets() {
        let m = monitor();
        for _ in 0..7 {
            m.record_error();
        }
        assert!(!m.is_healthy());

        m.record_success();
        assert_eq!(m.consecutive_failures(), 0);
        assert!(m.is_healthy());
    }

    #[test]
    fn test_warning_respects_cooldown() {
        let m = monitor();
        let warnings: Vec<bool> = (0..8).map(|_| m.record_error()).collect();
        // Only the call that crossed the threshold warns
        assert_eq!(warnings.iter().filter(|w| **w).count(), 1);
        assert!(warnings[4]);

        std::thread::sleep(Duration::from_millis(60));
        assert!(m.record_error());
    }

    #[tokio::test]
    async fn test_pause_if_unhealthy() {
        let m = monitor();
        assert!(!m.pause_if_unhealthy().await);

        for _ in 0..5 {
            m.record_error();
        }
        assert!(m.pause_if_unhealthy().await);
        assert!(m.is_healthy());
        assert_eq!(m.consecutive_failures(), 0);
        assert!(m.last_failure_at().is_none());
    }

    #[test]
    fn test_status_line() {
        let m = monitor();
        assert!(m.status_line().contains("healthy"));
        for _ in 0..5 {
            m.record_error();
        }
        assert!(m.status_line().contains("degraded"));
    }
}
