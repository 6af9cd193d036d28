//! Bounded parallel executor.
//!
//! Runs a work function over a list of items with a concurrency cap, a delay
//! between item starts, and failure-driven backpressure. All state lives in
//! the invocation; two batches never influence each other except through the
//! shared health monitor.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::stream::{FuturesUnordered, Stream, StreamExt};
use log::debug;

use crate::config::{
    Config, ADAPTIVE_FAILURE_THRESHOLD, FAILURE_DELAY_CAP_MS, FAILURE_DELAY_STEP_MS,
};
use crate::health::NetworkHealthMonitor;

/// Tuning for one [`run_bounded`] call.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// In-flight items when the batch is healthy
    pub max_concurrency: usize,
    /// Base delay between two item starts
    pub delay: Duration,
    /// Consecutive failures that halve concurrency and trigger failure delays
    pub failure_threshold: usize,
    /// Extra delay per consecutive failure once the threshold is reached
    pub failure_delay_step: Duration,
    /// Cap of that extra delay
    pub failure_delay_cap: Duration,
}

impl ExecutorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrency: config.max_concurrent_requests.max(1),
            delay: Duration::from_millis(config.request_delay_ms),
            ..Self::default()
        }
    }
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_concurrency: crate::config::MAX_CONCURRENT_REQUESTS,
            delay: Duration::from_millis(crate::config::REQUEST_DELAY_MS),
            failure_threshold: ADAPTIVE_FAILURE_THRESHOLD,
            failure_delay_step: Duration::from_millis(FAILURE_DELAY_STEP_MS),
            failure_delay_cap: Duration::from_millis(FAILURE_DELAY_CAP_MS),
        }
    }
}

/// Failure streak of one batch.
struct BatchState<'a> {
    options: &'a ExecutorOptions,
    consecutive_failures: AtomicUsize,
}

impl BatchState<'_> {
    fn failures(&self) -> usize {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Full concurrency, or half of it (at least 1) while failures pile up.
    fn concurrency(&self) -> usize {
        let max = self.options.max_concurrency.max(1);
        if self.failures() >= self.options.failure_threshold {
            (max / 2).max(1)
        } else {
            max
        }
    }

    /// `delay * (1 + failures * 0.5)`
    fn start_delay(&self) -> Duration {
        self.options
            .delay
            .mul_f64(1.0 + self.failures() as f64 * 0.5)
    }

    fn failure_delay(&self, failures: usize) -> Duration {
        self.options
            .failure_delay_step
            .saturating_mul(failures as u32)
            .min(self.options.failure_delay_cap)
    }
}

async fn run_item<Fut, R, E>(
    index: usize,
    work: Fut,
    state: &BatchState<'_>,
    health: &NetworkHealthMonitor,
) -> (usize, Option<R>)
where
    Fut: Future<Output = Result<R, E>>,
    E: Display,
{
    match work.await {
        Ok(result) => {
            state.consecutive_failures.store(0, Ordering::SeqCst);
            health.record_success();
            (index, Some(result))
        }
        Err(e) => {
            debug!("Error processing item {}: {}", index, e);
            let failures = state.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
            health.record_error();
            if failures >= state.options.failure_threshold {
                let extra = state.failure_delay(failures);
                debug!(
                    "Adding extra delay of {}ms due to consecutive errors",
                    extra.as_millis()
                );
                tokio::time::sleep(extra).await;
            }
            (index, None)
        }
    }
}

/// Keeps settling in-flight items into `results` until `until` completes.
async fn drive_until<S, R, U>(in_flight: &mut S, results: &mut [Option<R>], until: U) -> U::Output
where
    S: Stream<Item = (usize, Option<R>)> + Unpin,
    U: Future,
{
    tokio::pin!(until);
    loop {
        tokio::select! {
            output = &mut until => return output,
            Some((index, result)) = in_flight.next() => results[index] = result,
        }
    }
}

/// Runs `work` over `items` with bounded, adaptive concurrency.
///
/// Results come back in input order; an item whose work failed yields `None`
/// in its slot instead of aborting the batch. Before each item starts, an
/// unhealthy `health` monitor makes the batch pause for the monitor's cooldown
/// and reset it. Returns only once every started item has settled.
pub async fn run_bounded<T, R, E, F, Fut>(
    items: Vec<T>,
    work: F,
    options: &ExecutorOptions,
    health: &NetworkHealthMonitor,
) -> Vec<Option<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
{
    let state = BatchState {
        options,
        consecutive_failures: AtomicUsize::new(0),
    };
    let mut results: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    let mut in_flight = FuturesUnordered::new();

    for (index, item) in items.into_iter().enumerate() {
        if !health.is_healthy() {
            debug!("Pausing processing due to network issues...");
            drive_until(&mut in_flight, &mut results, health.pause_if_unhealthy()).await;
        }

        while in_flight.len() >= state.concurrency() {
            match in_flight.next().await {
                Some((i, result)) => results[i] = result,
                None => break,
            }
        }

        in_flight.push(run_item(index, work(item), &state, health));

        let delay = state.start_delay();
        if !delay.is_zero() {
            drive_until(&mut in_flight, &mut results, tokio::time::sleep(delay)).await;
        }
    }

    while let Some((index, result)) = in_flight.next().await {
        results[index] = result;
    }
    results
}
