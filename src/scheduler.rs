//! # Scheduler
//!
//! A periodic driver: each tick awaits a caller-supplied closure to completion, then sleeps
//! whatever remains of the interval. An overrunning tick delays the next one rather than queuing a
//! second tick behind it — ticks never overlap, mirroring the deadline-based frame loop this
//! engine replaces.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Default interval between scheduler ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

/// A periodic tick driver bound to a [`CancellationToken`].
pub struct Scheduler {
    interval: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl Scheduler {
    /// Construct a scheduler with the given tick interval.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run `tick` to completion once per interval until `signal` is cancelled.
    ///
    /// Each call to `tick` is fully awaited before the next deadline is computed; an overrunning
    /// tick simply means the next one starts immediately rather than sleeping a negative duration.
    pub async fn start<F, Fut>(&self, signal: CancellationToken, mut tick: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        loop {
            let deadline = Instant::now() + self.interval;

            tokio::select! {
                biased;
                () = signal.cancelled() => return,
                () = tick() => {}
            }

            if signal.is_cancelled() {
                return;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(interval_ms = self.interval.as_millis() as u64, "scheduler tick overran its interval");
                continue;
            }

            tokio::select! {
                biased;
                () = signal.cancelled() => return,
                () = tokio::time::sleep(remaining) => {}
            }
        }
    }
}
