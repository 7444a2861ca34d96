//! # Pipeline processors
//!
//! Each processor drives one extension trait (a [`Source`](crate::ext::Source),
//! [`Matcher`](crate::ext::Matcher), [`Sorter`](crate::ext::Sorter), [`Renderer`](crate::ext::Renderer),
//! or [`Previewer`](crate::ext::Previewer)) and publishes its result for the next stage by
//! dispatching a [`StageLifecycle`](crate::event::StageLifecycle) event.
//!
//! [`CollectProcessor`](collect::CollectProcessor) is a single streaming run per picker session.
//! The other four share the "superseding `start`" concurrency shape from the design's concurrency
//! model: at most one run is in flight; a `start` call while one is running either replaces the
//! pending reservation (if not `restart`) or cancels the in-flight run and replaces it (if
//! `restart`). [`Superseding`] implements that bookkeeping once, generically; each processor owns
//! one perpetual driver loop that pulls reservations and runs them, publishing results as it goes
//! rather than handing them back to whoever called `start`.

pub mod collect;
pub mod match_proc;
pub mod preview;
pub mod render;
pub mod sort;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ext::BoxError;

/// The result of a processor's asynchronous run.
///
/// Cancellation is never an [`Err`](Result::Err): it is its own variant, so a cancelled run can
/// never be mistaken for a stage failure.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The run completed and published `T`.
    Done(T),
    /// The run was cancelled before completion; no partial result should be published.
    Cancelled,
    /// The extension being driven returned an error.
    Failed(BoxError),
}

impl<T> Outcome<T> {
    /// Whether this is [`Outcome::Done`].
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }
}

struct SupersedingState<P> {
    running: bool,
    reserved: Option<P>,
    token: CancellationToken,
}

/// A generic "at most one run, latest request wins" scheduling primitive.
///
/// `P` is the parameters type for a single `start` call. The runner only tracks *which* params
/// should run next and *when* the in-flight one should be cancelled; the actual work is driven by
/// a caller-owned loop (see [`Superseding::take_next`]).
pub struct Superseding<P> {
    state: Arc<Mutex<SupersedingState<P>>>,
}

impl<P> Default for Superseding<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Superseding<P> {
    /// Construct an idle runner.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SupersedingState {
                running: false,
                reserved: None,
                token: CancellationToken::new(),
            })),
        }
    }

    /// Whether a run is currently in flight (or reserved to run next).
    pub fn is_running(&self) -> bool {
        let guard = self.state.lock();
        guard.running || guard.reserved.is_some()
    }

    /// Request a run with the given parameters.
    ///
    /// Returns `Some((params, token))` handing the same `params` straight back with a freshly
    /// minted cancellation token if the caller should spawn the driver loop (the runner was
    /// idle); returns `None` if a run is already in flight, in which case `params` has been
    /// reserved (replacing any previous reservation) and, if `restart` is `true`, the in-flight
    /// run's token has been cancelled so the driver loop will pick up the reservation as soon as
    /// it notices.
    #[must_use]
    pub fn start(&self, params: P, restart: bool) -> Option<(P, CancellationToken)> {
        let mut guard = self.state.lock();
        if !guard.running {
            guard.running = true;
            guard.token = CancellationToken::new();
            guard.reserved = None;
            return Some((params, guard.token.clone()));
        }
        if restart {
            guard.token.cancel();
        }
        guard.reserved = Some(params);
        None
    }

    /// Called by the driver loop after completing one attempt: pops the next reservation (with a
    /// fresh token) if one exists, or marks the runner idle and returns `None`.
    #[must_use]
    pub fn take_next(&self) -> Option<(P, CancellationToken)> {
        let mut guard = self.state.lock();
        match guard.reserved.take() {
            Some(params) => {
                guard.token = CancellationToken::new();
                Some((params, guard.token.clone()))
            }
            None => {
                guard.running = false;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_on_idle_runner_grants_a_token() {
        let runner: Superseding<u32> = Superseding::new();
        assert!(runner.start(1, false).is_some());
        assert!(runner.is_running());
    }

    #[test]
    fn start_while_running_without_restart_reserves_but_does_not_cancel() {
        let runner: Superseding<u32> = Superseding::new();
        let (_, token) = runner.start(1, false).expect("idle start");
        assert!(runner.start(2, false).is_none());
        assert!(!token.is_cancelled());

        let (params, _next_token) = runner.take_next().expect("reservation pending");
        assert_eq!(params, 2);
    }

    #[test]
    fn start_while_running_with_restart_cancels_current_token() {
        let runner: Superseding<u32> = Superseding::new();
        let (_, token) = runner.start(1, true).expect("idle start");
        assert!(runner.start(2, true).is_none());
        assert!(token.is_cancelled());
    }

    #[test]
    fn take_next_with_no_reservation_marks_idle() {
        let runner: Superseding<u32> = Superseding::new();
        runner.start(1, false);
        assert!(runner.take_next().is_none());
        assert!(!runner.is_running());
    }
}
