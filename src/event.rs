//! # Event queue
//!
//! A single-owner FIFO of [`Event`]s produced by the [`InputDriver`](crate::input::InputDriver),
//! the UI surface, and the processors themselves, and drained once per [`Scheduler`](crate::scheduler::Scheduler)
//! tick by the [`PickerOrchestrator`](crate::orchestrator::PickerOrchestrator).
//!
//! Events dispatched *while* a drain is in progress are not visited by that drain: [`EventQueue::drain`]
//! atomically swaps the internal queue out before iterating, so anything dispatched from within the
//! consumer callback is deferred to the following tick.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::{
    belt::IndexArg,
    error::{PickError, Stage},
};

/// Whether a select/select-all action should turn selection on, off, or flip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMethod {
    /// Mark as selected.
    On,
    /// Mark as not selected.
    Off,
    /// Flip the current state.
    Toggle,
}

/// Which belt-backed stage a switch event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchTarget {
    /// The [`MatchProcessor`](crate::processor::match_proc::MatchProcessor)'s matcher belt.
    Matcher,
    /// The [`SortProcessor`](crate::processor::sort::SortProcessor)'s sorter belt.
    Sorter,
    /// The [`RenderProcessor`](crate::processor::render::RenderProcessor)'s renderer belt.
    Renderer,
    /// The [`PreviewProcessor`](crate::processor::preview::PreviewProcessor)'s previewer belt.
    Previewer,
}

/// How to move a belt's current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchAction {
    /// Move the index by `amount`, optionally wrapping around at the ends.
    Relative {
        /// Signed step; negative moves toward index `0`.
        amount: i64,
        /// Whether to wrap around instead of clamping at the ends.
        cycle: bool,
    },
    /// Jump to an absolute index.
    Absolute(IndexArg),
}

/// The outcome of a stage's asynchronous run, reported back onto the event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageLifecycle {
    /// The stage began a new `start` invocation.
    Started,
    /// An incremental-mode stage published a partial result.
    Updated,
    /// The stage's `start` invocation completed successfully.
    Succeeded,
    /// The stage's `start` invocation failed or was cancelled.
    ///
    /// `message` is `None` for cancellation (the spec's sentinel) and `Some(_)` for a genuine
    /// extension error; see [`PickError`] for how these are classified upstream.
    Failed {
        /// `None` means cancellation; `Some(_)` carries the rendered error.
        message: Option<String>,
    },
}

/// An event which controls picker behaviour, exhaustively covering the table in the design
/// ("Event handling").
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Event {
    /// The host-observed command-line string changed.
    CmdlineChanged(String),
    /// The host-observed command-line cursor position changed.
    CmdposChanged(usize),
    /// Move the render cursor by a relative amount.
    MoveCursor {
        /// Signed step.
        amount: i64,
        /// If true, `amount` is in units of the configured list-scroll step rather than rows.
        scroll: bool,
    },
    /// Move the render cursor to an absolute position.
    MoveCursorAt(IndexArg),
    /// Toggle/set/clear selection for a single item.
    SelectItem {
        /// The item id to select, or `None` to act on the item under the cursor.
        target: Option<u64>,
        /// How to combine with the current selection state.
        method: SelectMethod,
    },
    /// Toggle/set/clear selection across every currently matched item.
    SelectAllItems {
        /// How to combine with the current selection state.
        method: SelectMethod,
    },
    /// Switch the active strategy of one belt-backed stage.
    Switch {
        /// Which belt to move.
        target: SwitchTarget,
        /// How to move it.
        action: SwitchAction,
    },
    /// Invoke an action by name (`accept(name)` in the design's terms).
    ActionInvoke(String),
    /// Pass a raw host command through to the list component.
    ListComponentExecute(String),
    /// Pass a raw host command through to the preview component.
    PreviewComponentExecute(String),
    /// Toggle the help overlay.
    HelpToggle,
    /// Page the help overlay by the given signed amount.
    HelpPage(i64),
    /// Quit the picker without a selection.
    Quit,
    /// A processor reported a lifecycle transition.
    Processor {
        /// Which stage.
        stage: Stage,
        /// What happened.
        lifecycle: StageLifecycle,
    },
}

impl Event {
    /// Construct a [`Event::Processor`] event for the given stage and lifecycle transition.
    pub fn processor(stage: Stage, lifecycle: StageLifecycle) -> Self {
        Self::Processor { stage, lifecycle }
    }
}

/// A single-owner FIFO queue of [`Event`]s. See the [module documentation](self) for the drain
/// semantics.
#[derive(Default)]
pub struct EventQueue {
    inner: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    /// Construct an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the back of the queue. `O(1)`.
    pub fn dispatch(&self, event: Event) {
        self.inner.lock().push_back(event);
    }

    /// Atomically swap the queue out, then invoke `consumer` once per event in enqueue order.
    ///
    /// Events dispatched by `consumer` itself (or by any other thread racing with this call) are
    /// appended to the now-empty internal queue and are only visited by the *next* call to
    /// `drain`.
    pub fn drain(&self, mut consumer: impl FnMut(Event)) {
        let batch = std::mem::take(&mut *self.inner.lock());
        for event in batch {
            consumer(event);
        }
    }

    /// Number of events currently queued, without draining them. Mainly useful for tests and
    /// diagnostics.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Classify a rendered failure message as cancellation (`None`) or a genuine error, mirroring
/// how [`StageLifecycle::Failed`] is produced from a [`PickError`].
pub fn classify_failure(err: Option<&PickError>) -> Option<String> {
    err.map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_then_drain_preserves_fifo_order() {
        let queue = EventQueue::new();
        queue.dispatch(Event::Quit);
        queue.dispatch(Event::CmdlineChanged("a".into()));
        queue.dispatch(Event::HelpToggle);

        let mut seen = Vec::new();
        queue.drain(|e| seen.push(e));

        assert_eq!(
            seen,
            vec![
                Event::Quit,
                Event::CmdlineChanged("a".into()),
                Event::HelpToggle,
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn events_dispatched_during_drain_are_deferred() {
        let queue = EventQueue::new();
        queue.dispatch(Event::Quit);

        let mut first_pass = Vec::new();
        queue.drain(|e| {
            first_pass.push(e);
            queue.dispatch(Event::HelpToggle);
        });
        assert_eq!(first_pass, vec![Event::Quit]);
        assert_eq!(queue.len(), 1);

        let mut second_pass = Vec::new();
        queue.drain(|e| second_pass.push(e));
        assert_eq!(second_pass, vec![Event::HelpToggle]);
    }

    #[test]
    fn drain_on_empty_queue_invokes_consumer_zero_times() {
        let queue = EventQueue::new();
        let mut calls = 0;
        queue.drain(|_| calls += 1);
        assert_eq!(calls, 0);
    }
}
