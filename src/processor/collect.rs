//! # Collect Processor
//!
//! Pulls items from a [`Source`], dedupes them by `value` into an insertion-ordered buffer,
//! chunks the resulting flushes, caps ingestion at a threshold, and dispatches progress events.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    chunker::Chunker,
    collection::UniqueOrderedBuffer,
    error::Stage,
    event::{Event, EventQueue, StageLifecycle},
    ext::{Candidate, CollectParams, Source},
    item::Item,
};

/// Tunables for a [`CollectProcessor`], matching the literal defaults in the design.
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Stop accepting items once this many have been collected. Default `100_000`.
    pub threshold: usize,
    /// Flush a progress update after this many newly-accepted items. Default `1_000`.
    pub chunk_size: usize,
    /// Flush a progress update after this much time has elapsed since the previous flush, even if
    /// `chunk_size` has not been reached. Default `100ms`.
    pub chunk_interval: Duration,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            threshold: 100_000,
            chunk_size: 1_000,
            chunk_interval: Duration::from_millis(100),
        }
    }
}

/// Pulls items from a [`Source`] into a deduplicated, insertion-ordered buffer.
///
/// Unlike the other processors, a `CollectProcessor` runs at most once per picker session: the
/// design states collect is never re-invoked within a session. Call [`CollectProcessor::start`]
/// exactly once; subsequent calls are a no-op and return immediately.
pub struct CollectProcessor<D> {
    options: CollectOptions,
    buffer: Mutex<UniqueOrderedBuffer<Item<D>, Arc<str>, fn(&Item<D>) -> Arc<str>>>,
    disposal: CancellationToken,
    paused: Arc<AtomicBool>,
    resume_notify: Arc<tokio::sync::Notify>,
    started: AtomicBool,
}

impl<D: Clone + Send + Sync + 'static> CollectProcessor<D> {
    /// Construct a processor with the given options and optional `initial_items` (for resuming a
    /// previously saved [`PickerContext`](crate::item::PickerContext)).
    pub fn new(options: CollectOptions, initial_items: Vec<Item<D>>) -> Self {
        let mut buffer = UniqueOrderedBuffer::with_identifier(
            (|it: &Item<D>| it.value.clone()) as fn(&Item<D>) -> Arc<str>,
        );
        buffer.extend(initial_items);
        Self {
            options,
            buffer: Mutex::new(buffer),
            disposal: CancellationToken::new(),
            paused: Arc::new(AtomicBool::new(false)),
            resume_notify: Arc::new(tokio::sync::Notify::new()),
            started: AtomicBool::new(false),
        }
    }

    /// The shared disposal signal. Cancelling this token stops any in-flight `start` call.
    pub fn disposal_token(&self) -> CancellationToken {
        self.disposal.clone()
    }

    /// A snapshot of everything collected so far, in insertion order.
    pub fn snapshot(&self) -> Arc<[Item<D>]> {
        Arc::from(self.buffer.lock().as_slice())
    }

    /// Number of items collected so far.
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Whether nothing has been collected yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Push `candidates` directly into the buffer, bypassing the configured [`Source`] entirely.
    /// Deduped the same way a streamed item is. Dispatches one `collect-processor-updated` event
    /// if anything was actually inserted, so downstream stages re-run over the new snapshot.
    ///
    /// Used for bulk item injection from outside the pipeline (e.g. an embedder appending items it
    /// discovered through some other channel).
    pub fn inject(&self, candidates: impl IntoIterator<Item = Candidate<D>>, events: &EventQueue) {
        let inserted = {
            let mut buffer = self.buffer.lock();
            let mut inserted = false;
            for candidate in candidates {
                let id = buffer.len() as u64;
                inserted |= buffer.push(Item::new(id, candidate.value, candidate.detail));
            }
            inserted
        };
        if inserted {
            debug!(collected = self.len(), "collect inject");
            events.dispatch(Event::processor(Stage::Collect, StageLifecycle::Updated));
        }
    }

    /// Pause iteration: the run parks at the next suspension point until [`resume`](Self::resume)
    /// is called or the processor is disposed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resume a paused iteration.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.resume_notify.notify_waiters();
    }

    /// Cancel the current (or any future) `start` call.
    pub fn dispose(&self) {
        self.disposal.cancel();
        self.resume_notify.notify_waiters();
    }

    /// Begin iterating `source`. Dispatches `collect-processor-updated` on every chunk flush and
    /// exactly one of `collect-processor-succeeded` / a cancellation (silent) / `collect-processor-failed`
    /// when iteration ends.
    pub async fn start(
        &self,
        source: &(dyn Source<D> + Send + Sync),
        params: CollectParams,
        events: &EventQueue,
    ) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        events.dispatch(Event::processor(Stage::Collect, StageLifecycle::Started));
        let signal = self.disposal.clone();
        let mut stream = source.collect(params, signal.clone()).await;

        let mut chunker: Chunker<()> = Chunker::new(self.options.chunk_size);
        let mut last_flush = Instant::now();
        let mut accepted = 0usize;

        loop {
            if signal.is_cancelled() {
                trace!("collect cancelled");
                return;
            }

            if self.paused.load(Ordering::SeqCst) {
                tokio::select! {
                    () = signal.cancelled() => return,
                    () = self.resume_notify.notified() => continue,
                }
            }

            let remaining = self
                .options
                .chunk_interval
                .saturating_sub(last_flush.elapsed());

            tokio::select! {
                biased;
                () = signal.cancelled() => return,
                () = tokio::time::sleep(remaining), if !chunker.is_empty() => {
                    chunker.consume();
                    last_flush = Instant::now();
                    debug!(collected = self.len(), "collect flush (interval)");
                    events.dispatch(Event::processor(Stage::Collect, StageLifecycle::Updated));
                }
                next = stream.next() => {
                    match next {
                        Some(Ok(candidate)) => {
                            let inserted = {
                                let mut buffer = self.buffer.lock();
                                let id = buffer.len() as u64;
                                buffer.push(Item::new(id, candidate.value, candidate.detail))
                            };
                            if inserted {
                                accepted += 1;
                                if chunker.put(()) {
                                    chunker.consume();
                                    last_flush = Instant::now();
                                    events.dispatch(Event::processor(Stage::Collect, StageLifecycle::Updated));
                                }
                            }
                            if accepted >= self.options.threshold {
                                if !chunker.is_empty() {
                                    chunker.consume();
                                    events.dispatch(Event::processor(Stage::Collect, StageLifecycle::Updated));
                                }
                                debug!(collected = self.len(), "collect threshold reached");
                                events.dispatch(Event::processor(Stage::Collect, StageLifecycle::Succeeded));
                                return;
                            }
                        }
                        Some(Err(err)) => {
                            warn!(error = %err, "collect source failed");
                            events.dispatch(Event::processor(
                                Stage::Collect,
                                StageLifecycle::Failed { message: Some(err.to_string()) },
                            ));
                            return;
                        }
                        None => {
                            if !chunker.is_empty() {
                                chunker.consume();
                                events.dispatch(Event::processor(Stage::Collect, StageLifecycle::Updated));
                            }
                            debug!(collected = self.len(), "collect source exhausted");
                            events.dispatch(Event::processor(Stage::Collect, StageLifecycle::Succeeded));
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::ext::Candidate;

    struct VecSource(Vec<&'static str>);

    #[async_trait]
    impl Source<()> for VecSource {
        async fn collect(
            &self,
            _params: CollectParams,
            _signal: CancellationToken,
        ) -> crate::ext::ItemStream<()> {
            let items: Vec<Result<Candidate<()>, crate::ext::BoxError>> = self
                .0
                .iter()
                .map(|s| Ok(Candidate::new(*s, ())))
                .collect();
            Box::pin(tokio_stream::iter(items))
        }
    }

    #[tokio::test]
    async fn dedups_by_value_and_assigns_sequential_ids() {
        let source = VecSource(vec!["a", "b", "a", "c"]);
        let events = EventQueue::new();
        let processor: CollectProcessor<()> = CollectProcessor::new(CollectOptions::default(), vec![]);
        processor
            .start(&source, CollectParams::default(), &events)
            .await;

        let snapshot = processor.snapshot();
        let values: Vec<&str> = snapshot.iter().map(|it| &*it.value).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
        assert_eq!(snapshot.iter().map(|it| it.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn threshold_caps_total_accepted() {
        let values: Vec<&'static str> = (0..10).map(|i| Box::leak(i.to_string().into_boxed_str()) as &str).collect();
        let source = VecSource(values);
        let events = EventQueue::new();
        let options = CollectOptions {
            threshold: 3,
            ..CollectOptions::default()
        };
        let processor: CollectProcessor<()> = CollectProcessor::new(options, vec![]);
        processor
            .start(&source, CollectParams::default(), &events)
            .await;
        assert_eq!(processor.len(), 3);

        let mut succeeded = 0;
        events.drain(|e| {
            if matches!(
                e,
                Event::Processor {
                    stage: Stage::Collect,
                    lifecycle: StageLifecycle::Succeeded
                }
            ) {
                succeeded += 1;
            }
        });
        assert_eq!(succeeded, 1);
    }

    #[test]
    fn inject_dedups_against_already_collected_items_and_dispatches_once() {
        let events = EventQueue::new();
        let processor: CollectProcessor<()> = CollectProcessor::new(CollectOptions::default(), vec![]);
        processor.inject([Candidate::new("a", ()), Candidate::new("b", ())], &events);
        processor.inject([Candidate::new("b", ()), Candidate::new("c", ())], &events);

        let snapshot = processor.snapshot();
        let values: Vec<&str> = snapshot.iter().map(|it| &*it.value).collect();
        assert_eq!(values, vec!["a", "b", "c"]);

        let mut updated = 0;
        events.drain(|e| {
            if matches!(
                e,
                Event::Processor {
                    stage: Stage::Collect,
                    lifecycle: StageLifecycle::Updated
                }
            ) {
                updated += 1;
            }
        });
        assert_eq!(updated, 2);
    }

    #[tokio::test]
    async fn second_start_call_is_a_no_op() {
        let source = VecSource(vec!["a"]);
        let events = EventQueue::new();
        let processor: CollectProcessor<()> = CollectProcessor::new(CollectOptions::default(), vec![]);
        processor
            .start(&source, CollectParams::default(), &events)
            .await;
        processor
            .start(&source, CollectParams::default(), &events)
            .await;
        assert_eq!(processor.len(), 1);
    }
}
