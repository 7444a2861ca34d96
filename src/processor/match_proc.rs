//! # Match Processor
//!
//! Filters collected items by the current query using the active [`Matcher`], in either
//! incremental (publish-as-you-go) or batched (publish-on-completion) mode.

use std::{sync::Arc, time::Duration, time::Instant};

use parking_lot::Mutex;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::Superseding;
use crate::{
    belt::{IndexArg, ItemBelt},
    chunker::Chunker,
    error::Stage,
    event::{Event, EventQueue, StageLifecycle, SwitchAction},
    ext::{MatchParams, Matcher},
    item::Item,
};

/// Tunables for a [`MatchProcessor`].
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Cooperative delay awaited between chunk flushes, yielding to the scheduler.
    pub interval: Duration,
    /// Cap on the number of matched items kept.
    pub threshold: usize,
    /// Flush an incremental update after this many newly-matched items.
    pub chunk_size: usize,
    /// Flush an incremental update after this much time, even short of `chunk_size`.
    pub chunk_interval: Duration,
    /// Whether incremental publication is requested; actually honored only if the active
    /// matcher also reports [`Matcher::incremental`].
    pub incremental: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10),
            threshold: 100_000,
            chunk_size: 1_000,
            chunk_interval: Duration::from_millis(100),
            incremental: true,
        }
    }
}

struct StartParams<D> {
    items: Arc<[Item<D>]>,
    query: String,
}

/// Filters a collected snapshot against the current query using the active matcher on the belt.
pub struct MatchProcessor<D> {
    matchers: Mutex<ItemBelt<Arc<dyn Matcher<D>>>>,
    options: MatchOptions,
    runner: Superseding<StartParams<D>>,
    published: Mutex<Arc<[Item<D>]>>,
    last_query: Mutex<Option<String>>,
}

impl<D: Clone + Send + Sync + 'static> MatchProcessor<D> {
    /// Construct a processor over a non-empty list of matchers, starting at `initial_index`
    /// (clamped per [`ItemBelt`]) with `initial_query` considered already "run" (so that the very
    /// first `start` call with that same query is treated as idempotent, per the design).
    pub fn new(
        matchers: Vec<Arc<dyn Matcher<D>>>,
        options: MatchOptions,
        initial_index: usize,
        initial_query: String,
    ) -> Self {
        let mut belt = ItemBelt::new(matchers);
        belt.set_index(IndexArg::Absolute(initial_index));
        Self {
            matchers: Mutex::new(belt),
            options,
            runner: Superseding::new(),
            published: Mutex::new(Arc::from(Vec::new())),
            last_query: Mutex::new(Some(initial_query)),
        }
    }

    /// The most recently published matched list.
    pub fn published(&self) -> Arc<[Item<D>]> {
        self.published.lock().clone()
    }

    /// Current index into the matcher belt.
    pub fn matcher_index(&self) -> usize {
        self.matchers.lock().index()
    }

    /// Move the matcher belt. Returns whether the active matcher changed; callers should re-`start`
    /// with `restart: true` when it did, per the design's pipeline propagation rules.
    pub fn switch(&self, action: SwitchAction) -> bool {
        let mut belt = self.matchers.lock();
        match action {
            SwitchAction::Relative { amount, cycle } => belt.move_relative(amount, cycle),
            SwitchAction::Absolute(arg) => belt.set_index(arg),
        }
    }

    /// Request a (re-)match over `items` for `query`.
    ///
    /// If `query` equals the previous query and no run is currently in flight, this is a no-op
    /// beyond dispatching a single `match-processor-succeeded`, per the design's idempotence rule.
    pub fn start(
        self: &Arc<Self>,
        items: Arc<[Item<D>]>,
        query: String,
        restart: bool,
        events: Arc<EventQueue>,
    ) {
        let same_query = self.last_query.lock().as_deref() == Some(query.as_str());
        if same_query && !self.runner.is_running() {
            events.dispatch(Event::processor(Stage::Match, StageLifecycle::Succeeded));
            return;
        }

        let params = StartParams { items, query };
        if let Some((params, token)) = self.runner.start(params, restart) {
            let me = Arc::clone(self);
            tokio::spawn(async move {
                me.drive(params, token, events).await;
            });
        }
    }

    async fn drive(self: Arc<Self>, mut params: StartParams<D>, mut token: CancellationToken, events: Arc<EventQueue>) {
        loop {
            events.dispatch(Event::processor(Stage::Match, StageLifecycle::Started));
            *self.last_query.lock() = Some(params.query.clone());

            let matcher = Arc::clone(self.matchers.lock().current());
            let incremental = self.options.incremental && matcher.incremental();
            let match_params = MatchParams {
                items: params.items.clone(),
                query: params.query.clone(),
            };

            let mut stream = matcher.match_items(match_params, token.clone()).await;
            let mut collected: Vec<Item<D>> = Vec::new();
            let mut chunker: Chunker<()> = Chunker::new(self.options.chunk_size);
            let mut last_flush = Instant::now();
            let mut failure: Option<String> = None;
            let mut cancelled = false;

            loop {
                if token.is_cancelled() {
                    cancelled = true;
                    break;
                }
                let remaining = self
                    .options
                    .chunk_interval
                    .saturating_sub(last_flush.elapsed());
                tokio::select! {
                    biased;
                    () = token.cancelled() => { cancelled = true; break; }
                    () = tokio::time::sleep(remaining), if !chunker.is_empty() => {
                        chunker.consume();
                        last_flush = Instant::now();
                        if incremental {
                            *self.published.lock() = Arc::from(collected.clone());
                            events.dispatch(Event::processor(Stage::Match, StageLifecycle::Updated));
                        }
                        tokio::time::sleep(self.options.interval).await;
                    }
                    next = stream.next() => {
                        match next {
                            Some(Ok(item)) => {
                                collected.push(item);
                                if chunker.put(()) {
                                    chunker.consume();
                                    last_flush = Instant::now();
                                    if incremental {
                                        *self.published.lock() = Arc::from(collected.clone());
                                        events.dispatch(Event::processor(Stage::Match, StageLifecycle::Updated));
                                    }
                                    tokio::time::sleep(self.options.interval).await;
                                }
                                if collected.len() >= self.options.threshold {
                                    break;
                                }
                            }
                            Some(Err(err)) => {
                                failure = Some(err.to_string());
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }

            if cancelled {
                trace!("match cancelled");
            } else if let Some(message) = failure {
                warn!(error = %message, "match stage failed");
                events.dispatch(Event::processor(
                    Stage::Match,
                    StageLifecycle::Failed { message: Some(message) },
                ));
            } else {
                debug!(matched = collected.len(), "match succeeded");
                *self.published.lock() = Arc::from(collected);
                events.dispatch(Event::processor(Stage::Match, StageLifecycle::Succeeded));
            }

            match self.runner.take_next() {
                Some((next_params, next_token)) => {
                    params = next_params;
                    token = next_token;
                    continue;
                }
                None => break,
            }
        }
    }
}
