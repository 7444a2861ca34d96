//! # A pipelined, cancellable fuzzy-finder picker engine
//!
//! This crate is the core of an interactive fuzzy picker: a staged producer/consumer pipeline
//! (Source → Matcher → Sorter → Renderer → Previewer) driven by an event queue and a scheduler,
//! with a session store for save/resume. It does not implement fuzzy scoring, file walking, or
//! terminal rendering itself — those are supplied by implementing the extension traits in
//! [`ext`], or by using the small [`builtin`] reference implementations for tests and demos.
//!
//! ## Usage
//! Construct a [`Picker`] from a [`Source`](ext::Source) plus belts of matchers, sorters,
//! renderers, and previewers, then [`run`](Picker::run) it against a [`Host`](ext::Host)
//! implementation supplied by the embedding editor/application.
//!
//! ### Minimal example
//! ```no_run
#![doc = include_str!("../demos/minimal.rs")]
//! ```

#![deny(missing_docs)]
#![warn(rustdoc::unescaped_backticks)]

pub mod belt;
pub mod builtin;
pub mod chunker;
pub mod collection;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod ext;
pub mod input;
pub mod item;
pub mod orchestrator;
pub mod processor;
pub mod scheduler;
pub mod session;

use std::{collections::HashMap, iter::Extend, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::warn;

pub use crate::{
    dispatcher::ActionDispatcher,
    error::PickError,
    ext::{Action, Host, Matcher, Previewer, Renderer, Sorter, Source},
    item::{Item, PickerContext},
    orchestrator::PickerOrchestrator,
};
use crate::{
    ext::{Candidate, CollectParams},
    processor::{
        collect::{CollectOptions, CollectProcessor},
        match_proc::{MatchOptions, MatchProcessor},
        preview::{PreviewOptions, PreviewProcessor},
        render::{RenderOptions, RenderProcessor},
        sort::SortProcessor,
    },
    scheduler::Scheduler,
};

/// Every stage's tunable knobs, gathered in one place for construction convenience. Field
/// defaults match the literal values named throughout the design.
#[derive(Debug, Clone)]
pub struct PickerOptions {
    /// Collect stage tunables.
    pub collect: CollectOptions,
    /// Match stage tunables.
    pub match_options: MatchOptions,
    /// Render stage tunables.
    pub render: RenderOptions,
    /// Preview stage tunables.
    pub preview: PreviewOptions,
    /// How often the scheduler ticks.
    pub scheduler_interval: Duration,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            collect: CollectOptions::default(),
            match_options: MatchOptions::default(),
            render: RenderOptions::default(),
            preview: PreviewOptions::default(),
            scheduler_interval: scheduler::DEFAULT_INTERVAL,
        }
    }
}

/// A configured picker session, ready to [`run`](Picker::run).
pub struct Picker<D> {
    orchestrator: Arc<PickerOrchestrator<D>>,
    scheduler: Scheduler,
}

impl<D: Clone + Send + Sync + 'static> Picker<D> {
    /// Construct a picker. Every belt (`matchers`, `sorters`, `renderers`, `previewers`) must be
    /// non-empty except `sorters` and `previewers`, which may be empty (pass-through / no preview
    /// pane).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn Source<D> + Send + Sync>,
        matchers: Vec<Arc<dyn Matcher<D>>>,
        sorters: Vec<Arc<dyn Sorter<D>>>,
        renderers: Vec<Arc<dyn Renderer<D>>>,
        previewers: Vec<Arc<dyn Previewer<D>>>,
        actions: HashMap<String, Arc<dyn Action<D>>>,
        default_action: impl Into<String>,
        options: PickerOptions,
    ) -> Self {
        let collect = Arc::new(CollectProcessor::new(options.collect, Vec::new()));
        let matcher = Arc::new(MatchProcessor::new(
            matchers,
            options.match_options,
            0,
            String::new(),
        ));
        let sorter = Arc::new(SortProcessor::new(sorters, 0));
        let renderer = Arc::new(RenderProcessor::new(renderers, options.render, 0));
        let previewer = Arc::new(PreviewProcessor::new(previewers, options.preview, 0));
        let dispatcher = ActionDispatcher::new(actions, default_action);

        let orchestrator = Arc::new(PickerOrchestrator::new(
            source, collect, matcher, sorter, renderer, previewer, dispatcher,
        ));

        Self {
            orchestrator,
            scheduler: Scheduler::new(options.scheduler_interval),
        }
    }

    /// Resume a previously saved session instead of starting from scratch: restores the query,
    /// selection, and each stage's belt index, and re-injects the saved items into the collect
    /// buffer. See [`PickerOrchestrator::context`] for the inverse operation used when saving.
    pub fn resume(self, context: PickerContext<D>) -> Self {
        self.orchestrator.seed(context);
        self
    }

    /// Run the picker to completion against `host`: begin collection, tick the scheduler until
    /// the input driver resolves, then invoke the chosen action.
    ///
    /// Returns `Ok(true)` if the action asked to loop for another selection round.
    pub async fn run(&self, host: &dyn Host, params: CollectParams) -> Result<bool, PickError> {
        self.orchestrator.begin_collect(params);

        let signal = CancellationToken::new();
        let scheduler_fut = self.scheduler.start(signal.clone(), || async {
            if let Err(err) = self.orchestrator.tick(host).await {
                warn!(error = %err, "orchestrator tick failed");
            }
        });
        tokio::pin!(scheduler_fut);

        let result = tokio::select! {
            biased;
            result = self.orchestrator.finish(host) => result,
            () = &mut scheduler_fut => unreachable!("scheduler only stops when its own signal is cancelled"),
        };
        signal.cancel();
        result
    }

    /// The underlying orchestrator, for direct event dispatch or state inspection (tests, demos).
    pub fn orchestrator(&self) -> &Arc<PickerOrchestrator<D>> {
        &self.orchestrator
    }
}

impl<D: Clone + Send + Sync + 'static> Extend<Candidate<D>> for Picker<D> {
    /// Bulk-inject candidates directly into the collect buffer, bypassing the configured
    /// [`Source`]. Re-triggers matching over the updated snapshot.
    fn extend<I: IntoIterator<Item = Candidate<D>>>(&mut self, iter: I) {
        self.orchestrator.inject(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{PlainRenderer, SubstringMatcher, VecSource};

    #[tokio::test]
    async fn extend_injects_items_without_touching_the_source() {
        let source = Arc::new(VecSource::new(vec![Candidate::new("apple", ())]));
        let mut picker = Picker::new(
            source,
            vec![Arc::new(SubstringMatcher)],
            Vec::new(),
            vec![Arc::new(PlainRenderer)],
            Vec::new(),
            HashMap::new(),
            "noop",
            PickerOptions::default(),
        );

        let orchestrator = Arc::clone(picker.orchestrator());
        orchestrator.begin_collect(CollectParams::default());
        tokio::time::sleep(Duration::from_millis(20)).await;

        picker.extend([Candidate::new("banana", ())]);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let context = orchestrator.context();
        let values: Vec<&str> = context.collected_items.iter().map(|it| &*it.value).collect();
        assert!(values.contains(&"apple"));
        assert!(values.contains(&"banana"));
    }
}
