//! # Picker Orchestrator
//!
//! Wires the five processors together, owns cursor/selection/query state, translates events into
//! processor commands, and manages the action-selection sub-flow. Processors dispatch *events*
//! rather than call back into the orchestrator, so the dependency graph stays one-directional
//! (design note: "cyclic references avoided").

use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    belt::IndexArg,
    builtin::{PlainRenderer, SubstringMatcher, VecSource},
    dispatcher::{ActionDispatcher, is_select_sentinel},
    error::{PickError, Stage},
    event::{Event, EventQueue, SelectMethod, StageLifecycle, SwitchAction, SwitchTarget},
    ext::{Candidate, CollectParams, Host, Matcher, Renderer, Source},
    input::{InputDriver, InputOutcome},
    item::{Item, PickerContext},
    processor::{
        collect::CollectProcessor, match_proc::MatchProcessor, preview::PreviewProcessor,
        render::RenderProcessor, sort::SortProcessor,
    },
};

/// How many rows a `scroll: true` cursor move advances, per tick.
const LIST_SCROLL_STEP: i64 = 1;

/// Whether a stage's failure indicator is currently set, keyed by [`Stage`].
#[derive(Debug, Default, Clone)]
struct FailureIndicators {
    collect: Option<String>,
    r#match: Option<String>,
    sort: Option<String>,
    render: Option<String>,
    preview: Option<String>,
}

impl FailureIndicators {
    fn set(&mut self, stage: Stage, message: Option<String>) {
        let slot = match stage {
            Stage::Collect => &mut self.collect,
            Stage::Match => &mut self.r#match,
            Stage::Sort => &mut self.sort,
            Stage::Render => &mut self.render,
            Stage::Preview => &mut self.preview,
        };
        *slot = message;
    }
}

/// Help overlay visibility and page offset.
#[derive(Debug, Default, Clone, Copy)]
struct HelpState {
    visible: bool,
    page: i64,
}

/// Wires the pipeline processors and drives one picker session.
pub struct PickerOrchestrator<D> {
    source: Arc<dyn Source<D> + Send + Sync>,
    collect: Arc<CollectProcessor<D>>,
    matcher: Arc<MatchProcessor<D>>,
    sorter: Arc<SortProcessor<D>>,
    renderer: Arc<RenderProcessor<D>>,
    previewer: Arc<PreviewProcessor<D>>,
    events: Arc<EventQueue>,
    input: InputDriver,
    actions: ActionDispatcher<D>,
    query: Mutex<String>,
    selection: Mutex<BTreeSet<u64>>,
    collecting: AtomicBool,
    failures: Mutex<FailureIndicators>,
    help: Mutex<HelpState>,
    cmdpos: AtomicI64,
}

impl<D: Clone + Send + Sync + 'static> PickerOrchestrator<D> {
    /// Wire a fresh orchestrator over the given processors and action map.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn Source<D> + Send + Sync>,
        collect: Arc<CollectProcessor<D>>,
        matcher: Arc<MatchProcessor<D>>,
        sorter: Arc<SortProcessor<D>>,
        renderer: Arc<RenderProcessor<D>>,
        previewer: Arc<PreviewProcessor<D>>,
        actions: ActionDispatcher<D>,
    ) -> Self {
        Self {
            source,
            collect,
            matcher,
            sorter,
            renderer,
            previewer,
            events: Arc::new(EventQueue::new()),
            input: InputDriver::new(),
            actions,
            query: Mutex::new(String::new()),
            selection: Mutex::new(BTreeSet::new()),
            collecting: AtomicBool::new(true),
            failures: Mutex::new(FailureIndicators::default()),
            help: Mutex::new(HelpState::default()),
            cmdpos: AtomicI64::new(0),
        }
    }

    /// The shared event queue, for a host or test harness to dispatch events onto directly.
    pub fn events(&self) -> Arc<EventQueue> {
        Arc::clone(&self.events)
    }

    /// The current query string.
    pub fn query(&self) -> String {
        self.query.lock().clone()
    }

    /// A snapshot of the current selection set.
    pub fn selection(&self) -> BTreeSet<u64> {
        self.selection.lock().clone()
    }

    /// Whether the collect processor is still streaming (no `succeeded`/`failed` event yet).
    pub fn is_collecting(&self) -> bool {
        self.collecting.load(Ordering::SeqCst)
    }

    /// The host-observed command-line cursor position, as of the last `tick`.
    pub fn cmdpos(&self) -> usize {
        self.cmdpos.load(Ordering::SeqCst).max(0) as usize
    }

    /// Begin collection from the configured source. Call once per session.
    pub fn begin_collect(self: &Arc<Self>, params: CollectParams) {
        let me = Arc::clone(self);
        tokio::spawn(async move {
            me.collect.start(me.source.as_ref(), params, &me.events).await;
        });
    }

    /// Push `candidates` directly into the collect buffer, bypassing the configured `Source`, and
    /// re-trigger matching over the updated snapshot.
    pub fn inject(&self, candidates: impl IntoIterator<Item = Candidate<D>>) {
        self.collect.inject(candidates, &self.events);
    }

    /// Seed this orchestrator's state from a previously saved [`PickerContext`]: restores the
    /// query, selection, and each stage's belt index, then re-injects the saved items into the
    /// collect buffer so collection resumes where it left off instead of starting from scratch.
    pub fn seed(&self, context: PickerContext<D>) {
        *self.query.lock() = context.query;
        *self.selection.lock() = context.selection;

        self.matcher
            .switch(SwitchAction::Absolute(IndexArg::Absolute(context.matcher_index)));
        self.sorter
            .switch(SwitchAction::Absolute(IndexArg::Absolute(context.sorter_index)));
        self.renderer
            .switch(SwitchAction::Absolute(IndexArg::Absolute(context.renderer_index)));
        if let Some(previewer_index) = context.previewer_index {
            self.previewer
                .switch(SwitchAction::Absolute(IndexArg::Absolute(previewer_index)));
        }
        self.renderer.move_cursor_at(IndexArg::Absolute(context.cursor));

        let candidates = context
            .collected_items
            .into_iter()
            .map(|item| Candidate::new(item.value, item.detail));
        self.collect.inject(candidates, &self.events);
    }

    /// Run one render cycle: refresh the input driver, then drain and handle every queued event.
    pub async fn tick(&self, host: &dyn Host) -> Result<(), PickError> {
        if let Err(err) = self.input.refresh(host, &self.events).await {
            warn!(error = %err, "input driver refresh failed");
        }

        let mut pending = Vec::new();
        self.events.drain(|event| pending.push(event));
        for event in pending {
            self.handle_event(event);
        }
        Ok(())
    }

    /// Wait for the input driver to resolve (accept or cancel), invoking the chosen action if
    /// accepted. Returns `Ok(true)` if the caller should loop for another selection round.
    pub async fn finish(&self, host: &dyn Host) -> Result<bool, PickError> {
        match self.input.input().await {
            InputOutcome::Cancelled => Ok(false),
            InputOutcome::Accepted { query, action } => {
                *self.query.lock() = query.clone();
                let resolved_action = match action {
                    Some(name) if is_select_sentinel(&name) => {
                        match self.select_action_name(host).await {
                            Some(chosen) => Some(chosen),
                            None => return Ok(true),
                        }
                    }
                    other => other,
                };

                let filtered = self.sorter.published();
                let selected_ids = self.selection.lock().clone();
                let selected_items: Vec<Item<D>> = filtered
                    .iter()
                    .filter(|item| selected_ids.contains(&item.id))
                    .cloned()
                    .collect();
                let cursor_item = filtered.get(self.renderer.cursor()).cloned();

                self.actions
                    .invoke(
                        resolved_action.as_deref(),
                        host,
                        crate::ext::ActionContext {
                            item: cursor_item.as_ref(),
                            selected_items: &selected_items,
                            filtered_items: &filtered,
                            query: &query,
                            submatch_params: None,
                        },
                        CancellationToken::new(),
                    )
                    .await
            }
        }
    }

    /// Open a nested action-selection picker over the registered action names. Returns the chosen
    /// name, or `None` if the user cancelled (in which case control returns to the outer picker
    /// without closing it).
    async fn select_action_name(&self, host: &dyn Host) -> Option<String> {
        let mut names = self.actions.names();
        names.sort();
        let candidates: Vec<Candidate<()>> = names.into_iter().map(|n| Candidate::new(n, ())).collect();
        let source = VecSource::new(candidates);

        let collect = Arc::new(CollectProcessor::new(Default::default(), Vec::new()));
        collect
            .start(&source, CollectParams::default(), &EventQueue::new())
            .await;
        let collected = collect.snapshot();

        let matcher: Arc<dyn Matcher<()>> = Arc::new(SubstringMatcher);
        let renderer: Arc<dyn Renderer<()>> = Arc::new(PlainRenderer);

        let sub_matcher = Arc::new(MatchProcessor::new(
            vec![matcher],
            Default::default(),
            0,
            String::new(),
        ));
        let sub_renderer = Arc::new(RenderProcessor::new(vec![renderer], Default::default(), 0));
        let sub_events = Arc::new(EventQueue::new());
        let sub_input = InputDriver::new();

        loop {
            if let Err(err) = sub_input.refresh(host, &sub_events).await {
                warn!(error = %err, "nested action picker input refresh failed");
            }
            let mut cmdline_query = None;
            sub_events.drain(|event| {
                if let Event::CmdlineChanged(q) = event {
                    cmdline_query = Some(q);
                }
            });
            if let Some(query) = cmdline_query {
                sub_matcher.start(collected.clone(), query, true, Arc::clone(&sub_events));
            }
            sub_events.drain(|event| {
                if matches!(
                    event,
                    Event::Processor {
                        stage: Stage::Match,
                        lifecycle: StageLifecycle::Succeeded | StageLifecycle::Updated,
                    }
                ) {
                    sub_renderer.start(sub_matcher.published(), false, Arc::clone(&sub_events));
                }
            });

            match sub_input.input().await {
                InputOutcome::Cancelled => return None,
                InputOutcome::Accepted { .. } => {
                    let published = sub_matcher.published();
                    return published
                        .get(sub_renderer.cursor())
                        .map(|item| item.value.to_string());
                }
            }
        }
    }

    fn handle_event(&self, event: Event) {
        match event {
            Event::CmdlineChanged(query) => {
                *self.query.lock() = query.clone();
                self.matcher.start(
                    self.collect.snapshot(),
                    query,
                    true,
                    Arc::clone(&self.events),
                );
            }
            Event::CmdposChanged(pos) => {
                self.cmdpos.store(pos as i64, Ordering::SeqCst);
            }
            Event::MoveCursor { amount, scroll } => {
                let step = if scroll { amount * LIST_SCROLL_STEP } else { amount };
                self.renderer.move_cursor(step);
                self.reserve_preview();
            }
            Event::MoveCursorAt(arg) => {
                self.renderer.move_cursor_at(arg);
                self.reserve_preview();
            }
            Event::SelectItem { target, method } => {
                let id = match target {
                    Some(id) => Some(id),
                    None => self
                        .sorter
                        .published()
                        .get(self.renderer.cursor())
                        .map(|item| item.id),
                };
                if let Some(id) = id {
                    self.apply_select(id, method);
                }
            }
            Event::SelectAllItems { method } => {
                let ids: Vec<u64> = self.matcher.published().iter().map(|item| item.id).collect();
                for id in ids {
                    self.apply_select(id, method);
                }
            }
            Event::Switch { target, action } => self.handle_switch(target, action),
            Event::ActionInvoke(name) => {
                self.input.accept(self.query(), Some(name));
            }
            Event::ListComponentExecute(_) | Event::PreviewComponentExecute(_) => {
                // Pass-through commands are host concerns; the core has nothing to do for them.
            }
            Event::HelpToggle => {
                let mut help = self.help.lock();
                help.visible = !help.visible;
            }
            Event::HelpPage(amount) => {
                let mut help = self.help.lock();
                help.page += amount;
            }
            Event::Quit => {
                self.input.cancel();
            }
            Event::Processor { stage, lifecycle } => self.handle_processor_event(stage, lifecycle),
        }
    }

    fn handle_switch(&self, target: SwitchTarget, action: SwitchAction) {
        match target {
            SwitchTarget::Matcher => {
                if self.matcher.switch(action) {
                    self.matcher.start(
                        self.collect.snapshot(),
                        self.query(),
                        true,
                        Arc::clone(&self.events),
                    );
                }
            }
            SwitchTarget::Sorter => {
                if self.sorter.switch(action) {
                    self.sorter
                        .start(self.matcher.published(), true, Arc::clone(&self.events));
                }
            }
            SwitchTarget::Renderer => {
                if self.renderer.switch(action) {
                    self.renderer
                        .start(self.sorter.published(), true, Arc::clone(&self.events));
                }
            }
            SwitchTarget::Previewer => {
                if self.previewer.switch(action) {
                    self.reserve_preview();
                }
            }
        }
    }

    fn handle_processor_event(&self, stage: Stage, lifecycle: StageLifecycle) {
        match lifecycle {
            StageLifecycle::Started => {}
            StageLifecycle::Updated | StageLifecycle::Succeeded => {
                self.failures.lock().set(stage, None);
                match stage {
                    Stage::Collect => {
                        if matches!(lifecycle, StageLifecycle::Succeeded) {
                            self.collecting.store(false, Ordering::SeqCst);
                        }
                        self.matcher.start(
                            self.collect.snapshot(),
                            self.query(),
                            false,
                            Arc::clone(&self.events),
                        );
                    }
                    Stage::Match => {
                        self.sorter
                            .start(self.matcher.published(), false, Arc::clone(&self.events));
                    }
                    Stage::Sort => {
                        self.renderer
                            .start(self.sorter.published(), false, Arc::clone(&self.events));
                    }
                    Stage::Render => {
                        self.reserve_preview();
                    }
                    Stage::Preview => {}
                }
            }
            StageLifecycle::Failed { message } => {
                // `None` means cancellation: silently ignored per the error-handling design.
                if let Some(message) = message {
                    warn!(%stage, %message, "stage failed");
                    self.failures.lock().set(stage, Some(message));
                }
            }
        }
    }

    fn reserve_preview(&self) {
        let item = self.sorter.published().get(self.renderer.cursor()).cloned();
        self.previewer.start(item, true, Arc::clone(&self.events));
    }

    fn apply_select(&self, id: u64, method: SelectMethod) {
        let mut selection = self.selection.lock();
        match method {
            SelectMethod::On => {
                selection.insert(id);
            }
            SelectMethod::Off => {
                selection.remove(&id);
            }
            SelectMethod::Toggle => {
                if !selection.remove(&id) {
                    selection.insert(id);
                }
            }
        }
    }

    /// Capture the current state as a resumable [`PickerContext`].
    pub fn context(&self) -> PickerContext<D> {
        PickerContext {
            query: self.query(),
            selection: self.selection(),
            collected_items: self.collect.snapshot().to_vec(),
            filtered_items: self.sorter.published().to_vec(),
            cursor: self.renderer.cursor(),
            offset: self.renderer.offset(),
            matcher_index: self.matcher.matcher_index(),
            sorter_index: self.sorter.sorter_index().unwrap_or(0),
            renderer_index: self.renderer.renderer_index(),
            previewer_index: self.previewer.previewer_index(),
        }
    }
}
