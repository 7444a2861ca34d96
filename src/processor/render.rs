//! # Render Processor
//!
//! Owns the cursor/offset/height state and produces the visible window of display items via the
//! active [`Renderer`].

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use super::Superseding;
use crate::{
    belt::{IndexArg, ItemBelt},
    error::Stage,
    event::{Event, EventQueue, StageLifecycle, SwitchAction},
    ext::{RenderParams, Renderer},
    item::Item,
};

/// Tunables for a [`RenderProcessor`].
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Number of visible rows.
    pub height: usize,
    /// Rows of padding to keep between the cursor and the edge of the window when scrolling, when
    /// the window is tall enough to afford it.
    pub scroll_offset: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            height: 20,
            scroll_offset: 2,
        }
    }
}

struct StartParams<D> {
    items: Arc<[Item<D>]>,
}

/// Produces the visible window of [`Item`]s, tracking cursor/offset state across calls.
pub struct RenderProcessor<D> {
    renderers: Mutex<ItemBelt<Arc<dyn Renderer<D>>>>,
    options: Mutex<RenderOptions>,
    cursor: AtomicUsize,
    offset: AtomicUsize,
    last_item_count: AtomicUsize,
    runner: Superseding<StartParams<D>>,
    window: Mutex<Arc<[Item<D>]>>,
}

impl<D: Clone + Send + Sync + 'static> RenderProcessor<D> {
    /// Construct a processor over a non-empty list of renderers.
    pub fn new(
        renderers: Vec<Arc<dyn Renderer<D>>>,
        options: RenderOptions,
        initial_index: usize,
    ) -> Self {
        let mut belt = ItemBelt::new(renderers);
        belt.set_index(IndexArg::Absolute(initial_index));
        Self {
            renderers: Mutex::new(belt),
            options: Mutex::new(options),
            cursor: AtomicUsize::new(0),
            offset: AtomicUsize::new(0),
            last_item_count: AtomicUsize::new(0),
            runner: Superseding::new(),
            window: Mutex::new(Arc::from(Vec::new())),
        }
    }

    /// Current cursor position, an index into the last-published filtered list.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Current scroll offset: the first visible row's index into the filtered list.
    pub fn offset(&self) -> usize {
        self.offset.load(Ordering::SeqCst)
    }

    /// The cursor's 1-based row within the visible window, for the host to place its own cursor.
    pub fn line(&self) -> usize {
        self.cursor().saturating_sub(self.offset()) + 1
    }

    /// Current index into the renderer belt.
    pub fn renderer_index(&self) -> usize {
        self.renderers.lock().index()
    }

    /// The most recently published visible window of items.
    pub fn window(&self) -> Arc<[Item<D>]> {
        self.window.lock().clone()
    }

    /// Change the configured window height, reclamping the offset against the last known item
    /// count.
    pub fn set_height(&self, height: usize) {
        self.options.lock().height = height;
        self.reclamp();
    }

    /// Move the cursor by a relative amount (already scaled by the caller if `scroll` semantics
    /// applied).
    pub fn move_cursor(&self, amount: i64) {
        let count = self.last_item_count.load(Ordering::SeqCst);
        let max = count.saturating_sub(1) as i64;
        let next = (self.cursor() as i64 + amount).clamp(0, max.max(0));
        self.cursor.store(next as usize, Ordering::SeqCst);
        self.reclamp();
    }

    /// Move the cursor to an absolute position (accepting the `"$"` sentinel for "last item").
    pub fn move_cursor_at(&self, arg: IndexArg) {
        let count = self.last_item_count.load(Ordering::SeqCst);
        let max = count.saturating_sub(1);
        let target = match arg {
            IndexArg::Absolute(i) => i.min(max),
            IndexArg::Last => max,
        };
        self.cursor.store(target, Ordering::SeqCst);
        self.reclamp();
    }

    /// Move the renderer belt. Returns whether the active renderer changed.
    pub fn switch(&self, action: SwitchAction) -> bool {
        let mut belt = self.renderers.lock();
        match action {
            SwitchAction::Relative { amount, cycle } => belt.move_relative(amount, cycle),
            SwitchAction::Absolute(arg) => belt.set_index(arg),
        }
    }

    fn reclamp(&self) {
        let count = self.last_item_count.load(Ordering::SeqCst);
        let height = self.options.lock().height.max(1);
        let scroll = self.options.lock().scroll_offset.min(height.saturating_sub(1) / 2);
        let cursor = self.cursor();
        let mut offset = self.offset();

        let lower = offset.saturating_add(scroll);
        let upper = offset.saturating_add(height).saturating_sub(scroll);
        if cursor < lower {
            offset = cursor.saturating_sub(scroll);
        } else if upper > 0 && cursor >= upper {
            offset = cursor + scroll + 1 - height.min(cursor + scroll + 1);
        }

        let max_offset = count.saturating_sub(height);
        offset = offset.min(max_offset);
        self.offset.store(offset, Ordering::SeqCst);
    }

    /// Request a render over `items`: clamps the cursor, recomputes the offset, slices the
    /// visible window, and hands it to the active renderer.
    pub fn start(self: &Arc<Self>, items: Arc<[Item<D>]>, restart: bool, events: Arc<EventQueue>) {
        let params = StartParams { items };
        if let Some((params, token)) = self.runner.start(params, restart) {
            let me = Arc::clone(self);
            tokio::spawn(async move {
                me.drive(params, token, events).await;
            });
        }
    }

    async fn drive(
        self: Arc<Self>,
        mut params: StartParams<D>,
        mut token: CancellationToken,
        events: Arc<EventQueue>,
    ) {
        loop {
            events.dispatch(Event::processor(Stage::Render, StageLifecycle::Started));

            let item_count = params.items.len();
            self.last_item_count.store(item_count, Ordering::SeqCst);
            let max_cursor = item_count.saturating_sub(1);
            if self.cursor() > max_cursor {
                self.cursor.store(max_cursor, Ordering::SeqCst);
            }
            self.reclamp();

            let height = self.options.lock().height;
            let offset = self.offset();
            let end = (offset + height).min(item_count);
            let mut window: Vec<Item<D>> = params.items[offset..end].to_vec();
            for item in &mut window {
                if item.label.is_none() {
                    item.label = Some(item.value.clone());
                }
            }

            let renderer = Arc::clone(self.renderers.lock().current());
            let result = renderer
                .render(RenderParams { items: &mut window }, token.clone())
                .await;

            if token.is_cancelled() {
                trace!("render cancelled");
            } else {
                match result {
                    Ok(()) => {
                        *self.window.lock() = Arc::from(window);
                        events.dispatch(Event::processor(Stage::Render, StageLifecycle::Succeeded));
                    }
                    Err(err) => {
                        warn!(error = %err, "render stage failed");
                        *self.window.lock() = Arc::from(window);
                        events.dispatch(Event::processor(
                            Stage::Render,
                            StageLifecycle::Failed {
                                message: Some(err.to_string()),
                            },
                        ));
                    }
                }
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
