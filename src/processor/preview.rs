//! # Preview Processor
//!
//! Generates preview content for the item under the cursor via the active [`Previewer`], debounced
//! so that rapid cursor movement does not spawn a previewer invocation per keystroke.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use super::Superseding;
use crate::{
    belt::{IndexArg, ItemBelt},
    error::Stage,
    event::{Event, EventQueue, StageLifecycle, SwitchAction},
    ext::{PreviewParams, PreviewPayload, Previewer},
    item::Item,
};

/// Tunables for a [`PreviewProcessor`].
#[derive(Debug, Clone, Copy)]
pub struct PreviewOptions {
    /// How long to wait, after the last `start` call, before actually invoking the previewer.
    /// Default `150ms`.
    pub debounce: Duration,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
        }
    }
}

struct StartParams<D> {
    item: Option<Item<D>>,
}

enum Belt<D> {
    Empty,
    Configured(ItemBelt<Arc<dyn Previewer<D>>>),
}

/// Generates preview content for the item under the cursor, debouncing rapid successive requests.
pub struct PreviewProcessor<D> {
    previewers: Mutex<Belt<D>>,
    options: PreviewOptions,
    runner: Superseding<StartParams<D>>,
    published: Mutex<Option<PreviewPayload>>,
}

impl<D: Clone + Send + Sync + 'static> PreviewProcessor<D> {
    /// Construct a processor over `previewers`, which may be empty: the picker can run with no
    /// preview pane configured at all.
    pub fn new(
        previewers: Vec<Arc<dyn Previewer<D>>>,
        options: PreviewOptions,
        initial_index: usize,
    ) -> Self {
        let belt = if previewers.is_empty() {
            Belt::Empty
        } else {
            let mut belt = ItemBelt::new(previewers);
            belt.set_index(IndexArg::Absolute(initial_index));
            Belt::Configured(belt)
        };
        Self {
            previewers: Mutex::new(belt),
            options,
            runner: Superseding::new(),
            published: Mutex::new(None),
        }
    }

    /// The most recently published preview content, if any.
    pub fn published(&self) -> Option<PreviewPayload> {
        self.published.lock().clone()
    }

    /// Current index into the previewer belt, if any previewers are configured.
    pub fn previewer_index(&self) -> Option<usize> {
        match &*self.previewers.lock() {
            Belt::Empty => None,
            Belt::Configured(belt) => Some(belt.index()),
        }
    }

    /// Move the previewer belt, if configured. Returns whether the active previewer changed.
    pub fn switch(&self, action: SwitchAction) -> bool {
        match &mut *self.previewers.lock() {
            Belt::Empty => false,
            Belt::Configured(belt) => match action {
                SwitchAction::Relative { amount, cycle } => belt.move_relative(amount, cycle),
                SwitchAction::Absolute(arg) => belt.set_index(arg),
            },
        }
    }

    /// Request a preview of `item` (or clear the preview if `None`, e.g. an empty filtered list).
    /// No-ops silently if no previewer is configured.
    pub fn start(self: &Arc<Self>, item: Option<Item<D>>, restart: bool, events: Arc<EventQueue>) {
        if matches!(&*self.previewers.lock(), Belt::Empty) {
            return;
        }
        let params = StartParams { item };
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
            events.dispatch(Event::processor(Stage::Preview, StageLifecycle::Started));

            let debounced_out = tokio::select! {
                () = token.cancelled() => true,
                () = tokio::time::sleep(self.options.debounce) => false,
            };

            if !debounced_out {
                match &params.item {
                    None => {
                        *self.published.lock() = None;
                        events.dispatch(Event::processor(Stage::Preview, StageLifecycle::Succeeded));
                    }
                    Some(item) => {
                        let previewer = match &*self.previewers.lock() {
                            Belt::Empty => None,
                            Belt::Configured(belt) => Some(Arc::clone(belt.current())),
                        };
                        if let Some(previewer) = previewer {
                            let result = previewer
                                .preview(PreviewParams { item }, token.clone())
                                .await;
                            if token.is_cancelled() {
                                trace!("preview cancelled");
                            } else {
                                match result {
                                    Ok(payload) => {
                                        *self.published.lock() = payload;
                                        events.dispatch(Event::processor(
                                            Stage::Preview,
                                            StageLifecycle::Succeeded,
                                        ));
                                    }
                                    Err(err) => {
                                        warn!(error = %err, "preview stage failed");
                                        events.dispatch(Event::processor(
                                            Stage::Preview,
                                            StageLifecycle::Failed {
                                                message: Some(err.to_string()),
                                            },
                                        ));
                                    }
                                }
                            }
                        }
                    }
                }
            } else {
                trace!("preview debounce interrupted");
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

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoPreviewer;

    #[async_trait::async_trait]
    impl Previewer<&'static str> for EchoPreviewer {
        async fn preview(
            &self,
            params: PreviewParams<'_, &'static str>,
            _signal: CancellationToken,
        ) -> Result<Option<PreviewPayload>, crate::ext::BoxError> {
            Ok(Some(PreviewPayload {
                lines: vec![params.item.detail.to_string()],
                filetype: None,
            }))
        }
    }

    #[tokio::test]
    async fn debounces_and_publishes_the_latest_request() {
        let processor = Arc::new(PreviewProcessor::new(
            vec![Arc::new(EchoPreviewer)],
            PreviewOptions {
                debounce: Duration::from_millis(10),
            },
            0,
        ));
        let events = Arc::new(EventQueue::new());

        let item_a = Item::new(0, "a", "alpha");
        let item_b = Item::new(1, "b", "bravo");
        processor.start(Some(item_a), true, events.clone());
        processor.start(Some(item_b), true, events.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;

        let payload = processor.published().expect("a preview was published");
        assert_eq!(payload.lines, vec!["bravo".to_string()]);
    }

    #[test]
    fn empty_previewer_list_makes_switch_a_no_op() {
        let processor: PreviewProcessor<()> =
            PreviewProcessor::new(vec![], PreviewOptions::default(), 0);
        assert_eq!(processor.previewer_index(), None);
        assert!(!processor.switch(SwitchAction::Relative {
            amount: 1,
            cycle: true
        }));
    }
}
