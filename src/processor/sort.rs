//! # Sort Processor
//!
//! Applies the current [`Sorter`] to a shallow copy of the matched items. If no sorter is
//! configured, items pass through unchanged.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use super::Superseding;
use crate::{
    belt::{IndexArg, ItemBelt},
    error::Stage,
    event::{Event, EventQueue, StageLifecycle, SwitchAction},
    ext::{SortParams, Sorter},
    item::Item,
};

struct StartParams<D> {
    items: Arc<[Item<D>]>,
}

enum Belt<D> {
    Empty,
    Configured(ItemBelt<Arc<dyn Sorter<D>>>),
}

/// Applies the active sorter (if any) to a snapshot of matched items.
pub struct SortProcessor<D> {
    sorters: Mutex<Belt<D>>,
    runner: Superseding<StartParams<D>>,
    published: Mutex<Arc<[Item<D>]>>,
}

impl<D: Clone + Send + Sync + 'static> SortProcessor<D> {
    /// Construct a processor over `sorters`, which may be empty (pass-through). When non-empty,
    /// `initial_index` selects the starting strategy, clamped per [`ItemBelt`].
    pub fn new(sorters: Vec<Arc<dyn Sorter<D>>>, initial_index: usize) -> Self {
        let belt = if sorters.is_empty() {
            Belt::Empty
        } else {
            let mut belt = ItemBelt::new(sorters);
            belt.set_index(IndexArg::Absolute(initial_index));
            Belt::Configured(belt)
        };
        Self {
            sorters: Mutex::new(belt),
            runner: Superseding::new(),
            published: Mutex::new(Arc::from(Vec::new())),
        }
    }

    /// The most recently published sorted list.
    pub fn published(&self) -> Arc<[Item<D>]> {
        self.published.lock().clone()
    }

    /// Current index into the sorter belt, if any sorters are configured.
    pub fn sorter_index(&self) -> Option<usize> {
        match &*self.sorters.lock() {
            Belt::Empty => None,
            Belt::Configured(belt) => Some(belt.index()),
        }
    }

    /// Move the sorter belt, if configured. Returns whether the active sorter changed.
    pub fn switch(&self, action: SwitchAction) -> bool {
        match &mut *self.sorters.lock() {
            Belt::Empty => false,
            Belt::Configured(belt) => match action {
                SwitchAction::Relative { amount, cycle } => belt.move_relative(amount, cycle),
                SwitchAction::Absolute(arg) => belt.set_index(arg),
            },
        }
    }

    /// Request a (re-)sort over `items`.
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
            events.dispatch(Event::processor(Stage::Sort, StageLifecycle::Started));

            let sorter = match &*self.sorters.lock() {
                Belt::Empty => None,
                Belt::Configured(belt) => Some(Arc::clone(belt.current())),
            };

            let mut copy: Vec<Item<D>> = params.items.to_vec();
            let result = match sorter {
                None => Ok(()),
                Some(sorter) => {
                    sorter
                        .sort(SortParams { items: &mut copy }, token.clone())
                        .await
                }
            };

            if token.is_cancelled() {
                trace!("sort cancelled");
            } else {
                match result {
                    Ok(()) => {
                        *self.published.lock() = Arc::from(copy);
                        events.dispatch(Event::processor(Stage::Sort, StageLifecycle::Succeeded));
                    }
                    Err(err) => {
                        warn!(error = %err, "sort stage failed; falling back to unsorted list");
                        *self.published.lock() = params.items.clone();
                        events.dispatch(Event::processor(
                            Stage::Sort,
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

#[cfg(test)]
mod tests {
    use super::*;

    struct ReverseSorter;

    #[async_trait::async_trait]
    impl Sorter<()> for ReverseSorter {
        async fn sort(
            &self,
            params: SortParams<'_, ()>,
            _signal: CancellationToken,
        ) -> Result<(), crate::ext::BoxError> {
            params.items.reverse();
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait::async_trait]
    impl Sorter<()> for AlwaysFails {
        async fn sort(
            &self,
            _params: SortParams<'_, ()>,
            _signal: CancellationToken,
        ) -> Result<(), crate::ext::BoxError> {
            Err("boom".into())
        }
    }

    fn items(values: &[&str]) -> Arc<[Item<()>]> {
        values
            .iter()
            .enumerate()
            .map(|(id, v)| Item::new(id as u64, *v, ()))
            .collect::<Vec<_>>()
            .into()
    }

    #[tokio::test]
    async fn empty_belt_passes_items_through_unchanged() {
        let processor: Arc<SortProcessor<()>> = Arc::new(SortProcessor::new(Vec::new(), 0));
        let events = Arc::new(EventQueue::new());
        processor.start(items(&["b", "a"]), false, events);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let values: Vec<_> = processor.published().iter().map(|i| i.value.to_string()).collect();
        assert_eq!(values, vec!["b", "a"]);
        assert_eq!(processor.sorter_index(), None);
    }

    #[tokio::test]
    async fn configured_sorter_reorders_published_list() {
        let processor: Arc<SortProcessor<()>> =
            Arc::new(SortProcessor::new(vec![Arc::new(ReverseSorter)], 0));
        let events = Arc::new(EventQueue::new());
        processor.start(items(&["a", "b", "c"]), false, events);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let values: Vec<_> = processor.published().iter().map(|i| i.value.to_string()).collect();
        assert_eq!(values, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn failed_sort_falls_back_to_the_unsorted_list() {
        let processor: Arc<SortProcessor<()>> =
            Arc::new(SortProcessor::new(vec![Arc::new(AlwaysFails)], 0));
        let events = Arc::new(EventQueue::new());
        processor.start(items(&["a", "b"]), false, events.clone());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let values: Vec<_> = processor.published().iter().map(|i| i.value.to_string()).collect();
        assert_eq!(values, vec!["a", "b"]);

        let mut failed = 0;
        events.drain(|e| {
            if matches!(
                e,
                Event::Processor {
                    stage: Stage::Sort,
                    lifecycle: StageLifecycle::Failed { message: Some(_) }
                }
            ) {
                failed += 1;
            }
        });
        assert_eq!(failed, 1);
    }
}
