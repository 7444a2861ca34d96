//! A [`Source`] over a fixed, already-known vector of candidates.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::ext::{BoxError, Candidate, CollectParams, ItemStream, Source};

/// Yields a fixed list of candidates, ignoring [`CollectParams`] entirely.
///
/// Useful for tests, demos, and the engine's own nested action-selection picker, where the full
/// candidate set is already materialized in memory.
pub struct VecSource<D> {
    candidates: Vec<Candidate<D>>,
}

impl<D> VecSource<D> {
    /// Construct a source yielding exactly `candidates`, in order.
    pub fn new(candidates: Vec<Candidate<D>>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl<D: Clone + Send + Sync + 'static> Source<D> for VecSource<D> {
    async fn collect(&self, _params: CollectParams, _signal: CancellationToken) -> ItemStream<D> {
        let items: Vec<Result<Candidate<D>, BoxError>> =
            self.candidates.iter().cloned().map(Ok).collect();
        Box::pin(tokio_stream::iter(items))
    }
}
