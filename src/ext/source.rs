//! The [`Source`] extension contract.

use std::{pin::Pin, sync::Arc};

use async_trait::async_trait;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use super::BoxError;

/// A single item as produced by a [`Source`], before the collect processor assigns it an `id`.
#[derive(Debug, Clone)]
pub struct Candidate<D> {
    /// The opaque identifier used for selection and as the dedup key during collection.
    pub value: Arc<str>,
    /// Structured payload consumed by later stages.
    pub detail: D,
}

impl<D> Candidate<D> {
    /// Construct a candidate item.
    pub fn new(value: impl Into<Arc<str>>, detail: D) -> Self {
        Self {
            value: value.into(),
            detail,
        }
    }
}

/// Parameters passed to [`Source::collect`]. Reserved for future extension (e.g. resume hints);
/// currently carries the raw invocation arguments the host passed when opening the picker.
#[derive(Debug, Clone, Default)]
pub struct CollectParams {
    /// Extra arguments supplied by the user when opening the picker (source-specific syntax).
    pub args: Vec<String>,
}

/// The stream type returned by [`Source::collect`]: a pull-based, cooperatively cancellable,
/// possibly-infinite sequence of candidates or stage errors.
pub type ItemStream<D> = Pin<Box<dyn Stream<Item = Result<Candidate<D>, BoxError>> + Send>>;

/// A cancellable, possibly-infinite async producer of items.
///
/// Implementations must be cancellable via `signal`: once `signal.is_cancelled()` becomes true
/// the returned stream should stop yielding items promptly (it is not required to have already
/// stopped by the time `collect` returns, since the stream itself is polled independently).
#[async_trait]
pub trait Source<D>: Send + Sync {
    /// Begin producing items for the given invocation parameters.
    async fn collect(&self, params: CollectParams, signal: CancellationToken) -> ItemStream<D>;
}
