//! The [`Matcher`] extension contract.

use std::{pin::Pin, sync::Arc};

use async_trait::async_trait;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use super::BoxError;
use crate::item::Item;

/// Parameters passed to [`Matcher::match_items`].
pub struct MatchParams<D> {
    /// The collected items to filter, as a fully-formed snapshot at call time.
    pub items: Arc<[Item<D>]>,
    /// The current query string.
    pub query: String,
}

/// A cancellable async producer that filters (and may reorder within ties, or assign a score to)
/// a snapshot of collected items against a query.
///
/// Order must be preserved for ties unless the matcher documents otherwise: this is the matcher's
/// responsibility, not the match processor's.
#[async_trait]
pub trait Matcher<D>: Send + Sync {
    /// Filter `params.items` against `params.query`.
    async fn match_items(
        &self,
        params: MatchParams<D>,
        signal: CancellationToken,
    ) -> Pin<Box<dyn Stream<Item = Result<Item<D>, BoxError>> + Send>>;

    /// Whether this matcher supports incremental publication of partial results mid-run.
    ///
    /// Defaults to `true`, since most substring/fuzzy matchers can usefully publish partial
    /// matches as they are found.
    fn incremental(&self) -> bool {
        true
    }
}
