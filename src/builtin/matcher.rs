//! A [`Matcher`] that keeps items whose value contains the query as a case-insensitive substring,
//! preserving collection order.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    ext::{BoxError, MatchParams, Matcher},
    item::Item,
};

/// Case-insensitive substring filter. An empty query matches everything.
pub struct SubstringMatcher;

#[async_trait]
impl<D: Clone + Send + Sync + 'static> Matcher<D> for SubstringMatcher {
    async fn match_items(
        &self,
        params: MatchParams<D>,
        signal: CancellationToken,
    ) -> std::pin::Pin<Box<dyn tokio_stream::Stream<Item = Result<Item<D>, BoxError>> + Send>>
    {
        let needle = params.query.to_lowercase();
        let matched: Vec<Result<Item<D>, BoxError>> = params
            .items
            .iter()
            .filter(|item| needle.is_empty() || item.value.to_lowercase().contains(&needle))
            .cloned()
            .map(Ok)
            .collect();
        let _ = &signal;
        Box::pin(tokio_stream::iter(matched))
    }
}
