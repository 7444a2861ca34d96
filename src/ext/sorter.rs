//! The [`Sorter`] extension contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::BoxError;
use crate::item::Item;

/// Parameters passed to [`Sorter::sort`].
pub struct SortParams<'a, D> {
    /// The items to sort, owned by the sort processor for the duration of the call so the sorter
    /// may mutate them in place.
    pub items: &'a mut Vec<Item<D>>,
}

/// Reorders a list of items in place.
#[async_trait]
pub trait Sorter<D>: Send + Sync {
    /// Sort `params.items` in place.
    async fn sort(
        &self,
        params: SortParams<'_, D>,
        signal: CancellationToken,
    ) -> Result<(), BoxError>;
}
