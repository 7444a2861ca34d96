//! The [`Previewer`] extension contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::BoxError;
use crate::item::Item;

/// The content produced by a [`Previewer`] for the item under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPayload {
    /// The lines of preview content.
    pub lines: Vec<String>,
    /// An optional filetype hint the host may use for syntax highlighting.
    pub filetype: Option<String>,
}

/// Parameters passed to [`Previewer::preview`].
pub struct PreviewParams<'a, D> {
    /// The item under the cursor.
    pub item: &'a Item<D>,
}

/// Generates preview content for a single item.
#[async_trait]
pub trait Previewer<D>: Send + Sync {
    /// Generate preview content for `params.item`.
    async fn preview(
        &self,
        params: PreviewParams<'_, D>,
        signal: CancellationToken,
    ) -> Result<Option<PreviewPayload>, BoxError>;
}
