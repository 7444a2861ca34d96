//! The [`Renderer`] extension contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::BoxError;
use crate::item::Item;

/// Parameters passed to [`Renderer::render`].
pub struct RenderParams<'a, D> {
    /// The visible window of items, already sliced to `[offset, offset + height)` by the render
    /// processor, with default `label`/`decorations` already applied.
    pub items: &'a mut [Item<D>],
}

/// Sets the display `label` and `decorations` on a window of items.
#[async_trait]
pub trait Renderer<D>: Send + Sync {
    /// Render `params.items` in place.
    async fn render(
        &self,
        params: RenderParams<'_, D>,
        signal: CancellationToken,
    ) -> Result<(), BoxError>;
}
