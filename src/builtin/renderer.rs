//! A [`Renderer`] that displays each item's `value` unchanged, with no decorations.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::ext::{BoxError, RenderParams, Renderer};

/// Sets `label` to a clone of `value` and leaves `decorations` empty.
///
/// This happens to be identical to the render processor's own default, so `PlainRenderer` is only
/// useful as an explicit belt entry alongside renderers that actually transform the label.
pub struct PlainRenderer;

#[async_trait]
impl<D: Send + Sync> Renderer<D> for PlainRenderer {
    async fn render(
        &self,
        params: RenderParams<'_, D>,
        _signal: CancellationToken,
    ) -> Result<(), BoxError> {
        for item in params.items {
            item.label = Some(item.value.clone());
        }
        Ok(())
    }
}
