//! A [`Previewer`] that shows an item's `value` and `Debug`-formatted `detail` as plain text.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::ext::{BoxError, PreviewParams, PreviewPayload, Previewer};

/// Previews `{value}\n{detail:?}` with no filetype hint.
pub struct PlainPreviewer;

#[async_trait]
impl<D: std::fmt::Debug + Send + Sync> Previewer<D> for PlainPreviewer {
    async fn preview(
        &self,
        params: PreviewParams<'_, D>,
        _signal: CancellationToken,
    ) -> Result<Option<PreviewPayload>, BoxError> {
        Ok(Some(PreviewPayload {
            lines: vec![
                params.item.value.to_string(),
                format!("{:?}", params.item.detail),
            ],
            filetype: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;

    #[tokio::test]
    async fn previews_value_and_detail() {
        let item = Item::new(0u64, "a", 42);
        let payload = PlainPreviewer
            .preview(PreviewParams { item: &item }, CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload.lines, vec!["a".to_string(), "42".to_string()]);
    }
}
