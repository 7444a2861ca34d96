//! The [`Action`] extension contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{BoxError, Host};
use crate::item::Item;

/// The context handed to an [`Action`] when invoked.
pub struct ActionContext<'a, D> {
    /// The item under the cursor at invocation time, if any.
    pub item: Option<&'a Item<D>>,
    /// The currently selected items (may be empty, in which case `item` is the sole target).
    pub selected_items: &'a [Item<D>],
    /// The full matched-and-sorted list as of invocation.
    pub filtered_items: &'a [Item<D>],
    /// The query string as of invocation.
    pub query: &'a str,
    /// Parameters of a nested ("submatch") picker invocation, if this action opened one.
    pub submatch_params: Option<&'a super::CollectParams>,
}

/// A named, invokable terminal operation for a picker session.
///
/// `invoke` returning `Ok(true)` loops the picker for another selection round; `Ok(false)` exits
/// it. A stage error aborts the invocation and is surfaced through the usual error channel.
#[async_trait]
pub trait Action<D>: Send + Sync {
    /// Run the action against `context`.
    async fn invoke(
        &self,
        host: &dyn Host,
        context: ActionContext<'_, D>,
        signal: CancellationToken,
    ) -> Result<bool, BoxError>;
}
