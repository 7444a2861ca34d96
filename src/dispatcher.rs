//! # Action Dispatcher
//!
//! Resolves a chosen action name against the picker's action map, and recognizes the `"@select"`
//! sentinel that asks the orchestrator to open a nested action-selection picker instead of
//! invoking anything directly.

use std::{collections::HashMap, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::{
    error::{ExpectedError, PickError},
    ext::{Action, ActionContext, Host},
};

/// The action name that asks the orchestrator to open a nested action-selection picker rather
/// than invoking an action directly.
pub const SELECT_ACTION_SENTINEL: &str = "@select";

/// Whether `name` is the [`SELECT_ACTION_SENTINEL`].
pub fn is_select_sentinel(name: &str) -> bool {
    name == SELECT_ACTION_SENTINEL
}

/// Resolves action names to [`Action`] implementations and invokes them.
pub struct ActionDispatcher<D> {
    actions: HashMap<String, Arc<dyn Action<D>>>,
    default_action: String,
}

impl<D> ActionDispatcher<D> {
    /// Construct a dispatcher over `actions`, using `default_action` when [`invoke`](Self::invoke)
    /// is called with `None`.
    pub fn new(actions: HashMap<String, Arc<dyn Action<D>>>, default_action: impl Into<String>) -> Self {
        Self {
            actions,
            default_action: default_action.into(),
        }
    }

    /// The registered action names, in arbitrary order (callers that need a stable order, e.g. to
    /// populate a nested action picker, should sort the result).
    pub fn names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    /// Look up an action by name without invoking it.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn Action<D>>, ExpectedError> {
        let name = name.unwrap_or(&self.default_action);
        self.actions
            .get(name)
            .cloned()
            .ok_or_else(|| ExpectedError::UnknownAction(name.to_string()))
    }

    /// Invoke the action named `name` (or the default action, if `None`).
    ///
    /// Returns `Ok(true)` when the picker should loop for another selection round, `Ok(false)`
    /// when it should exit. An unknown name surfaces as [`PickError::Expected`]; an error from the
    /// action itself surfaces as [`PickError::Action`].
    pub async fn invoke(
        &self,
        name: Option<&str>,
        host: &dyn Host,
        context: ActionContext<'_, D>,
        signal: CancellationToken,
    ) -> Result<bool, PickError> {
        let action = self.resolve(name)?;
        action
            .invoke(host, context, signal)
            .await
            .map_err(PickError::Action)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::item::Item;

    struct AlwaysExit;

    #[async_trait]
    impl Action<()> for AlwaysExit {
        async fn invoke(
            &self,
            _host: &dyn Host,
            _context: ActionContext<'_, ()>,
            _signal: CancellationToken,
        ) -> Result<bool, crate::ext::BoxError> {
            Ok(false)
        }
    }

    struct FakeHost;

    #[async_trait]
    impl Host for FakeHost {
        async fn open_window(
            &self,
        ) -> Result<(crate::ext::WindowId, crate::ext::ScreenSize), crate::ext::BoxError>
        {
            unimplemented!()
        }
        async fn move_window(
            &self,
            _window: crate::ext::WindowId,
            _size: crate::ext::ScreenSize,
        ) -> Result<(), crate::ext::BoxError> {
            unimplemented!()
        }
        async fn close_window(
            &self,
            _window: crate::ext::WindowId,
        ) -> Result<(), crate::ext::BoxError> {
            unimplemented!()
        }
        async fn read_cmdline(&self) -> Result<(String, usize), crate::ext::BoxError> {
            unimplemented!()
        }
        async fn write_buffer(
            &self,
            _window: crate::ext::WindowId,
            _lines: &[String],
        ) -> Result<(), crate::ext::BoxError> {
            unimplemented!()
        }
        async fn set_decorations(
            &self,
            _window: crate::ext::WindowId,
            _decorations: &[crate::item::Decoration],
        ) -> Result<(), crate::ext::BoxError> {
            unimplemented!()
        }
        async fn request_redraw(&self) -> Result<(), crate::ext::BoxError> {
            unimplemented!()
        }
        async fn emit_event(&self, _event: crate::ext::HostEvent) -> Result<(), crate::ext::BoxError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn unknown_action_is_an_expected_error() {
        let dispatcher: ActionDispatcher<()> = ActionDispatcher::new(HashMap::new(), "open");
        let host = FakeHost;
        let result = dispatcher
            .invoke(
                Some("missing"),
                &host,
                ActionContext {
                    item: None,
                    selected_items: &[],
                    filtered_items: &[],
                    query: "",
                    submatch_params: None,
                },
                CancellationToken::new(),
            )
            .await;
        assert!(matches!(
            result,
            Err(PickError::Expected(ExpectedError::UnknownAction(_)))
        ));
    }

    #[tokio::test]
    async fn default_action_runs_when_no_name_given() {
        let mut actions: HashMap<String, Arc<dyn Action<()>>> = HashMap::new();
        actions.insert("open".into(), Arc::new(AlwaysExit));
        let dispatcher = ActionDispatcher::new(actions, "open");
        let host = FakeHost;
        let item: Item<()> = Item::new(0, "a", ());
        let result = dispatcher
            .invoke(
                None,
                &host,
                ActionContext {
                    item: Some(&item),
                    selected_items: &[],
                    filtered_items: &[],
                    query: "",
                    submatch_params: None,
                },
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(!result);
    }

    #[test]
    fn recognizes_select_sentinel() {
        assert!(is_select_sentinel("@select"));
        assert!(!is_select_sentinel("open"));
    }
}
