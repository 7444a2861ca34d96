//! # Input Driver
//!
//! Observes the host's command-line string and cursor position, emitting
//! [`Event::CmdlineChanged`]/[`Event::CmdposChanged`] when they change, and exposes the
//! accept/cancel terminal transition the orchestrator's action-selection flow drives.

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::{
    event::{Event, EventQueue},
    ext::{BoxError, Host},
};

/// How an [`InputDriver::input`] call resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// The user accepted, optionally naming an action to invoke (`None` means the default
    /// action).
    Accepted {
        /// The final query string at the moment of acceptance.
        query: String,
        /// The action name from `action-invoke{name}`, if any.
        action: Option<String>,
    },
    /// The user cancelled without selecting anything.
    Cancelled,
}

/// Normalize a raw host command-line string before diffing: `\n`/`\t` collapse to a single space,
/// and any other control character is dropped.
fn normalize_cmdline(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            '\n' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Tracks the host's command-line state and arbitrates the single pending accept/cancel.
pub struct InputDriver {
    last_cmdline: Mutex<String>,
    last_cmdpos: Mutex<usize>,
    pending: Mutex<Option<oneshot::Sender<InputOutcome>>>,
}

impl Default for InputDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDriver {
    /// Construct a driver with no observed command-line state yet.
    pub fn new() -> Self {
        Self {
            last_cmdline: Mutex::new(String::new()),
            last_cmdpos: Mutex::new(0),
            pending: Mutex::new(None),
        }
    }

    /// Poll the host's command-line state once, dispatching change events for whichever of
    /// `cmdline`/`cmdpos` differ from the last observed values.
    ///
    /// The raw string is normalized before diffing: `\n`/`\t` become a single space, and any
    /// other control character is dropped.
    pub async fn refresh(&self, host: &dyn Host, events: &EventQueue) -> Result<(), BoxError> {
        let (raw_cmdline, cmdpos) = host.read_cmdline().await?;
        let cmdline = normalize_cmdline(&raw_cmdline);

        let changed_line = {
            let mut last = self.last_cmdline.lock();
            if *last == cmdline {
                false
            } else {
                *last = cmdline.clone();
                true
            }
        };
        if changed_line {
            events.dispatch(Event::CmdlineChanged(cmdline));
        }

        let changed_pos = {
            let mut last = self.last_cmdpos.lock();
            if *last == cmdpos {
                false
            } else {
                *last = cmdpos;
                true
            }
        };
        if changed_pos {
            events.dispatch(Event::CmdposChanged(cmdpos));
        }

        Ok(())
    }

    /// Wait for the next terminal transition: an explicit [`accept`](Self::accept)/[`cancel`](Self::cancel)
    /// call, or the receiver being dropped (treated as cancellation).
    ///
    /// Only one call may be outstanding at a time; a new call replaces any previous unresolved
    /// one, which then resolves to [`InputOutcome::Cancelled`].
    pub async fn input(&self) -> InputOutcome {
        let (tx, rx) = oneshot::channel();
        if let Some(previous) = self.pending.lock().replace(tx) {
            let _ = previous.send(InputOutcome::Cancelled);
        }
        rx.await.unwrap_or(InputOutcome::Cancelled)
    }

    /// Programmatically accept with `query` and an optional named action, resolving the
    /// outstanding [`input`](Self::input) call, if any. Returns whether a call was actually
    /// waiting.
    pub fn accept(&self, query: String, action: Option<String>) -> bool {
        match self.pending.lock().take() {
            Some(tx) => tx.send(InputOutcome::Accepted { query, action }).is_ok(),
            None => false,
        }
    }

    /// Cancel the outstanding [`input`](Self::input) call, if any. Returns whether a call was
    /// actually waiting.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(tx) => tx.send(InputOutcome::Cancelled).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::ext::{Decoration, ScreenSize};

    struct FixedHost(Mutex<(String, usize)>);

    #[async_trait]
    impl Host for FixedHost {
        async fn open_window(&self) -> Result<(crate::ext::WindowId, ScreenSize), BoxError> {
            unimplemented!()
        }
        async fn move_window(
            &self,
            _window: crate::ext::WindowId,
            _size: ScreenSize,
        ) -> Result<(), BoxError> {
            unimplemented!()
        }
        async fn close_window(&self, _window: crate::ext::WindowId) -> Result<(), BoxError> {
            unimplemented!()
        }
        async fn read_cmdline(&self) -> Result<(String, usize), BoxError> {
            Ok(self.0.lock().clone())
        }
        async fn write_buffer(
            &self,
            _window: crate::ext::WindowId,
            _lines: &[String],
        ) -> Result<(), BoxError> {
            unimplemented!()
        }
        async fn set_decorations(
            &self,
            _window: crate::ext::WindowId,
            _decorations: &[Decoration],
        ) -> Result<(), BoxError> {
            unimplemented!()
        }
        async fn request_redraw(&self) -> Result<(), BoxError> {
            unimplemented!()
        }
        async fn emit_event(&self, _event: crate::ext::HostEvent) -> Result<(), BoxError> {
            unimplemented!()
        }
    }

    #[test]
    fn normalize_cmdline_collapses_newlines_and_tabs_and_drops_other_control_chars() {
        assert_eq!(normalize_cmdline("a\nb\tc"), "a b c");
        assert_eq!(normalize_cmdline("a\u{7}b"), "ab");
        assert_eq!(normalize_cmdline("plain"), "plain");
    }

    #[tokio::test]
    async fn refresh_dispatches_only_on_change() {
        let host = FixedHost(Mutex::new(("abc".into(), 3)));
        let driver = InputDriver::new();
        let events = EventQueue::new();

        driver.refresh(&host, &events).await.unwrap();
        assert_eq!(events.len(), 2);
        events.drain(|_| {});

        driver.refresh(&host, &events).await.unwrap();
        assert_eq!(events.len(), 0);

        host.0.lock().1 = 4;
        driver.refresh(&host, &events).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn accept_resolves_the_pending_input_call() {
        let driver = Arc::new(InputDriver::new());
        let waiter = tokio::spawn({
            let driver = Arc::clone(&driver);
            async move { driver.input().await }
        });
        tokio::task::yield_now().await;
        assert!(driver.accept("hello".into(), Some("open".into())));

        let outcome = waiter.await.unwrap();
        assert_eq!(
            outcome,
            InputOutcome::Accepted {
                query: "hello".into(),
                action: Some("open".into()),
            }
        );
    }

    #[tokio::test]
    async fn second_input_call_cancels_the_first() {
        let driver = Arc::new(InputDriver::new());
        let first = tokio::spawn({
            let driver = Arc::clone(&driver);
            async move { driver.input().await }
        });
        tokio::task::yield_now().await;

        let second = tokio::spawn({
            let driver = Arc::clone(&driver);
            async move { driver.input().await }
        });
        tokio::task::yield_now().await;
        driver.cancel();

        assert_eq!(first.await.unwrap(), InputOutcome::Cancelled);
        assert_eq!(second.await.unwrap(), InputOutcome::Cancelled);
    }
}
