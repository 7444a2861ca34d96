//! The [`Host`] extension contract: what the core demands from the editor host.
//!
//! None of this is implemented by the core itself — window management, buffer I/O, and the
//! command-line are all host concerns. The core only calls through this trait.

use async_trait::async_trait;

use super::BoxError;
use crate::item::Decoration;

/// A host-assigned identifier for an open floating window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// A named, autocmd-like notification the core asks the host to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The picker UI became visible.
    PickerEnter,
    /// The picker UI was torn down.
    PickerLeave,
    /// A user-defined picker/action/source was loaded.
    CustomLoaded,
    /// A user-defined picker/action/source was reloaded.
    CustomRecached,
}

/// What the core demands from the editor host: floating window lifecycle, buffer I/O, the
/// command line, and autocmd-like notifications.
#[async_trait]
pub trait Host: Send + Sync {
    /// Open a floating window with a buffer, returning its id and the granted size.
    async fn open_window(&self) -> Result<(WindowId, super::ScreenSize), BoxError>;

    /// Move or resize an already-open window.
    async fn move_window(
        &self,
        window: WindowId,
        size: super::ScreenSize,
    ) -> Result<(), BoxError>;

    /// Close a window and release its buffer.
    async fn close_window(&self, window: WindowId) -> Result<(), BoxError>;

    /// Read the current command-line string and cursor position.
    async fn read_cmdline(&self) -> Result<(String, usize), BoxError>;

    /// Replace the contents of `window`'s buffer with `lines`.
    async fn write_buffer(&self, window: WindowId, lines: &[String]) -> Result<(), BoxError>;

    /// Attach inline decorations to `window`'s buffer, replacing any previously attached set.
    async fn set_decorations(
        &self,
        window: WindowId,
        decorations: &[Decoration],
    ) -> Result<(), BoxError>;

    /// Request that the host redraw the screen.
    async fn request_redraw(&self) -> Result<(), BoxError>;

    /// Emit a named, autocmd-like user event.
    async fn emit_event(&self, event: HostEvent) -> Result<(), BoxError>;
}
