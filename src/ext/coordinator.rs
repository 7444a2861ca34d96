//! The [`Coordinator`] extension contract: turns a [`Theme`] and [`ScreenSize`] into concrete
//! component placement. Bit-level rendering (glyphs, borders, spinners) stays with the host; the
//! core only reads the handful of [`Theme`] fields it needs to make layout decisions.

/// Opaque style inputs read by the coordinator. The core only inspects `border`/`divider` and the
/// optional spinner/symbol fields; everything else is passed through untouched for the host's own
/// use.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Border style name, host-interpreted.
    pub border: Option<String>,
    /// Divider style name, host-interpreted.
    pub divider: Option<String>,
    /// Spinner glyph sequence shown while a stage is running.
    pub spinner: Option<Vec<String>>,
    /// Symbol shown next to a selected item.
    pub selected_symbol: Option<String>,
}

/// The host's reported terminal/window dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    /// Width in columns.
    pub columns: u16,
    /// Height in rows.
    pub rows: u16,
}

/// A resolved style, as computed from a [`Theme`].
#[derive(Debug, Clone, Default)]
pub struct Style {
    /// Border style to use.
    pub border: Option<String>,
    /// Divider style to use.
    pub divider: Option<String>,
}

/// Component placement and sizing, as computed for a given [`ScreenSize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Height, in rows, allocated to the match list.
    pub list_height: u16,
    /// Height, in rows, allocated to the preview pane; `0` if no previewer is configured.
    pub preview_height: u16,
    /// Width, in columns, allocated to the preview pane; `0` if stacked vertically with the list.
    pub preview_width: u16,
}

/// Produces component placement from a [`Theme`] and the host's reported screen size.
pub trait Coordinator: Send + Sync {
    /// Resolve a [`Theme`] into a concrete [`Style`].
    fn style(&self, theme: &Theme) -> Style;

    /// Compute component placement for the given screen size.
    fn layout(&self, screen: ScreenSize) -> Layout;
}
