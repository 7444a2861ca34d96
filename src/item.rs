//! # The item data model
//!
//! An [`Item`] is the unit that flows through every stage of the pipeline: it is produced
//! by a [`Source`](crate::ext::Source) during collection, filtered by a
//! [`Matcher`](crate::ext::Matcher), reordered by a [`Sorter`](crate::ext::Sorter), and finally
//! given a display form by a [`Renderer`](crate::ext::Renderer).

use std::sync::Arc;

/// A single inline highlight span attached to an [`Item`]'s label.
///
/// Columns and lengths are measured in UTF-8 byte offsets into the rendered label, matching the
/// convention used by most terminal highlight APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decoration {
    /// Zero-based line offset, for multi-line labels. Almost always `0`.
    pub line: usize,
    /// Byte offset of the span start within the line.
    pub column: usize,
    /// Byte length of the span.
    pub length: usize,
    /// Opaque highlight group name; the host interprets this.
    pub highlight: String,
}

/// A unit of data flowing through the picker pipeline.
///
/// See the [module-level documentation](self) for the item's role at each stage.
///
/// ## Invariants
/// Within a single collection run all items produced by [`CollectProcessor`](crate::processor::collect::CollectProcessor)
/// have distinct [`value`](Item::value) and distinct [`id`](Item::id); `id` equals the 0-based
/// insertion order into the collected buffer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item<D> {
    /// Unique integer assigned by the collect processor on entry, equal to insertion order.
    pub id: u64,
    /// The opaque identifier used for selection and as the dedup key during collection.
    pub value: Arc<str>,
    /// Structured payload consumed by renderers, previewers, and actions.
    pub detail: D,
    /// Display label; defaults to a clone of [`value`](Item::value) until a renderer overrides it.
    pub label: Option<Arc<str>>,
    /// Inline highlight spans set by a renderer.
    pub decorations: Vec<Decoration>,
    /// Score assigned by the active matcher, if any.
    pub score: Option<f64>,
}

impl<D> Item<D> {
    /// Construct a fresh item as it would appear immediately after collection: no label override,
    /// no decorations, no score.
    pub fn new(id: u64, value: impl Into<Arc<str>>, detail: D) -> Self {
        Self {
            id,
            value: value.into(),
            detail,
            label: None,
            decorations: Vec::new(),
            score: None,
        }
    }

    /// The label as it should be displayed: the explicit [`label`](Item::label) if a renderer set
    /// one, otherwise the [`value`](Item::value).
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

/// The resumable snapshot of a picker session, as described by the session store contract.
///
/// This is cheap to clone except for `collected_items`/`filtered_items`, which are typically the
/// dominant cost of a session; callers that serialize a [`PickerContext`] repeatedly should prefer
/// sharing the `Arc` underlying [`Item::value`] rather than deep-cloning full buffers per save.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PickerContext<D> {
    /// The last query string entered by the user.
    pub query: String,
    /// The set of selected item ids, always a subset of `collected_items`' ids.
    pub selection: std::collections::BTreeSet<u64>,
    /// All items accepted by the collect processor during the run, in insertion order.
    pub collected_items: Vec<Item<D>>,
    /// The most recently published matched-and-sorted items.
    pub filtered_items: Vec<Item<D>>,
    /// Cursor position into `filtered_items`.
    pub cursor: usize,
    /// Scroll offset of the render window.
    pub offset: usize,
    /// Index into the matcher belt.
    pub matcher_index: usize,
    /// Index into the sorter belt.
    pub sorter_index: usize,
    /// Index into the renderer belt.
    pub renderer_index: usize,
    /// Index into the previewer belt, if the picker has any previewers configured.
    pub previewer_index: Option<usize>,
}

impl<D> Default for PickerContext<D> {
    fn default() -> Self {
        Self {
            query: String::new(),
            selection: std::collections::BTreeSet::new(),
            collected_items: Vec::new(),
            filtered_items: Vec::new(),
            cursor: 0,
            offset: 0,
            matcher_index: 0,
            sorter_index: 0,
            renderer_index: 0,
            previewer_index: None,
        }
    }
}
