//! # Extension contracts
//!
//! The core consumes five swappable strategies — [`Source`], [`Matcher`], [`Sorter`],
//! [`Renderer`], and [`Previewer`] — plus an [`Action`], a [`Coordinator`], and a [`Host`].
//! None of these are implemented here: concrete fuzzy-scoring matchers, concrete file-walking
//! sources, and bit-level UI rendering are all explicitly out of scope for the core engine. A
//! small set of toy reference implementations usable in tests and demos lives in
//! [`crate::builtin`].

mod action;
mod coordinator;
mod host;
mod matcher;
mod previewer;
mod renderer;
mod sorter;
mod source;

pub use action::{Action, ActionContext};
pub use coordinator::{Coordinator, Layout, ScreenSize, Style, Theme};
pub use crate::item::Decoration;
pub use host::{Host, HostEvent, WindowId};
pub use matcher::{MatchParams, Matcher};
pub use previewer::{PreviewParams, PreviewPayload, Previewer};
pub use renderer::{RenderParams, Renderer};
pub use sorter::{SortParams, Sorter};
pub use source::{Candidate, CollectParams, ItemStream, Source};

/// A boxed, type-erased error as produced by any extension implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
