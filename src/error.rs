//! # Error taxonomy
//!
//! Implements the taxonomy from the design: *expected* (user-fixable), *cancellation* (not an
//! error at all), *stage-internal* (an extension threw), and *fatal* (a programming invariant
//! was violated). Cancellation is deliberately never a variant of [`PickError`] — it is
//! represented by [`Outcome::Cancelled`](crate::processor::Outcome), so a cancelled run can
//! never be mistaken for a failure by a `match`.

use std::fmt;

/// A stage of the pipeline, used to tag [`StageError`] and log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The [`CollectProcessor`](crate::processor::collect::CollectProcessor).
    Collect,
    /// The [`MatchProcessor`](crate::processor::match_proc::MatchProcessor).
    Match,
    /// The [`SortProcessor`](crate::processor::sort::SortProcessor).
    Sort,
    /// The [`RenderProcessor`](crate::processor::render::RenderProcessor).
    Render,
    /// The [`PreviewProcessor`](crate::processor::preview::PreviewProcessor).
    Preview,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Collect => "collect",
            Stage::Match => "match",
            Stage::Sort => "sort",
            Stage::Render => "render",
            Stage::Preview => "preview",
        })
    }
}

/// An error raised by an extension (`Source`, `Matcher`, `Sorter`, `Renderer`, or `Previewer`)
/// while a processor was driving it.
///
/// Per the error-handling design, stage-internal errors are logged and turned into a
/// `*-failed` event; the pipeline still advances using the last good data where possible (for
/// example a sort failure lets render run over the unsorted matched list).
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    /// Which stage raised the error.
    pub stage: Stage,
    /// The underlying error from the extension implementation.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl StageError {
    /// Wrap an extension error as having occurred in the given stage.
    pub fn new(stage: Stage, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            stage,
            source: Box::new(source),
        }
    }
}

/// Errors that are expected and user-fixable: the kind of thing that should be echoed to the
/// user rather than logged as a bug.
#[derive(Debug, thiserror::Error)]
pub enum ExpectedError {
    /// No picker is registered under the given name.
    #[error("unknown picker: {0}")]
    UnknownPicker(String),
    /// No action is registered under the given name.
    #[error("unknown action: {0}")]
    UnknownAction(String),
    /// A session lookup by name/number matched nothing.
    #[error("no matching session")]
    UnknownSession,
    /// An operation was attempted against a picker that has already been disposed.
    #[error("picker has already been disposed")]
    Disposed,
    /// A session name starting with `@` was used where a user-defined name is required.
    #[error("'{0}' is a reserved session name")]
    ReservedName(String),
}

/// The top-level error type for fallible engine operations.
///
/// Marked `#[non_exhaustive]` since the taxonomy may grow additional *fatal* variants as more
/// invariants are introduced.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PickError {
    /// An expected, user-fixable error.
    #[error(transparent)]
    Expected(#[from] ExpectedError),
    /// An extension threw while a processor was driving it.
    #[error(transparent)]
    Stage(#[from] StageError),
    /// An [`Action`](crate::ext::Action) threw while being invoked.
    #[error("action failed: {0}")]
    Action(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    /// A programming invariant was violated; the picker should abort rather than continue in an
    /// inconsistent state.
    #[error("internal invariant violated: {0}")]
    Fatal(String),
}
