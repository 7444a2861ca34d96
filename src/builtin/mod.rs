//! # Toy reference extensions
//!
//! Concrete fuzzy-scoring matchers, file-walking sources, and terminal rendering are explicitly
//! out of scope for the core engine. This module provides small, non-production reference
//! implementations of every extension contract, used by the engine's own tests and by
//! [`crate`]-level demos; embedders are expected to supply their own.

mod matcher;
mod previewer;
mod renderer;
mod source;

pub use matcher::SubstringMatcher;
pub use previewer::PlainPreviewer;
pub use renderer::PlainRenderer;
pub use source::VecSource;
