//! # Session Store
//!
//! An in-memory, fixed-capacity ring of saved picker sessions enabling resume by name and/or
//! ordinal position.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::{
    error::ExpectedError,
    item::PickerContext,
};

/// Maximum number of sessions retained; the oldest is evicted once this is exceeded.
pub const CAPACITY: usize = 100;

/// A saved picker invocation, enabling resume.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Session<D> {
    /// The picker name this session resumes, or a reserved (`@`-prefixed) name for internal use.
    pub name: String,
    /// Extra invocation arguments, as originally passed when the picker was opened.
    pub args: Vec<String>,
    /// The resumable state.
    pub context: PickerContext<D>,
}

/// Whether `name` is reserved (`@`-prefixed) and therefore may not be saved.
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with('@')
}

/// A filter for [`SessionStore::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadQuery {
    /// Restrict to sessions with this exact name.
    pub name: Option<String>,
    /// 1-based ordinal counting back from the most recent matching session. Defaults to `1` (the
    /// most recent match).
    pub number: Option<usize>,
}

/// A capacity-bounded, insertion-ordered ring of saved sessions.
pub struct SessionStore<D> {
    sessions: Mutex<VecDeque<Session<D>>>,
}

impl<D> Default for SessionStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> SessionStore<D> {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(VecDeque::with_capacity(CAPACITY)),
        }
    }

    /// Append `session`, evicting the oldest entry if this would exceed [`CAPACITY`].
    ///
    /// Rejects sessions whose `name` is [reserved](is_reserved_name).
    pub fn save(&self, session: Session<D>) -> Result<(), ExpectedError> {
        if is_reserved_name(&session.name) {
            return Err(ExpectedError::ReservedName(session.name));
        }
        let mut sessions = self.sessions.lock();
        if sessions.len() >= CAPACITY {
            sessions.pop_front();
        }
        sessions.push_back(session);
        Ok(())
    }

    /// Most-recent-first view of every saved session.
    pub fn list(&self) -> Vec<Session<D>>
    where
        D: Clone,
    {
        self.sessions.lock().iter().rev().cloned().collect()
    }

    /// Number of saved sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no sessions are saved.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Resolve `query` against the saved sessions: filter by `name` when given, then return the
    /// entry `number` back (1-based, most recent first). Returns `None` out-of-range or empty.
    pub fn load(&self, query: LoadQuery) -> Option<Session<D>>
    where
        D: Clone,
    {
        let filtered: Vec<Session<D>> = {
            let sessions = self.sessions.lock();
            sessions
                .iter()
                .filter(|s| query.name.as_deref().is_none_or(|name| s.name == name))
                .cloned()
                .collect()
        };
        let number = query.number.unwrap_or(1);
        let len = filtered.len();
        if number == 0 || number > len {
            return None;
        }
        filtered.into_iter().nth(len - number)
    }
}
