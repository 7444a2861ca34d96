//! # Item-Belt
//!
//! A cyclic cursor over a non-empty ordered list of stage strategies (matchers, sorters,
//! renderers, previewers), with `current`, `index`, and set-to-`last` semantics.

/// An index argument accepted by absolute-set operations: either a concrete index or the `"$"`
/// sentinel meaning "last".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexArg {
    /// A concrete, possibly out-of-range, index.
    Absolute(usize),
    /// The `"$"` sentinel: the last valid index.
    Last,
}

/// A non-empty ordered list of strategies with a current index.
///
/// Clamping rules on `set_index`: values `>= count` (including the `"$"` sentinel) snap to
/// `count - 1`; there is no way to go below `0` since the argument type is unsigned.
pub struct ItemBelt<T> {
    strategies: Vec<T>,
    index: usize,
}

impl<T> ItemBelt<T> {
    /// Construct a belt from a non-empty vector of strategies, starting at index `0`.
    ///
    /// # Panics
    /// Panics if `strategies` is empty: a belt must always have a current strategy.
    pub fn new(strategies: Vec<T>) -> Self {
        assert!(
            !strategies.is_empty(),
            "ItemBelt requires at least one strategy"
        );
        Self {
            strategies,
            index: 0,
        }
    }

    /// Number of strategies on the belt.
    pub fn count(&self) -> usize {
        self.strategies.len()
    }

    /// The current index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The strategy at the current index.
    pub fn current(&self) -> &T {
        // SAFETY-equivalent invariant: `index` is always kept in `[0, strategies.len())` by
        // construction and by every mutator below.
        &self.strategies[self.index]
    }

    /// All strategies, in belt order.
    pub fn strategies(&self) -> &[T] {
        &self.strategies
    }

    /// Set the current index absolutely, clamping per the rules documented on [`ItemBelt`].
    ///
    /// Returns `true` if the resulting index differs from the previous one.
    pub fn set_index(&mut self, arg: IndexArg) -> bool {
        let target = match arg {
            IndexArg::Absolute(i) => i.min(self.count() - 1),
            IndexArg::Last => self.count() - 1,
        };
        let changed = target != self.index;
        self.index = target;
        changed
    }

    /// Move the current index by `amount`, optionally wrapping around at the ends instead of
    /// clamping.
    ///
    /// Returns `true` if the resulting index differs from the previous one.
    pub fn move_relative(&mut self, amount: i64, cycle: bool) -> bool {
        let count = self.count() as i64;
        let mut target = self.index as i64 + amount;
        if cycle {
            target = target.rem_euclid(count);
        } else {
            target = target.clamp(0, count - 1);
        }
        let changed = target as usize != self.index;
        self.index = target as usize;
        changed
    }
}
