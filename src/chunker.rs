//! # Chunker
//!
//! A bounded batch accumulator used by the collect and match processors to flush work in groups
//! rather than one item at a time.

/// Accumulates items into batches of at most `chunk_size`.
pub struct Chunker<T> {
    chunk_size: usize,
    batch: Vec<T>,
}

impl<T> Chunker<T> {
    /// Construct a chunker that flushes every `chunk_size` items.
    ///
    /// # Panics
    /// Panics if `chunk_size` is `0`.
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        Self {
            chunk_size,
            batch: Vec::with_capacity(chunk_size),
        }
    }

    /// Append an item to the current batch. Returns `true` iff the batch just reached
    /// `chunk_size`, signalling the caller should [`consume`](Chunker::consume) it.
    pub fn put(&mut self, item: T) -> bool {
        self.batch.push(item);
        self.batch.len() >= self.chunk_size
    }

    /// Take the current batch, resetting the internal accumulator to empty.
    pub fn consume(&mut self) -> Vec<T> {
        std::mem::take(&mut self.batch)
    }

    /// Current number of items accumulated since the last [`consume`](Chunker::consume).
    pub fn count(&self) -> usize {
        self.batch.len()
    }

    /// Whether there is anything to flush.
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_reports_threshold_reached() {
        let mut chunker = Chunker::new(2);
        assert!(!chunker.put(1));
        assert!(chunker.put(2));
        assert_eq!(chunker.consume(), vec![1, 2]);
        assert!(chunker.is_empty());
    }

    #[test]
    fn consume_resets_count() {
        let mut chunker = Chunker::new(3);
        chunker.put("a");
        chunker.put("b");
        assert_eq!(chunker.count(), 2);
        let batch = chunker.consume();
        assert_eq!(batch, vec!["a", "b"]);
        assert_eq!(chunker.count(), 0);
    }

    #[test]
    #[should_panic(expected = "chunk_size must be positive")]
    fn zero_chunk_size_panics() {
        let _: Chunker<()> = Chunker::new(0);
    }
}
