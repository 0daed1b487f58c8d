//! Capacity-bounded list of the best combinations found so far.

/// One scored combination, stored as the index of the chosen value in each slot
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Entry {
    pub idxs: Vec<usize>,
    pub score: f64,
    pub error: f64,
}

/// A list of [`Entry`]s, sorted by ascending `error` and never longer than `capacity`.  Entries
/// with equal errors are kept in insertion order, so merging lists in enumeration order gives the
/// same result as inserting every entry into one list.
#[derive(Debug, Clone)]
pub(super) struct RankedList {
    entries: Vec<Entry>,
    capacity: usize,
}

impl RankedList {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Returns `true` if an entry with this `error` would be kept by [`RankedList::insert`].
    /// This lets callers avoid building entries which would be immediately thrown away.
    #[inline]
    pub fn would_accept(&self, error: f64) -> bool {
        match self.entries.last() {
            Some(worst) => !self.is_full() || error < worst.error,
            None => true,
        }
    }

    /// Insert `entry` directly after every entry with an error less than or equal to its own,
    /// evicting the worst entry if the list is over capacity.  Returns `true` if the entry was
    /// kept.
    pub fn insert(&mut self, entry: Entry) -> bool {
        if !self.would_accept(entry.error) {
            return false;
        }
        let idx = self.entries.partition_point(|e| e.error <= entry.error);
        self.entries.insert(idx, entry);
        if self.entries.len() > self.capacity {
            self.entries.pop();
        }
        true
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}
