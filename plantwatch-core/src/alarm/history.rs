//! Fixed-capacity alarm history ring

use heapless::Vec;

use super::types::AlarmHistoryEntry;

/// Ring of the last `N` alarm actions
///
/// Once full, each push overwrites the oldest entry and advances the cursor.
/// Reads always come back oldest first.
#[derive(Debug, Clone)]
pub struct AlarmHistory<const N: usize> {
    entries: Vec<AlarmHistoryEntry, N>,
    /// Slot the next push overwrites once the ring is full
    cursor: usize,
}

impl<const N: usize> Default for AlarmHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AlarmHistory<N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
        }
    }

    /// Append an entry; never fails
    pub fn push(&mut self, entry: AlarmHistoryEntry) {
        if N == 0 {
            return;
        }
        if self.entries.push(entry).is_err() {
            self.entries[self.cursor] = entry;
            self.cursor = (self.cursor + 1) % N;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Entries oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &AlarmHistoryEntry> {
        let (newer, older) = self.entries.split_at(self.cursor);
        older.iter().chain(newer.iter())
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&AlarmHistoryEntry> {
        if self.is_full() && self.cursor > 0 {
            self.entries.get(self.cursor - 1)
        } else {
            self.entries.last()
        }
    }

    /// Chronological copy of the ring
    pub fn snapshot(&self) -> Vec<AlarmHistoryEntry, N> {
        self.iter().copied().collect()
    }
}
