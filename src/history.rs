//! Fixed-capacity command history.

use std::num::NonZeroUsize;

/// A single recorded command line together with its unique id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    id: u64,
    command: String,
}

impl HistoryEntry {
    /// Id assigned when the line was recorded. Ids are never reused.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The raw line exactly as it was recorded.
    pub fn command(&self) -> &str {
        &self.command
    }
}

/// A circular buffer holding the most recent command lines.
///
/// Once `capacity` lines have been recorded, each new line overwrites the oldest one.
/// Ids keep increasing across evictions, so an id identifies at most one line
/// for the whole session.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    slots: Vec<HistoryEntry>,
    capacity: NonZeroUsize,
    next: usize,
    next_id: u64,
}

impl HistoryRing {
    /// Create an empty ring with room for `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity.get()),
            capacity,
            next: 0,
            next_id: 0,
        }
    }

    /// Append `line` to the history, evicting the oldest entry when full.
    pub fn record(&mut self, line: &str) {
        let entry = HistoryEntry {
            id: self.next_id,
            command: line.to_owned(),
        };
        if self.slots.len() < self.capacity.get() {
            self.slots.push(entry);
        } else {
            self.slots[self.next] = entry;
        }
        self.next = (self.next + 1) % self.capacity.get();
        self.next_id += 1;
    }

    /// Look up a line by id. Returns `None` for ids never assigned or already evicted.
    pub fn find_by_id(&self, id: u64) -> Option<&str> {
        self.slots
            .iter()
            .find(|entry| entry.id == id)
            .map(HistoryEntry::command)
    }

    /// Iterate over the stored entries, oldest first.
    pub fn iter(&self) -> Iter<'_> {
        let start = if self.slots.len() < self.capacity.get() {
            0
        } else {
            self.next
        };
        Iter {
            ring: self,
            start,
            pos: 0,
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Id that the next recorded line will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

impl<'a> IntoIterator for &'a HistoryRing {
    type Item = &'a HistoryEntry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Oldest-first iterator over a [`HistoryRing`].
pub struct Iter<'a> {
    ring: &'a HistoryRing,
    start: usize,
    pos: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a HistoryEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.ring.slots.len();
        if self.pos == len {
            return None;
        }
        let entry = &self.ring.slots[(self.start + self.pos) % len];
        self.pos += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ring.slots.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize) -> HistoryRing {
        HistoryRing::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn listing(ring: &HistoryRing) -> Vec<(u64, &str)> {
        ring.iter().map(|e| (e.id(), e.command())).collect()
    }

    #[test]
    fn test_empty_ring() {
        let r = ring(3);
        assert!(r.is_empty());
        assert_eq!(r.iter().count(), 0);
        assert_eq!(r.find_by_id(0), None);
    }

    #[test]
    fn test_partial_fill_lists_in_order() {
        let mut r = ring(10);
        r.record("echo hi\n");
        r.record("ls -l\n");
        r.record("history\n");

        assert_eq!(
            listing(&r),
            vec![
                (0, "echo hi\n"),
                (1, "ls -l\n"),
                (2, "history\n"),
            ]
        );
        assert_eq!(r.len(), 3);
        assert_eq!(r.next_id(), 3);
    }

    #[test]
    fn test_wraps_and_keeps_most_recent() {
        let mut r = ring(10);
        for i in 0..25 {
            r.record(&format!("cmd {}", i));
        }

        let entries = listing(&r);
        assert_eq!(entries.len(), 10);
        let ids: Vec<u64> = entries.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, (15..25).collect::<Vec<u64>>());
        for (id, cmd) in entries {
            assert_eq!(cmd, format!("cmd {}", id));
        }
    }

    #[test]
    fn test_exactly_full_starts_at_oldest() {
        let mut r = ring(3);
        for cmd in ["a", "b", "c"] {
            r.record(cmd);
        }
        assert_eq!(
            listing(&r),
            vec![(0, "a"), (1, "b"), (2, "c")]
        );

        r.record("d");
        assert_eq!(
            listing(&r),
            vec![(1, "b"), (2, "c"), (3, "d")]
        );
    }

    #[test]
    fn test_find_by_id_hits_and_misses() {
        let mut r = ring(2);
        r.record("first");
        r.record("second");
        r.record("third");

        assert_eq!(r.find_by_id(0), None, "evicted id must not be found");
        assert_eq!(r.find_by_id(1), Some("second"));
        assert_eq!(r.find_by_id(2), Some("third"));
        assert_eq!(r.find_by_id(3), None, "unassigned id must not be found");
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut r = ring(4);
        r.record("x");
        r.record("y");

        let first = listing(&r);
        let second = listing(&r);
        assert_eq!(first, second);
        assert_eq!(r.iter().len(), 2);
    }

    #[test]
    fn test_capacity_one() {
        let mut r = ring(1);
        r.record("a");
        r.record("b");
        assert_eq!(listing(&r), vec![(1, "b")]);
        assert_eq!(r.capacity(), 1);
    }
}
