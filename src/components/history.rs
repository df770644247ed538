use std::collections::VecDeque;

use crate::canvas::Snapshot;
use crate::error::{EngineError, EngineResult};

// ============================================================================
// HISTORY STACK - linear undo/redo over full-surface snapshots
// ============================================================================

/// Ordered snapshots plus the index of the one currently displayed.
///
/// Committing after an undo discards every entry past the current position
/// before appending.  Once the cap is exceeded the oldest entries are
/// evicted and the position shifts down with them.
pub struct HistoryStack {
    entries: VecDeque<Snapshot>,
    /// `None` only before the first commit.
    position: Option<usize>,
    max_history_size: usize,
    /// Running byte total across all entries.
    total_memory: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(20)
    }
}

impl HistoryStack {
    /// `max_history_size` is raised to 1 if zero.
    pub fn new(max_history_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            position: None,
            max_history_size: max_history_size.max(1),
            total_memory: 0,
        }
    }

    pub fn commit(&mut self, snapshot: Snapshot) {
        if let Some(pos) = self.position {
            for dropped in self.entries.drain(pos + 1..) {
                self.total_memory = self.total_memory.saturating_sub(dropped.memory_size());
            }
        }

        self.total_memory += snapshot.memory_size();
        self.entries.push_back(snapshot);
        self.position = Some(self.entries.len() - 1);

        self.prune();
    }

    /// Step back one entry and return it for the caller to restore.
    pub fn undo(&mut self) -> EngineResult<&Snapshot> {
        match self.position {
            Some(pos) if pos > 0 => {
                self.position = Some(pos - 1);
                Ok(&self.entries[pos - 1])
            }
            _ => Err(EngineError::NothingToUndo),
        }
    }

    /// Step forward one entry and return it for the caller to restore.
    pub fn redo(&mut self) -> EngineResult<&Snapshot> {
        match self.position {
            Some(pos) if pos + 1 < self.entries.len() => {
                self.position = Some(pos + 1);
                Ok(&self.entries[pos + 1])
            }
            _ => Err(EngineError::NothingToRedo),
        }
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.position, Some(pos) if pos > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.position, Some(pos) if pos + 1 < self.entries.len())
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// The snapshot the surface should currently be showing.
    pub fn current(&self) -> Option<&Snapshot> {
        self.position.map(|pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn capacity(&self) -> usize {
        self.max_history_size
    }

    /// Get the current memory usage of the history (O(1) via cached total)
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = None;
        self.total_memory = 0;
    }

    fn prune(&mut self) {
        while self.entries.len() > self.max_history_size {
            if let Some(removed) = self.entries.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
            self.position = self.position.map(|pos| pos.saturating_sub(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(tag: u8) -> Snapshot {
        Snapshot::from_raw(1, 1, vec![tag, tag, tag, 255]).unwrap()
    }

    fn tag(s: &Snapshot) -> u8 {
        s.as_raw()[0]
    }

    #[test]
    fn empty_history_has_nothing_to_step_to() {
        let mut h = HistoryStack::new(20);
        assert_eq!(h.position(), None);
        assert!(matches!(h.undo(), Err(EngineError::NothingToUndo)));
        assert!(matches!(h.redo(), Err(EngineError::NothingToRedo)));
    }

    #[test]
    fn single_initial_entry_cannot_be_undone() {
        let mut h = HistoryStack::new(20);
        h.commit(snap(0));
        assert_eq!(h.position(), Some(0));
        assert!(!h.can_undo());
        assert!(matches!(h.undo(), Err(EngineError::NothingToUndo)));
        assert_eq!(h.position(), Some(0));
    }

    #[test]
    fn undo_then_redo_returns_the_same_snapshot() {
        let mut h = HistoryStack::new(20);
        for t in 0..3 {
            h.commit(snap(t));
        }
        let before = h.current().cloned().unwrap();
        h.undo().unwrap();
        let again = h.redo().unwrap().clone();
        assert_eq!(again, before);
        assert_eq!(h.position(), Some(2));
    }

    #[test]
    fn commit_after_undo_discards_the_redo_branch() {
        let mut h = HistoryStack::new(20);
        h.commit(snap(b'A'));
        h.commit(snap(b'B'));
        h.commit(snap(b'C'));
        assert_eq!(tag(h.undo().unwrap()), b'B');
        assert_eq!(h.position(), Some(1));
        h.commit(snap(b'D'));
        let tags: Vec<u8> = h.entries().map(tag).collect();
        assert_eq!(tags, b"ABD");
        assert_eq!(h.position(), Some(2));
        assert!(matches!(h.redo(), Err(EngineError::NothingToRedo)));
    }

    #[test]
    fn cap_evicts_oldest_and_keeps_position_valid() {
        let mut h = HistoryStack::new(3);
        for t in 0..10 {
            h.commit(snap(t));
            let pos = h.position().unwrap();
            assert!(pos < h.len());
        }
        assert_eq!(h.len(), 3);
        let tags: Vec<u8> = h.entries().map(tag).collect();
        assert_eq!(tags, vec![7, 8, 9]);
        assert_eq!(h.position(), Some(2));
        h.undo().unwrap();
        h.undo().unwrap();
        assert!(matches!(h.undo(), Err(EngineError::NothingToUndo)));
    }

    #[test]
    fn memory_tracks_drops_and_evictions() {
        let mut h = HistoryStack::new(2);
        h.commit(snap(1));
        h.commit(snap(2));
        h.commit(snap(3));
        assert_eq!(h.memory_usage(), 8);
        h.undo().unwrap();
        h.commit(snap(4));
        assert_eq!(h.len(), 2);
        assert_eq!(h.memory_usage(), 8);
        h.clear();
        assert_eq!(h.memory_usage(), 0);
        assert_eq!(h.position(), None);
    }

    #[test]
    fn position_stays_in_range_for_mixed_sequences() {
        let mut h = HistoryStack::new(4);
        let script = b"cccuucrcuuuurrrrccccccuc";
        for (i, op) in script.iter().enumerate() {
            match op {
                b'c' => h.commit(snap(i as u8)),
                b'u' => {
                    let _ = h.undo();
                }
                _ => {
                    let _ = h.redo();
                }
            }
            let pos = h.position().unwrap();
            assert!(pos < h.len(), "step {}: {} >= {}", i, pos, h.len());
        }
    }

    #[test]
    fn zero_cap_still_keeps_current_entry() {
        let mut h = HistoryStack::new(0);
        h.commit(snap(1));
        h.commit(snap(2));
        assert_eq!(h.len(), 1);
        assert_eq!(tag(h.current().unwrap()), 2);
    }
}
