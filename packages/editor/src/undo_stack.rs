//! # Undo/Redo History
//!
//! Bounded history of full document snapshots.
//!
//! ## Design
//!
//! - Entry 0 is the document as loaded ([`reset`](HistoryStack::reset))
//! - Each undoable mutation pushes a deep copy of the slide sequence as it
//!   stands *after* the mutation
//! - The cursor points at the entry matching the live document
//! - Undo moves the cursor back and hands out a copy of that entry
//! - Redo moves the cursor forward
//! - A push discards every entry after the cursor (new action invalidates
//!   the redo future)
//! - Past `capacity`, the oldest entry is evicted and the cursor shifts
//!   with it
//!
//! Entries are copied on the way in and on the way out, so the live
//! document never shares state with a past snapshot.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = HistoryStack::new();
//! history.reset(doc.slides());
//! history.push(doc.slides(), "Edit title");
//! history.push(doc.slides(), "Add slide");
//!
//! if let Some(slides) = history.undo() {
//!     doc.replace_slides(slides);
//! }
//! ```

use crate::slide::Slide;
use std::collections::VecDeque;

/// Default number of retained snapshots
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One retained snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// The slide sequence at this point
    pub slides: Vec<Slide>,

    /// Optional description of the action that produced it
    pub description: Option<String>,
}

/// Bounded undo/redo stack over document snapshots
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<HistoryEntry>,

    /// Index of the entry matching the live document
    index: usize,

    /// Maximum number of retained entries (at least 1)
    capacity: usize,
}

impl HistoryStack {
    /// Create a history with the default capacity (50)
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a history with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a snapshot of `slides`
    pub fn push(&mut self, slides: &[Slide], description: impl Into<String>) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }

        self.entries.push_back(HistoryEntry {
            slides: slides.to_vec(),
            description: Some(description.into()),
        });

        // Trim if exceeded capacity
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        self.index = self.entries.len() - 1;
    }

    /// Step back; returns the snapshot the document should adopt
    pub fn undo(&mut self) -> Option<Vec<Slide>> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].slides.clone())
    }

    /// Step forward; returns the snapshot the document should adopt
    pub fn redo(&mut self) -> Option<Vec<Slide>> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].slides.clone())
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.index + 1 < self.entries.len()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position, `None` while the history is empty
    pub fn cursor(&self) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.index)
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the entry under the cursor
    pub fn current(&self) -> Option<HistoryEntry> {
        self.entries.get(self.index).cloned()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
    }

    /// Drop everything and start over from `slides`
    pub fn reset(&mut self, slides: &[Slide]) {
        self.clear();
        self.entries.push_back(HistoryEntry {
            slides: slides.to_vec(),
            description: None,
        });
    }

    /// Description of the action `undo` would revert
    pub fn undo_description(&self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.entries[self.index].description.as_deref()
    }

    /// Description of the action `redo` would reapply
    pub fn redo_description(&self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.entries[self.index + 1].description.as_deref()
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidedeck_common::SlideId;

    fn titled(title: &str) -> Vec<Slide> {
        let mut slide = Slide::new(SlideId::new("s1"), 1);
        slide.title = title.to_string();
        vec![slide]
    }

    #[test]
    fn test_history_creation() {
        let history = HistoryStack::new();
        assert_eq!(history.len(), 0);
        assert_eq!(history.cursor(), None);
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_undo_redo() {
        let mut history = HistoryStack::new();
        history.push(&titled("v0"), "Edit title");
        history.push(&titled("v1"), "Edit title");
        history.push(&titled("v2"), "Edit title");
        assert_eq!(history.cursor(), Some(2));

        assert_eq!(history.undo().unwrap()[0].title, "v1");
        assert_eq!(history.undo().unwrap()[0].title, "v0");
        assert!(history.undo().is_none());
        assert_eq!(history.cursor(), Some(0));

        assert_eq!(history.redo().unwrap()[0].title, "v1");
        assert_eq!(history.redo().unwrap()[0].title, "v2");
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), Some(2));
    }

    #[test]
    fn test_push_truncates_redo_future() {
        let mut history = HistoryStack::new();
        history.push(&titled("v0"), "a");
        history.push(&titled("v1"), "b");
        history.push(&titled("v2"), "c");
        history.undo();
        history.undo();

        history.push(&titled("branch"), "d");
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), Some(1));
        assert!(!history.can_redo());
        assert_eq!(history.undo().unwrap()[0].title, "v0");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = HistoryStack::new();
        for i in 0..60 {
            history.push(&titled(&format!("v{}", i)), "edit");
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.cursor(), Some(49));

        let mut last = None;
        for _ in 0..50 {
            if let Some(slides) = history.undo() {
                last = Some(slides);
            }
        }
        // Oldest retained state, not the true initial one
        assert_eq!(last.unwrap()[0].title, "v10");
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn test_entries_do_not_alias_callers() {
        let mut history = HistoryStack::new();
        let mut live = titled("v0");
        history.push(&live, "a");
        history.push(&titled("v1"), "b");

        live[0].title = "mutated in place".to_string();

        let mut restored = history.undo().unwrap();
        assert_eq!(restored[0].title, "v0");

        restored[0].title = "mutated again".to_string();
        assert_eq!(history.current().unwrap().slides[0].title, "v0");
    }

    #[test]
    fn test_descriptions() {
        let mut history = HistoryStack::new();
        history.push(&titled("v0"), "Edit title");
        history.push(&titled("v1"), "Add slide");
        assert_eq!(history.undo_description(), Some("Add slide"));
        assert_eq!(history.redo_description(), None);

        history.undo();
        assert_eq!(history.undo_description(), None);
        assert_eq!(history.redo_description(), Some("Add slide"));
    }

    #[test]
    fn test_reset_makes_initial_state_reachable() {
        let mut history = HistoryStack::new();
        history.push(&titled("stale"), "old session");

        history.reset(&titled("loaded"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), Some(0));
        assert!(!history.can_undo());

        history.push(&titled("edited"), "Edit title");
        assert_eq!(history.undo_description(), Some("Edit title"));
        assert_eq!(history.undo().unwrap()[0].title, "loaded");
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = HistoryStack::with_capacity(0);
        history.push(&titled("a"), "x");
        history.push(&titled("b"), "y");
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), Some(0));
    }
}
