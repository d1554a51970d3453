use log::debug;
use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Immutable snapshot of the recorded part of the document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    pub elements: Vec<Element>,
    pub current_page: u32,
}

/// Where a wholesale state change comes from. History restores are never recorded
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    User,
    History,
}

/// Bounded undo/redo stack of snapshots with a cursor.
///
/// The cursor always points at a valid snapshot: the stack starts with the initial
/// state and is never empty. Recording after an undo drops everything past the
/// cursor; overflowing the capacity evicts the oldest snapshot.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    states: Vec<HistoryState>,
    cursor: usize,
    capacity: usize,
}

impl HistoryManager {
    pub fn new(initial: HistoryState, capacity: usize) -> Self {
        Self {
            states: vec![initial],
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Forget everything and start over from `initial`.
    pub fn reset(&mut self, initial: HistoryState) {
        self.states.clear();
        self.states.push(initial);
        self.cursor = 0;
    }

    pub fn snapshot(&mut self, state: HistoryState) {
        self.states.truncate(self.cursor + 1);
        self.states.push(state);
        self.cursor += 1;

        if self.states.len() > self.capacity {
            let overflow = self.states.len() - self.capacity;
            self.states.drain(..overflow);
            self.cursor -= overflow;
            debug!("history: evicted {overflow} oldest snapshot(s)");
        }
    }

    pub fn undo(&mut self) -> Option<&HistoryState> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.states[self.cursor])
    }

    pub fn redo(&mut self) -> Option<&HistoryState> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(&self.states[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.states.len()
    }

    pub fn current(&self) -> &HistoryState {
        &self.states[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shrinking the capacity evicts the oldest snapshots right away.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        if self.states.len() > self.capacity {
            let overflow = self.states.len() - self.capacity;
            let drop = overflow.min(self.cursor);
            self.states.drain(..drop);
            self.cursor -= drop;
            self.states.truncate(self.capacity.max(self.cursor + 1));
        }
    }
}
