//! Content-exact undo history

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::change_set::FileChange;
use crate::constants::limits::MAX_UNDO_BATCHES;

/// One applied batch, recorded with full before/after content
#[derive(Debug, Clone)]
pub struct AppliedChangeBatch {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub files: Vec<FileChange>,
}

impl AppliedChangeBatch {
    pub fn new(title: impl Into<String>, files: Vec<FileChange>) -> Self {
        Self {
            title: title.into(),
            created_at: Utc::now(),
            files,
        }
    }
}

/// Bounded LIFO of applied batches; the oldest entry is evicted first
#[derive(Debug)]
pub struct UndoStack {
    batches: VecDeque<AppliedChangeBatch>,
    capacity: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::with_capacity(MAX_UNDO_BATCHES)
    }
}

impl UndoStack {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            batches: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, batch: AppliedChangeBatch) {
        if self.batches.len() == self.capacity {
            if let Some(evicted) = self.batches.pop_front() {
                tracing::debug!(title = %evicted.title, "Evicted oldest undo batch");
            }
        }
        self.batches.push_back(batch);
    }

    pub fn peek(&self) -> Option<&AppliedChangeBatch> {
        self.batches.back()
    }

    pub fn pop(&mut self) -> Option<AppliedChangeBatch> {
        self.batches.pop_back()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_stack_evicts_oldest() {
        let mut stack = UndoStack::default();
        for i in 0..25 {
            stack.push(AppliedChangeBatch::new(format!("batch {i}"), Vec::new()));
        }
        assert_eq!(stack.len(), MAX_UNDO_BATCHES);
        assert_eq!(stack.peek().unwrap().title, "batch 24");

        let mut oldest = None;
        while let Some(batch) = stack.pop() {
            oldest = Some(batch.title);
        }
        assert_eq!(oldest.as_deref(), Some("batch 5"));
    }

    #[test]
    fn test_undo_stack_is_lifo() {
        let mut stack = UndoStack::with_capacity(3);
        stack.push(AppliedChangeBatch::new("first", Vec::new()));
        stack.push(AppliedChangeBatch::new("second", Vec::new()));
        assert_eq!(stack.pop().unwrap().title, "second");
        assert_eq!(stack.pop().unwrap().title, "first");
        assert!(stack.is_empty());
    }
}
