//! Undo/redo manager for edit batches.
//!
//! Each undo-eligible batch is stored as one `EditStackElement`, so undo and
//! redo always move whole batches.

use crate::operation::CellOperation;
use crate::selection::SelectionState;

/// Default number of undo elements to keep.
pub const DEFAULT_MAX_UNDO_HISTORY: usize = 50;

/// One reversible batch.
#[derive(Debug, Clone, PartialEq)]
pub struct EditStackElement {
    /// Label shown for the batch.
    pub label: String,
    /// Applied operations, in application order.
    pub operations: Vec<CellOperation>,
    /// Selection to restore on undo.
    pub before_selection: Option<SelectionState>,
    /// Selection to restore on redo.
    pub end_selection: Option<SelectionState>,
}

impl EditStackElement {
    pub fn new(
        label: Option<String>,
        operations: Vec<CellOperation>,
        before_selection: Option<SelectionState>,
        end_selection: Option<SelectionState>,
    ) -> Self {
        let label = label.unwrap_or_else(|| match operations.as_slice() {
            [single] => single.describe(),
            many => format!("{} cell edits", many.len()),
        });
        Self {
            label,
            operations,
            before_selection,
            end_selection,
        }
    }

    /// Get a human-readable description of this batch.
    pub fn description(&self) -> String {
        self.label.clone()
    }

    /// Get the description of reversing this batch.
    pub fn undo_description(&self) -> String {
        format!("Undo {}", self.label)
    }

    /// Whether the batch moved or inserted/removed cells.
    pub fn is_structural(&self) -> bool {
        self.operations.iter().any(CellOperation::is_structural)
    }
}

/// Manages undo/redo stacks for edit batches.
#[derive(Debug)]
pub struct UndoManager {
    /// Stack of batches that can be undone.
    undo_stack: Vec<EditStackElement>,
    /// Stack of batches that can be redone.
    redo_stack: Vec<EditStackElement>,
    max_history: usize,
}

impl UndoManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
        }
    }

    /// Record a batch that was just applied.
    ///
    /// This clears the redo stack (can't redo after a new batch).
    pub fn record(&mut self, element: EditStackElement) {
        self.redo_stack.clear();
        self.undo_stack.push(element);

        if self.undo_stack.len() > self.max_history {
            let excess = self.undo_stack.len() - self.max_history;
            self.undo_stack.drain(..excess);
        }
    }

    /// Pop the last batch from the undo stack.
    ///
    /// The caller reverses it, then calls `record_redo`.
    pub fn pop_undo(&mut self) -> Option<EditStackElement> {
        self.undo_stack.pop()
    }

    /// Record a batch that was just undone.
    pub fn record_redo(&mut self, element: EditStackElement) {
        self.redo_stack.push(element);
    }

    /// Pop the last batch from the redo stack.
    ///
    /// The caller replays it, then calls `record_replayed`.
    pub fn pop_redo(&mut self) -> Option<EditStackElement> {
        self.redo_stack.pop()
    }

    /// Put a redone batch back on the undo stack without touching redo.
    pub fn record_replayed(&mut self, element: EditStackElement) {
        self.undo_stack.push(element);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get description of what will be undone (for UI).
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(EditStackElement::undo_description)
    }

    /// Get description of what will be redone (for UI).
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(EditStackElement::description)
    }

    /// Clear all undo/redo history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(label: &str) -> EditStackElement {
        EditStackElement::new(Some(label.to_string()), Vec::new(), None, None)
    }

    #[test]
    fn test_record_and_undo() {
        let mut manager = UndoManager::default();
        manager.record(element("insert"));

        assert!(manager.can_undo());
        assert!(!manager.can_redo());

        let op = manager.pop_undo().unwrap();
        manager.record_redo(op);

        assert!(!manager.can_undo());
        assert!(manager.can_redo());
    }

    #[test]
    fn test_new_batch_clears_redo() {
        let mut manager = UndoManager::default();
        manager.record(element("first"));
        let op = manager.pop_undo().unwrap();
        manager.record_redo(op);

        assert!(manager.can_redo());
        manager.record(element("second"));
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut manager = UndoManager::new(3);
        for i in 0..5 {
            manager.record(element(&format!("edit {}", i)));
        }

        assert_eq!(manager.undo_depth(), 3);
        assert_eq!(manager.undo_description().as_deref(), Some("Undo edit 4"));
    }

    #[test]
    fn test_default_label() {
        let op = CellOperation::DocumentMetadata {
            before: Default::default(),
            after: Default::default(),
        };
        let single = EditStackElement::new(None, vec![op.clone()], None, None);
        assert_eq!(single.description(), "Change notebook metadata");
        assert!(!single.is_structural());

        let many = EditStackElement::new(None, vec![op.clone(), op], None, None);
        assert_eq!(many.description(), "2 cell edits");
    }
}
