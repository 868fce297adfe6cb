//! Versioned notebook document.
//!
//! `NotebookDocument` owns the cell sequence and a version counter. All
//! mutation goes through `apply_edits`, `update_cell_source`, `undo` and
//! `redo`; each observable call bumps the version by exactly one and fires
//! exactly one `ChangeEvent`.

use tracing::{debug, warn};

use crate::applier::EditBatchApplier;
use crate::cell::{Cell, CellData, CellHandle, HandleAllocator};
use crate::config::DocumentOptions;
use crate::edit::CellEdit;
use crate::error::{NotebookError, Result};
use crate::event::{ChangeEvent, ChangeOrigin, Emitter, RawChange, Subscription};
use crate::metadata::NotebookMetadata;
use crate::operation::{CellOperation, Direction};
use crate::selection::SelectionState;
use crate::undo::{EditStackElement, UndoManager};

/// Per-call options for `NotebookDocument::apply_edits`.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Push the batch onto the undo stack.
    pub record_undo: bool,
    /// Selection before the batch, restored on undo.
    pub before_selection: Option<SelectionState>,
    /// Label for the undo element.
    pub undo_label: Option<String>,
    /// When false, `apply_edits` reports success even if nothing changed.
    pub require_observable_change: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            record_undo: true,
            before_selection: None,
            undo_label: None,
            require_observable_change: true,
        }
    }
}

impl ApplyOptions {
    /// Options for edits that should not be undoable, such as execution output.
    pub fn without_undo() -> Self {
        Self {
            record_undo: false,
            ..Self::default()
        }
    }

    pub fn with_before_selection(mut self, selection: SelectionState) -> Self {
        self.before_selection = Some(selection);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.undo_label = Some(label.into());
        self
    }

    pub fn allow_unobservable(mut self) -> Self {
        self.require_observable_change = false;
        self
    }
}

/// A notebook: ordered cells, document metadata and a version counter.
#[derive(Debug)]
pub struct NotebookDocument {
    cells: Vec<Cell>,
    metadata: NotebookMetadata,
    version: u64,
    handles: HandleAllocator,
    undo_manager: UndoManager,
    on_did_change_content: Emitter<ChangeEvent>,
}

impl NotebookDocument {
    /// Create a document at version 0.
    pub fn new(cells: Vec<CellData>) -> Self {
        Self::with_options(cells, NotebookMetadata::default(), DocumentOptions::default())
    }

    pub fn with_options(cells: Vec<CellData>, metadata: NotebookMetadata, options: DocumentOptions) -> Self {
        let mut handles = HandleAllocator::default();
        let cells = cells.into_iter().map(|data| handles.adopt(data)).collect();
        Self {
            cells,
            metadata,
            version: 0,
            handles,
            undo_manager: UndoManager::new(options.max_undo_history),
            on_did_change_content: Emitter::new(),
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cell_by_handle(&self, handle: CellHandle) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.handle() == handle)
    }

    pub fn index_of(&self, handle: CellHandle) -> Option<usize> {
        self.cells.iter().position(|cell| cell.handle() == handle)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn metadata(&self) -> &NotebookMetadata {
        &self.metadata
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo_manager
    }

    /// Register a change listener.
    pub fn on_did_change_content(&self, listener: impl FnMut(&ChangeEvent) + 'static) -> Subscription {
        self.on_did_change_content.subscribe(listener)
    }

    /// Apply `edits` as one atomic batch.
    ///
    /// If any edit addresses an invalid position the batch is rejected and
    /// the document is untouched. Otherwise edits apply in order, the version
    /// is bumped once if anything changed, `compute_end_selection` is called
    /// once with the resulting cells, and one event is fired.
    ///
    /// Returns whether anything changed, or always `true` when
    /// `require_observable_change` is off.
    pub fn apply_edits<F>(&mut self, edits: Vec<CellEdit>, options: ApplyOptions, compute_end_selection: F) -> Result<bool>
    where
        F: FnOnce(&[Cell]) -> Option<SelectionState>,
    {
        let edit_count = edits.len();
        let operations = EditBatchApplier::new(&mut self.cells, &mut self.metadata, &mut self.handles)
            .apply(edits)
            .inspect_err(|e| warn!(version = self.version, "rejected edit batch: {}", e))?;

        if operations.is_empty() {
            debug!(edit_count, version = self.version, "edit batch had no observable effect");
            return Ok(!options.require_observable_change);
        }

        let end_selection = compute_end_selection(&self.cells);
        let raw_events = operations
            .iter()
            .map(|op| op.raw_change(Direction::Forward))
            .collect();

        if options.record_undo {
            self.undo_manager.record(EditStackElement::new(
                options.undo_label,
                operations,
                options.before_selection,
                end_selection.clone(),
            ));
        } else if operations.iter().any(CellOperation::is_structural) {
            // Recorded positions no longer line up with the sequence.
            self.undo_manager.clear();
        }

        self.commit(ChangeOrigin::Edit, raw_events, end_selection);
        debug!(edit_count, version = self.version, "applied edit batch");
        Ok(true)
    }

    /// Replace the source text of one cell.
    ///
    /// Returns `false` when the text is unchanged.
    pub fn update_cell_source(&mut self, handle: CellHandle, source: impl Into<String>) -> Result<bool> {
        let index = self.index_of(handle).ok_or(NotebookError::CellNotFound(handle))?;
        let source = source.into();
        let before = self.cells[index].source().to_string();
        if before == source {
            return Ok(false);
        }

        let operation = CellOperation::Content {
            index,
            handle,
            before,
            after: source,
        };
        operation.apply(&mut self.cells, &mut self.metadata, Direction::Forward);
        let raw_events = vec![operation.raw_change(Direction::Forward)];
        self.undo_manager
            .record(EditStackElement::new(None, vec![operation], None, None));

        self.commit(ChangeOrigin::Edit, raw_events, None);
        Ok(true)
    }

    /// Reverse the most recent undo element.
    ///
    /// Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(element) = self.undo_manager.pop_undo() else {
            return false;
        };

        let mut raw_events = Vec::with_capacity(element.operations.len());
        for operation in element.operations.iter().rev() {
            operation.apply(&mut self.cells, &mut self.metadata, Direction::Backward);
            raw_events.push(operation.raw_change(Direction::Backward));
        }

        let selection = element.before_selection.clone();
        debug!(label = %element.label, "undo");
        self.undo_manager.record_redo(element);
        self.commit(ChangeOrigin::Undo, raw_events, selection);
        true
    }

    /// Replay the most recently undone element.
    ///
    /// Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(element) = self.undo_manager.pop_redo() else {
            return false;
        };

        let mut raw_events = Vec::with_capacity(element.operations.len());
        for operation in &element.operations {
            operation.apply(&mut self.cells, &mut self.metadata, Direction::Forward);
            raw_events.push(operation.raw_change(Direction::Forward));
        }

        let selection = element.end_selection.clone();
        debug!(label = %element.label, "redo");
        self.undo_manager.record_replayed(element);
        self.commit(ChangeOrigin::Redo, raw_events, selection);
        true
    }

    /// Contents of every cell, without identities.
    pub fn to_cell_data(&self) -> Vec<CellData> {
        self.cells.iter().map(Cell::to_data).collect()
    }

    fn commit(&mut self, origin: ChangeOrigin, raw_events: Vec<RawChange>, end_selection: Option<SelectionState>) {
        self.version += 1;
        let event = ChangeEvent {
            version: self.version,
            origin,
            raw_events,
            end_selection,
        };
        self.on_did_change_content.fire(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CellOutput;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc(sources: &[&str]) -> NotebookDocument {
        NotebookDocument::new(sources.iter().map(|s| CellData::code(*s, "rust")).collect())
    }

    fn sources(doc: &NotebookDocument) -> Vec<&str> {
        doc.cells().iter().map(Cell::source).collect()
    }

    #[test]
    fn test_rejected_batch_leaves_document_untouched() {
        let mut doc = doc(&["a", "b"]);
        let result = doc.apply_edits(
            vec![CellEdit::delete(0, 1), CellEdit::outputs(2, Vec::new())],
            ApplyOptions::default(),
            |_| None,
        );

        assert!(matches!(result, Err(NotebookError::IndexOutOfRange { position: 1, .. })));
        assert_eq!(sources(&doc), ["a", "b"]);
        assert_eq!(doc.version(), 0);
        assert!(!doc.undo_manager().can_undo());
    }

    #[test]
    fn test_unobservable_batch_result() {
        let mut doc = doc(&["a"]);
        let clear = || vec![CellEdit::outputs(0, Vec::new())];

        assert!(!doc.apply_edits(clear(), ApplyOptions::default(), |_| None).unwrap());
        assert!(doc.apply_edits(clear(), ApplyOptions::default().allow_unobservable(), |_| None).unwrap());
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_end_selection_sees_post_edit_cells() {
        let mut doc = doc(&["a", "b"]);
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let _sub = doc.on_did_change_content(move |e| *sink.borrow_mut() = e.end_selection.clone());

        doc.apply_edits(
            vec![CellEdit::insert(2, vec![CellData::markup("c")])],
            ApplyOptions::default(),
            |cells| Some(SelectionState::focus(crate::CellRange::single(cells.len() - 1))),
        )
        .unwrap();

        assert_eq!(*seen.borrow(), Some(SelectionState::focus(crate::CellRange::single(2))));
    }

    #[test]
    fn test_undo_redo_whole_batch() {
        let mut doc = doc(&["a", "b", "c"]);
        doc.apply_edits(
            vec![
                CellEdit::delete(0, 1),
                CellEdit::insert(1, vec![CellData::markup("x")]),
                CellEdit::outputs(1, vec![CellOutput::text("o", "text/plain", "1")]),
            ],
            ApplyOptions::default(),
            |_| None,
        )
        .unwrap();
        assert_eq!(sources(&doc), ["x", "b", "c"]);
        let handle_x = doc.cell(0).unwrap().handle();

        assert!(doc.undo());
        assert_eq!(sources(&doc), ["a", "b", "c"]);
        assert!(doc.cells().iter().all(|c| c.outputs().is_empty()));
        assert_eq!(doc.version(), 2);

        assert!(doc.redo());
        assert_eq!(sources(&doc), ["x", "b", "c"]);
        assert_eq!(doc.cell(0).unwrap().handle(), handle_x);
        assert_eq!(doc.cell(1).unwrap().outputs().len(), 1);
        assert_eq!(doc.version(), 3);

        assert!(doc.undo());
        assert!(!doc.undo());
    }

    #[test]
    fn test_structural_edit_without_undo_clears_history() {
        let mut doc = doc(&["a", "b"]);
        doc.apply_edits(vec![CellEdit::delete(0, 1)], ApplyOptions::default(), |_| None)
            .unwrap();
        assert!(doc.undo_manager().can_undo());

        doc.apply_edits(
            vec![CellEdit::outputs(0, vec![CellOutput::text("o", "text/plain", "1")])],
            ApplyOptions::without_undo(),
            |_| None,
        )
        .unwrap();
        assert!(doc.undo_manager().can_undo());

        doc.apply_edits(
            vec![CellEdit::insert(0, vec![CellData::markup("m")])],
            ApplyOptions::without_undo(),
            |_| None,
        )
        .unwrap();
        assert!(!doc.undo_manager().can_undo());
    }

    #[test]
    fn test_update_cell_source() {
        let mut doc = doc(&["a"]);
        let handle = doc.cell(0).unwrap().handle();

        assert!(doc.update_cell_source(handle, "a2").unwrap());
        assert!(!doc.update_cell_source(handle, "a2").unwrap());
        assert_eq!(doc.version(), 1);

        assert!(matches!(
            doc.update_cell_source(CellHandle::new(99), "x"),
            Err(NotebookError::CellNotFound(_))
        ));

        assert!(doc.undo());
        assert_eq!(sources(&doc), ["a"]);
    }
}
