//! Shared document handle with a reentrancy guard.
//!
//! Listeners that need to reach back into the document hold a
//! `SharedDocument`. While the document is applying a batch or notifying
//! listeners it is mutably borrowed, so any call made from a listener fails
//! with `NotebookError::ReentrantEdit` instead of observing a half-finished
//! notification.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cell::{Cell, CellHandle};
use crate::document::{ApplyOptions, NotebookDocument};
use crate::edit::CellEdit;
use crate::error::{NotebookError, Result};
use crate::event::{ChangeEvent, Subscription};
use crate::selection::SelectionState;

/// Reference-counted, single-threaded handle to a `NotebookDocument`.
#[derive(Debug, Clone)]
pub struct SharedDocument {
    inner: Rc<RefCell<NotebookDocument>>,
}

impl SharedDocument {
    pub fn new(document: NotebookDocument) -> Self {
        Self {
            inner: Rc::new(RefCell::new(document)),
        }
    }

    /// Run `f` with read access.
    pub fn read<R>(&self, f: impl FnOnce(&NotebookDocument) -> R) -> Result<R> {
        let document = self.inner.try_borrow().map_err(|_| NotebookError::ReentrantEdit)?;
        Ok(f(&document))
    }

    pub fn apply_edits<F>(&self, edits: Vec<CellEdit>, options: ApplyOptions, compute_end_selection: F) -> Result<bool>
    where
        F: FnOnce(&[Cell]) -> Option<SelectionState>,
    {
        self.write()?.apply_edits(edits, options, compute_end_selection)
    }

    pub fn update_cell_source(&self, handle: CellHandle, source: impl Into<String>) -> Result<bool> {
        self.write()?.update_cell_source(handle, source)
    }

    pub fn undo(&self) -> Result<bool> {
        Ok(self.write()?.undo())
    }

    pub fn redo(&self) -> Result<bool> {
        Ok(self.write()?.redo())
    }

    pub fn on_did_change_content(&self, listener: impl FnMut(&ChangeEvent) + 'static) -> Result<Subscription> {
        self.read(|document| document.on_did_change_content(listener))
    }

    pub fn version(&self) -> Result<u64> {
        self.read(NotebookDocument::version)
    }

    fn write(&self) -> Result<std::cell::RefMut<'_, NotebookDocument>> {
        self.inner.try_borrow_mut().map_err(|_| NotebookError::ReentrantEdit)
    }
}
