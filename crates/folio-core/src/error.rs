//! Error types for folio-core.

use thiserror::Error;

use crate::cell::CellHandle;

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, NotebookError>;

/// Errors that can occur while editing a notebook document.
#[derive(Debug, Error)]
pub enum NotebookError {
    /// An edit addressed a position outside the cell sequence.
    ///
    /// `position` is the edit's place in its batch; `len` is the cell count
    /// at the moment the edit was evaluated.
    #[error("edit #{position} ({edit}): index {index} out of range for {len} cells")]
    IndexOutOfRange {
        position: usize,
        edit: &'static str,
        index: usize,
        len: usize,
    },

    /// An edit addressed a run of cells that extends past the end.
    #[error("edit #{position} ({edit}): range {start}+{count} exceeds {len} cells")]
    InvalidRange {
        position: usize,
        edit: &'static str,
        start: usize,
        count: usize,
        len: usize,
    },

    /// Two edits in one batch touch the same cell, and at least one of them
    /// deletes it.
    #[error("edits #{first} and #{second} overlap")]
    OverlappingEdits { first: usize, second: usize },

    /// No cell with this handle exists in the document.
    #[error("cell not found: {0}")]
    CellNotFound(CellHandle),

    /// The document was accessed while it was mutating or notifying listeners.
    #[error("document is busy: edits cannot be applied from a change listener")]
    ReentrantEdit,

    /// An edit batch could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
