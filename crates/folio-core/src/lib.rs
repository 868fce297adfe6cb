//! Core document model for Folio notebooks.
//!
//! This crate provides:
//! - Cells, outputs and metadata
//! - Tagged cell edit operations that can be decoded from JSON
//! - Atomic batch application with per-batch versioning
//! - Change events with end-of-batch selection state
//! - Undo/redo of whole batches
//!
//! # Example
//!
//! ```
//! use folio_core::{ApplyOptions, CellData, CellEdit, NotebookDocument};
//!
//! let mut doc = NotebookDocument::new(vec![
//!     CellData::code("let a = 1;", "rust"),
//!     CellData::code("let b = 2;", "rust"),
//! ]);
//!
//! let changed = doc
//!     .apply_edits(
//!         vec![CellEdit::insert(1, vec![CellData::markup("# Notes")])],
//!         ApplyOptions::default(),
//!         |_| None,
//!     )
//!     .unwrap();
//!
//! assert!(changed);
//! assert_eq!(doc.len(), 3);
//! assert_eq!(doc.version(), 1);
//! ```

pub mod applier;
pub mod cell;
pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod event;
pub mod metadata;
pub mod operation;
pub mod output;
pub mod selection;
pub mod shared;
pub mod undo;

pub use applier::EditBatchApplier;
pub use cell::{Cell, CellData, CellHandle, CellKind};
pub use config::DocumentOptions;
pub use document::{ApplyOptions, NotebookDocument};
pub use edit::CellEdit;
pub use error::{NotebookError, Result};
pub use event::{ChangeEvent, ChangeOrigin, Emitter, RawChange, Subscription};
pub use metadata::{CellMetadata, Metadata, NotebookMetadata};
pub use operation::{CellOperation, Direction};
pub use output::{CellOutput, OutputItem};
pub use selection::{CellRange, SelectionState};
pub use shared::SharedDocument;
pub use undo::{EditStackElement, UndoManager};
