//! Jupyter import/export for Folio notebooks.
//!
//! Reads `.ipynb` files into [`NotebookDocument`]s and writes documents back.
//!
//! # Architecture
//!
//! ```text
//! notebook.ipynb ───► JupyterNotebook ───► document_from_ipynb ───► NotebookDocument
//!                                                                        │
//! notebook.ipynb ◄─── JupyterNotebook ◄─── ipynb_from_document ◄─────────┘
//! ```

mod convert;
mod error;
mod ipynb;
mod outputs;

pub use convert::{CELL_ID, RAW_LANGUAGE, SyncOptions, document_from_ipynb, ipynb_from_document};
pub use error::{SyncError, SyncResult};
pub use ipynb::{JupyterCell, JupyterNotebook, JupyterOutput, MultilineText};
pub use outputs::{binary_output, decode_binary, is_text_mime};

use std::path::Path;

use folio_core::NotebookDocument;

/// Read an `.ipynb` file into a new document at version 0.
pub fn read_document(path: impl AsRef<Path>, options: &SyncOptions) -> SyncResult<NotebookDocument> {
    let path = path.as_ref();
    let notebook = JupyterNotebook::read_from_file(path)?;
    let document = document_from_ipynb(&notebook, options)?;

    tracing::info!("Read {} ({} cells)", path.display(), document.len());
    Ok(document)
}

/// Write a document to an `.ipynb` file.
pub fn write_document(document: &NotebookDocument, path: impl AsRef<Path>) -> SyncResult<()> {
    let path = path.as_ref();
    let notebook = ipynb_from_document(document);
    notebook.write_to_file(path)?;

    tracing::info!(
        "Wrote {} ({} cells, version {})",
        path.display(),
        document.len(),
        document.version()
    );
    Ok(())
}
