//! Conversion between Jupyter notebooks and notebook documents.

use folio_core::metadata::EXECUTION_ORDER;
use folio_core::{CellData, CellKind, DocumentOptions, Metadata, NotebookDocument};
use serde_json::{Value, json};

use crate::error::{SyncError, SyncResult};
use crate::ipynb::{JupyterCell, JupyterNotebook, MultilineText};
use crate::outputs;

/// Cell metadata key holding the Jupyter cell id.
pub const CELL_ID: &str = "cellId";

/// Language given to cells of Jupyter's `raw` type.
pub const RAW_LANGUAGE: &str = "raw";

/// Options for reading notebooks.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Language of code cells when the notebook does not name one.
    pub default_language: String,
    /// Options for the created document.
    pub document: DocumentOptions,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            default_language: "python".to_string(),
            document: DocumentOptions::default(),
        }
    }
}

/// Build a document from a parsed notebook.
pub fn document_from_ipynb(notebook: &JupyterNotebook, options: &SyncOptions) -> SyncResult<NotebookDocument> {
    let language = notebook.language().unwrap_or(options.default_language.as_str());

    let cells = notebook
        .cells
        .iter()
        .map(|cell| cell_from_jupyter(cell, language))
        .collect::<SyncResult<Vec<_>>>()?;

    Ok(NotebookDocument::with_options(
        cells,
        Metadata::from(notebook.metadata.clone()),
        options.document.clone(),
    ))
}

/// Snapshot a document as a notebook.
pub fn ipynb_from_document(document: &NotebookDocument) -> JupyterNotebook {
    let mut notebook = JupyterNotebook::new();
    notebook.metadata = document.metadata().clone().into_json();

    let language = match notebook.language().map(str::to_string) {
        Some(language) => Some(language),
        None => {
            let first_code = document
                .cells()
                .iter()
                .find(|cell| cell.kind() == CellKind::Code && cell.language() != RAW_LANGUAGE)
                .map(|cell| cell.language().to_string());
            if let Some(language) = &first_code {
                notebook
                    .metadata
                    .insert("language_info".to_string(), json!({ "name": language }));
            }
            first_code
        }
    };

    notebook.cells = document
        .to_cell_data()
        .iter()
        .map(|cell| cell_to_jupyter(cell, language.as_deref()))
        .collect();
    notebook
}

fn cell_from_jupyter(cell: &JupyterCell, notebook_language: &str) -> SyncResult<CellData> {
    let source = cell.source.to_text();
    let mut metadata = Metadata::from(cell.metadata.clone());
    if let Some(id) = &cell.id {
        metadata.set(CELL_ID, id.clone());
    }

    match cell.cell_type.as_str() {
        "markdown" => Ok(CellData::markup(source).with_metadata(metadata)),
        "raw" => Ok(CellData::code(source, RAW_LANGUAGE).with_metadata(metadata)),
        "code" => {
            let language = cell
                .metadata
                .get("vscode")
                .and_then(|vscode| vscode.get("languageId"))
                .and_then(Value::as_str)
                .unwrap_or(notebook_language)
                .to_string();
            if let Some(Some(count)) = cell.execution_count {
                metadata.set(EXECUTION_ORDER, count);
            }
            let outputs = cell
                .outputs
                .iter()
                .flatten()
                .map(outputs::from_jupyter)
                .collect();
            Ok(CellData::code(source, language)
                .with_metadata(metadata)
                .with_outputs(outputs))
        }
        other => Err(SyncError::InvalidNotebook(format!("unknown cell type `{}`", other))),
    }
}

fn cell_to_jupyter(cell: &CellData, notebook_language: Option<&str>) -> JupyterCell {
    let mut metadata = cell.metadata.clone();
    let id = match metadata.remove(CELL_ID) {
        Some(Value::String(id)) => id,
        _ => uuid::Uuid::new_v4().to_string(),
    };
    let execution_order = metadata.execution_order();
    metadata.remove(EXECUTION_ORDER);

    let source = MultilineText::from_text(&cell.source);

    let (cell_type, outputs, execution_count) = match cell.kind {
        CellKind::Markup => ("markdown", None, None),
        CellKind::Code if cell.language == RAW_LANGUAGE => ("raw", None, None),
        CellKind::Code => {
            if notebook_language.is_some_and(|l| l != cell.language) && !metadata.contains_key("vscode") {
                metadata.set("vscode", json!({ "languageId": cell.language }));
            }
            let outputs = cell
                .outputs
                .iter()
                .map(|output| outputs::to_jupyter(output, execution_order))
                .collect();
            ("code", Some(outputs), Some(execution_order))
        }
    };

    JupyterCell {
        cell_type: cell_type.to_string(),
        id: Some(id),
        metadata: metadata.into_json(),
        source,
        outputs,
        execution_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notebook(json: Value) -> JupyterNotebook {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_language_from_language_info() {
        let nb = notebook(json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": { "language_info": { "name": "julia" } },
            "cells": [{ "cell_type": "code", "metadata": {}, "source": "1 + 1", "outputs": [], "execution_count": 2 }]
        }));
        let doc = document_from_ipynb(&nb, &SyncOptions::default()).unwrap();
        assert_eq!(doc.cell(0).unwrap().language(), "julia");
        assert_eq!(doc.cell(0).unwrap().metadata().execution_order(), Some(2));
    }

    #[test]
    fn test_default_language() {
        let nb = notebook(json!({
            "nbformat": 4,
            "nbformat_minor": 4,
            "metadata": {},
            "cells": [
                { "cell_type": "code", "metadata": {}, "source": [], "outputs": [], "execution_count": null },
                { "cell_type": "raw", "metadata": {}, "source": "raw text" }
            ]
        }));
        let doc = document_from_ipynb(&nb, &SyncOptions::default()).unwrap();
        assert_eq!(doc.cell(0).unwrap().language(), "python");
        assert_eq!(doc.cell(0).unwrap().metadata().execution_order(), None);
        assert_eq!(doc.cell(1).unwrap().language(), RAW_LANGUAGE);
    }

    #[test]
    fn test_unknown_cell_type() {
        let nb = notebook(json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "cells": [{ "cell_type": "widget", "metadata": {}, "source": "" }]
        }));
        let err = document_from_ipynb(&nb, &SyncOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::InvalidNotebook(_)));
    }

    #[test]
    fn test_write_moves_execution_order_out_of_metadata() {
        let doc = NotebookDocument::new(vec![
            CellData::code("x = 1", "python").with_metadata(Metadata::new().with(EXECUTION_ORDER, 7)),
            CellData::markup("# notes"),
        ]);
        let nb = ipynb_from_document(&doc);

        assert_eq!(nb.language(), Some("python"));
        assert_eq!(nb.cells[0].execution_count, Some(Some(7)));
        assert!(!nb.cells[0].metadata.contains_key(EXECUTION_ORDER));
        assert_eq!(nb.cells[1].cell_type, "markdown");
        assert!(nb.cells[1].outputs.is_none());
        assert!(nb.cells.iter().all(|cell| cell.id.is_some()));
    }
}
