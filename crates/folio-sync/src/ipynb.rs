//! Jupyter notebook (.ipynb) file format.
//!
//! Only the parts of nbformat 4 that map onto notebook documents are typed;
//! metadata maps are kept as raw JSON so unknown keys survive a round trip.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SyncError, SyncResult};

/// Oldest major format version that can be read.
pub const NBFORMAT: u32 = 4;

/// Minor format version written to new files.
pub const NBFORMAT_MINOR: u32 = 5;

/// A Jupyter notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JupyterNotebook {
    /// Notebook metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Format version
    pub nbformat: u32,

    /// Minor format version
    pub nbformat_minor: u32,

    /// Notebook cells
    pub cells: Vec<JupyterCell>,
}

/// A Jupyter cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JupyterCell {
    /// `code`, `markdown` or `raw`
    pub cell_type: String,

    /// Cell id (nbformat 4.5 and later)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    pub source: MultilineText,

    /// Cell outputs (code cells only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<JupyterOutput>>,

    /// Execution count (code cells only). Serialized as `null` when unset.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_count: Option<Option<u32>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing key (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Text stored either as one string or as a list of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Text(String),
    Lines(Vec<String>),
}

impl MultilineText {
    /// Split text into lines that keep their trailing newline.
    pub fn from_text(text: &str) -> Self {
        Self::Lines(text.split_inclusive('\n').map(String::from).collect())
    }

    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Lines(lines) => lines.concat(),
        }
    }
}

impl Default for MultilineText {
    fn default() -> Self {
        Self::Lines(Vec::new())
    }
}

/// Cell output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type")]
pub enum JupyterOutput {
    /// Standard output/error
    #[serde(rename = "stream")]
    Stream { name: String, text: MultilineText },

    /// Result of the last expression of a cell
    #[serde(rename = "execute_result")]
    ExecuteResult {
        execution_count: Option<u32>,
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },

    /// Display data
    #[serde(rename = "display_data")]
    DisplayData {
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },

    /// Error output
    #[serde(rename = "error")]
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl JupyterNotebook {
    /// Create a new empty notebook.
    pub fn new() -> Self {
        Self {
            metadata: Map::new(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
            cells: Vec::new(),
        }
    }

    /// Parse a notebook from JSON text.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let notebook: Self = serde_json::from_str(json)?;
        if notebook.nbformat < NBFORMAT {
            return Err(SyncError::InvalidNotebook(format!(
                "nbformat {} is not supported (need {} or later)",
                notebook.nbformat, NBFORMAT
            )));
        }
        Ok(notebook)
    }

    /// Name of the notebook's language, if the file records one.
    pub fn language(&self) -> Option<&str> {
        self.metadata
            .get("language_info")
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str)
    }

    /// Write the notebook to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> SyncResult<()> {
        let path = path.as_ref();
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json).map_err(|e| SyncError::WriteError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Read a notebook from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SyncError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}

impl Default for JupyterNotebook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_notebook() {
        let notebook = JupyterNotebook::new();
        assert_eq!(notebook.nbformat, 4);
        assert!(notebook.cells.is_empty());
    }

    #[test]
    fn test_source_as_string_or_lines() {
        let cell: JupyterCell = serde_json::from_str(
            r#"{"cell_type": "code", "metadata": {}, "source": "a = 1\nb = 2", "outputs": [], "execution_count": null}"#,
        )
        .unwrap();
        assert_eq!(cell.source.to_text(), "a = 1\nb = 2");
        assert_eq!(cell.execution_count, Some(None));

        let cell: JupyterCell =
            serde_json::from_str(r##"{"cell_type": "markdown", "metadata": {}, "source": ["# Title\n", "body"]}"##)
                .unwrap();
        assert_eq!(cell.source.to_text(), "# Title\nbody");
        assert_eq!(cell.execution_count, None);
    }

    #[test]
    fn test_from_text_keeps_newlines() {
        assert_eq!(
            MultilineText::from_text("a\nb\n"),
            MultilineText::Lines(vec!["a\n".to_string(), "b\n".to_string()])
        );
        assert_eq!(MultilineText::from_text(""), MultilineText::Lines(Vec::new()));
    }

    #[test]
    fn test_rejects_old_format() {
        let err = JupyterNotebook::from_json(r#"{"nbformat": 3, "nbformat_minor": 0, "cells": []}"#).unwrap_err();
        assert!(matches!(err, SyncError::InvalidNotebook(_)));
    }

    #[test]
    fn test_output_tags() {
        let output: JupyterOutput =
            serde_json::from_str(r#"{"output_type": "stream", "name": "stdout", "text": ["hi\n"]}"#).unwrap();
        assert_eq!(
            output,
            JupyterOutput::Stream {
                name: "stdout".to_string(),
                text: MultilineText::Lines(vec!["hi\n".to_string()]),
            }
        );
    }
}
