//! Cell edit operations.
//!
//! A batch is an ordered `Vec<CellEdit>`. Every index in a batch addresses
//! the document as it was before the batch; see `EditBatchApplier` for how
//! edits sharing a position are ordered.

use serde::{Deserialize, Serialize};

use crate::cell::CellData;
use crate::error::Result;
use crate::metadata::{CellMetadata, NotebookMetadata};
use crate::output::CellOutput;

/// A single edit in a batch.
///
/// Serialized with an `editType` tag so batches can be written as JSON:
///
/// ```json
/// [
///   { "editType": "replace", "index": 1, "count": 1, "cells": [] },
///   { "editType": "output", "index": 0, "outputs": [], "append": false }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "editType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CellEdit {
    /// Delete `count` cells at `index`, then insert `cells` there.
    Replace {
        index: usize,
        count: usize,
        #[serde(default)]
        cells: Vec<CellData>,
    },

    /// Replace the outputs of one cell, or append to them.
    Output {
        index: usize,
        outputs: Vec<CellOutput>,
        #[serde(default)]
        append: bool,
    },

    /// Replace the metadata of one cell.
    Metadata { index: usize, metadata: CellMetadata },

    /// Merge fields into the metadata of one cell.
    PartialMetadata { index: usize, metadata: CellMetadata },

    /// Replace the document-level metadata.
    DocumentMetadata { metadata: NotebookMetadata },
}

impl CellEdit {
    pub fn insert(index: usize, cells: Vec<CellData>) -> Self {
        Self::Replace {
            index,
            count: 0,
            cells,
        }
    }

    pub fn delete(index: usize, count: usize) -> Self {
        Self::Replace {
            index,
            count,
            cells: Vec::new(),
        }
    }

    pub fn replace(index: usize, count: usize, cells: Vec<CellData>) -> Self {
        Self::Replace {
            index,
            count,
            cells,
        }
    }

    pub fn outputs(index: usize, outputs: Vec<CellOutput>) -> Self {
        Self::Output {
            index,
            outputs,
            append: false,
        }
    }

    pub fn append_outputs(index: usize, outputs: Vec<CellOutput>) -> Self {
        Self::Output {
            index,
            outputs,
            append: true,
        }
    }

    pub fn metadata(index: usize, metadata: CellMetadata) -> Self {
        Self::Metadata { index, metadata }
    }

    pub fn partial_metadata(index: usize, metadata: CellMetadata) -> Self {
        Self::PartialMetadata { index, metadata }
    }

    /// Short name used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Replace { .. } => "replace",
            Self::Output { .. } => "output",
            Self::Metadata { .. } => "metadata",
            Self::PartialMetadata { .. } => "partialMetadata",
            Self::DocumentMetadata { .. } => "documentMetadata",
        }
    }

    /// Decode a JSON array of edits.
    pub fn parse_batch(json: &str) -> Result<Vec<CellEdit>> {
        Ok(serde_json::from_str(json)?)
    }
}
