//! Cells and cell identity.

use serde::{Deserialize, Serialize};

use crate::metadata::CellMetadata;
use crate::output::CellOutput;

/// Stable identifier for a cell within a document.
///
/// Assigned by the document when the cell is inserted and never reused,
/// so it survives moves and edits that shift the cell's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellHandle(pub(crate) u64);

impl CellHandle {
    pub fn new(handle: u64) -> Self {
        Self(handle)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CellHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Type of cell in the notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Executable source.
    Code,
    /// Documentation text.
    Markup,
}

/// Cell contents without an identity; the payload of insert edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    pub source: String,
    pub language: String,
    pub kind: CellKind,
    #[serde(default)]
    pub metadata: CellMetadata,
    #[serde(default)]
    pub outputs: Vec<CellOutput>,
}

impl CellData {
    pub fn code(source: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            language: language.into(),
            kind: CellKind::Code,
            metadata: CellMetadata::default(),
            outputs: Vec::new(),
        }
    }

    pub fn markup(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            language: "markdown".to_string(),
            kind: CellKind::Markup,
            metadata: CellMetadata::default(),
            outputs: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: CellMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<CellOutput>) -> Self {
        self.outputs = outputs;
        self
    }
}

/// A cell owned by a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    handle: CellHandle,
    source: String,
    language: String,
    kind: CellKind,
    metadata: CellMetadata,
    outputs: Vec<CellOutput>,
}

impl Cell {
    pub(crate) fn from_data(handle: CellHandle, data: CellData) -> Self {
        Self {
            handle,
            source: data.source,
            language: data.language,
            kind: data.kind,
            metadata: data.metadata,
            outputs: data.outputs,
        }
    }

    pub fn handle(&self) -> CellHandle {
        self.handle
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn metadata(&self) -> &CellMetadata {
        &self.metadata
    }

    pub fn outputs(&self) -> &[CellOutput] {
        &self.outputs
    }

    /// Copy the contents out, dropping the identity.
    pub fn to_data(&self) -> CellData {
        CellData {
            source: self.source.clone(),
            language: self.language.clone(),
            kind: self.kind,
            metadata: self.metadata.clone(),
            outputs: self.outputs.clone(),
        }
    }

    pub(crate) fn set_source(&mut self, source: String) {
        self.source = source;
    }

    pub(crate) fn set_metadata(&mut self, metadata: CellMetadata) {
        self.metadata = metadata;
    }

    pub(crate) fn set_outputs(&mut self, outputs: Vec<CellOutput>) {
        self.outputs = outputs;
    }
}

/// Mints handles for a single document.
#[derive(Debug, Default)]
pub(crate) struct HandleAllocator {
    next: u64,
}

impl HandleAllocator {
    pub(crate) fn next(&mut self) -> CellHandle {
        let handle = CellHandle(self.next);
        self.next += 1;
        handle
    }

    pub(crate) fn adopt(&mut self, data: CellData) -> Cell {
        Cell::from_data(self.next(), data)
    }
}
