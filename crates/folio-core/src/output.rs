//! Cell outputs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metadata::Metadata;

/// Well-known output mime types.
pub mod mime {
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const TEXT_MARKDOWN: &str = "text/markdown";
    pub const TEXT_HTML: &str = "text/html";
    pub const STDOUT: &str = "application/vnd.code.notebook.stdout";
    pub const STDERR: &str = "application/vnd.code.notebook.stderr";
    pub const ERROR: &str = "application/vnd.code.notebook.error";
}

/// One mime-typed representation of an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputItem {
    pub mime: String,
    pub value: Value,
}

impl OutputItem {
    pub fn new(mime: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            mime: mime.into(),
            value: value.into(),
        }
    }

    /// The value as text, when it is a JSON string.
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_str()
    }
}

/// An output attached to a cell: an id plus one or more representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellOutput {
    pub output_id: String,
    #[serde(rename = "outputs")]
    pub items: Vec<OutputItem>,
    /// Producer-defined extras, such as the kind of output a file format
    /// stored it as.
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl CellOutput {
    pub fn new(output_id: impl Into<String>, items: Vec<OutputItem>) -> Self {
        Self {
            output_id: output_id.into(),
            items,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Output with a single text representation.
    pub fn text(output_id: impl Into<String>, mime: impl Into<String>, text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self::new(output_id, vec![OutputItem::new(mime, text)])
    }

    /// Find the representation for `mime`.
    pub fn item(&self, mime: &str) -> Option<&OutputItem> {
        self.items.iter().find(|item| item.mime == mime)
    }
}
