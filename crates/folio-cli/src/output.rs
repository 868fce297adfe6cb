//! Output command implementation for Folio CLI.
//!
//! Sets or appends an output on one cell, from inline text or a file.

use std::fs;
use std::path::Path;

use anyhow::Context;
use folio_core::output::mime;
use folio_core::{CellEdit, CellOutput, OutputItem};
use folio_sync::{binary_output, is_text_mime};

use crate::notebook::{OpenNotebook, print_change};

/// Where the output payload comes from.
pub enum Payload<'a> {
    Text(&'a str),
    File(&'a str),
}

/// Execute the output command.
pub fn execute(notebook_path: &str, cell: usize, payload: Payload<'_>, mime_type: Option<&str>, append: bool) -> anyhow::Result<()> {
    let mut notebook = OpenNotebook::open(notebook_path)?;
    let item = load_item(payload, mime_type)?;
    let output = CellOutput::new(uuid::Uuid::new_v4().to_string(), vec![item]);

    let edit = if append {
        CellEdit::append_outputs(cell, vec![output])
    } else {
        CellEdit::outputs(cell, vec![output])
    };

    notebook.print_header("Output");
    let event = notebook.apply(vec![edit])?;
    print_change(event.as_ref());

    if event.is_some() {
        notebook.save(None)?;
    }
    Ok(())
}

fn load_item(payload: Payload<'_>, mime_type: Option<&str>) -> anyhow::Result<OutputItem> {
    match payload {
        Payload::Text(text) => Ok(OutputItem::new(mime_type.unwrap_or(mime::TEXT_PLAIN), text)),
        Payload::File(path) => {
            let mime_type = mime_type.unwrap_or(mime::TEXT_PLAIN);
            if is_text_mime(mime_type) {
                let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
                Ok(OutputItem::new(mime_type, text))
            } else if mime_type == "application/json" {
                let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
                let value: serde_json::Value =
                    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path))?;
                Ok(OutputItem::new(mime_type, value))
            } else {
                let bytes = fs::read(Path::new(path)).with_context(|| format!("Failed to read {}", path))?;
                Ok(binary_output(mime_type, &bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payload_defaults_to_plain() {
        let item = load_item(Payload::Text("hello"), None).unwrap();
        assert_eq!(item.mime, mime::TEXT_PLAIN);
        assert_eq!(item.as_text(), Some("hello"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_item(Payload::File("/nonexistent/output.txt"), None).is_err());
    }
}
