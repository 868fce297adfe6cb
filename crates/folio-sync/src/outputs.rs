//! Conversion between Jupyter outputs and cell outputs.
//!
//! | Jupyter                            | Cell output                                  |
//! |------------------------------------|----------------------------------------------|
//! | `stream` (`stdout`/`stderr`)       | one `application/vnd.code.notebook.std*` item |
//! | `execute_result`, `display_data`   | one item per mime in `data`                  |
//! | `error`                            | one `application/vnd.code.notebook.error` item |

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use folio_core::output::mime;
use folio_core::{CellOutput, Metadata, OutputItem};
use serde_json::{Map, Value, json};

use crate::error::SyncResult;
use crate::ipynb::{JupyterOutput, MultilineText};

/// Output metadata key holding the output id.
pub const OUTPUT_ID: &str = "outputId";

/// Output metadata key recording which Jupyter output kind an output was.
pub const OUTPUT_TYPE: &str = "outputType";

/// Output metadata key for an `execute_result`'s execution count.
pub const EXECUTION_COUNT: &str = "executionCount";

const DISPLAY_DATA: &str = "display_data";
const EXECUTE_RESULT: &str = "execute_result";

/// Whether `mime` carries text that Jupyter may split into lines.
pub fn is_text_mime(mime: &str) -> bool {
    mime.starts_with("text/")
        || mime == mime::STDOUT
        || mime == mime::STDERR
        || mime == "image/svg+xml"
        || mime == "application/javascript"
}

/// Build an output item holding `bytes` as base64 text.
pub fn binary_output(mime: impl Into<String>, bytes: &[u8]) -> OutputItem {
    OutputItem::new(mime, STANDARD.encode(bytes))
}

/// Decode an item written by [`binary_output`] (or an image from a Jupyter
/// file) back into bytes.
pub fn decode_binary(item: &OutputItem) -> SyncResult<Option<Vec<u8>>> {
    match item.as_text() {
        Some(text) => {
            let compact: String = text.split_whitespace().collect();
            Ok(Some(STANDARD.decode(compact)?))
        }
        None => Ok(None),
    }
}

/// Convert one Jupyter output into a cell output.
pub fn from_jupyter(output: &JupyterOutput) -> CellOutput {
    match output {
        JupyterOutput::Stream { name, text } => {
            let mime = if name == "stderr" { mime::STDERR } else { mime::STDOUT };
            CellOutput::text(new_output_id(), mime, text.to_text())
        }
        JupyterOutput::ExecuteResult {
            execution_count,
            data,
            metadata,
        } => {
            let mut output = rich_output(data, metadata);
            output.metadata.set(OUTPUT_TYPE, EXECUTE_RESULT);
            if let Some(count) = execution_count {
                output.metadata.set(EXECUTION_COUNT, *count);
            }
            output
        }
        JupyterOutput::DisplayData { data, metadata } => {
            let mut output = rich_output(data, metadata);
            output.metadata.set(OUTPUT_TYPE, DISPLAY_DATA);
            output
        }
        JupyterOutput::Error {
            ename,
            evalue,
            traceback,
        } => CellOutput::new(
            new_output_id(),
            vec![OutputItem::new(
                mime::ERROR,
                json!({
                    "name": ename,
                    "message": evalue,
                    "stack": traceback.join("\n"),
                }),
            )],
        ),
    }
}

/// Convert one cell output into a Jupyter output.
///
/// `execution_count` is used for results that did not record their own.
pub fn to_jupyter(output: &CellOutput, execution_count: Option<u32>) -> JupyterOutput {
    if let [item] = output.items.as_slice() {
        let stream = match item.mime.as_str() {
            m if m == mime::STDOUT => Some("stdout"),
            m if m == mime::STDERR => Some("stderr"),
            _ => None,
        };
        if let Some(name) = stream {
            return JupyterOutput::Stream {
                name: name.to_string(),
                text: MultilineText::from_text(item.as_text().unwrap_or_default()),
            };
        }
    }

    if let Some(error) = output.item(mime::ERROR) {
        let field = |key: &str| {
            error
                .value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let stack = field("stack");
        return JupyterOutput::Error {
            ename: field("name"),
            evalue: field("message"),
            traceback: if stack.is_empty() {
                Vec::new()
            } else {
                stack.lines().map(String::from).collect()
            },
        };
    }

    let mut data = Map::new();
    for item in &output.items {
        let value = match item.as_text() {
            Some(text) if is_text_mime(&item.mime) => {
                serde_json::to_value(MultilineText::from_text(text)).unwrap_or(Value::Null)
            }
            _ => item.value.clone(),
        };
        data.insert(item.mime.clone(), value);
    }

    let mut metadata = output.metadata.clone();
    let output_type = metadata.remove(OUTPUT_TYPE);
    let recorded_count = metadata
        .remove(EXECUTION_COUNT)
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok());
    metadata.set(OUTPUT_ID, output.output_id.clone());

    if output_type.as_ref().and_then(Value::as_str) == Some(DISPLAY_DATA) {
        JupyterOutput::DisplayData {
            data,
            metadata: metadata.into_json(),
        }
    } else {
        JupyterOutput::ExecuteResult {
            execution_count: recorded_count.or(execution_count),
            data,
            metadata: metadata.into_json(),
        }
    }
}

fn rich_output(data: &Map<String, Value>, metadata: &Map<String, Value>) -> CellOutput {
    let items = data
        .iter()
        .map(|(mime, value)| OutputItem::new(mime.clone(), join_lines(mime, value)))
        .collect();

    let mut metadata = Metadata::from(metadata.clone());
    let output_id = match metadata.remove(OUTPUT_ID) {
        Some(Value::String(id)) => id,
        _ => new_output_id(),
    };
    CellOutput::new(output_id, items).with_metadata(metadata)
}

/// Jupyter splits text payloads (and base64 images) into line arrays.
fn join_lines(mime: &str, value: &Value) -> Value {
    if mime == "application/json" || mime.ends_with("+json") {
        return value.clone();
    }
    match value {
        Value::Array(lines) if lines.iter().all(Value::is_string) => {
            Value::String(lines.iter().filter_map(Value::as_str).collect())
        }
        other => other.clone(),
    }
}

fn new_output_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
