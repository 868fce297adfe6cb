//! Clear-outputs command implementation for Folio CLI.

use folio_core::{CellEdit, CellKind};

use crate::notebook::{OpenNotebook, print_change};

/// Execute the clear-outputs command.
pub fn execute(notebook_path: &str) -> anyhow::Result<()> {
    let mut notebook = OpenNotebook::open(notebook_path)?;

    let edits: Vec<CellEdit> = notebook
        .document
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.kind() == CellKind::Code)
        .map(|(index, _)| CellEdit::outputs(index, Vec::new()))
        .collect();

    notebook.print_header("Clear Outputs");
    let event = notebook.apply(edits)?;
    print_change(event.as_ref());

    if event.is_some() {
        notebook.save(None)?;
    }
    Ok(())
}
