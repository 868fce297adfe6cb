//! Apply command implementation for Folio CLI.
//!
//! Applies a JSON batch of cell edits to a notebook as one atomic change.

use std::fs;

use anyhow::Context;
use folio_core::CellEdit;

use crate::notebook::{OpenNotebook, print_change};

/// Execute the apply command.
pub fn execute(notebook_path: &str, edits_path: &str, output: Option<&str>, dry_run: bool) -> anyhow::Result<()> {
    let mut notebook = OpenNotebook::open(notebook_path)?;

    let json = fs::read_to_string(edits_path).with_context(|| format!("Failed to read edits from {}", edits_path))?;
    let edits = CellEdit::parse_batch(&json).with_context(|| format!("Invalid edit batch in {}", edits_path))?;
    tracing::debug!(edit_count = edits.len(), "parsed edit batch");

    notebook.print_header("Apply");
    let event = notebook.apply(edits)?;
    print_change(event.as_ref());

    if dry_run {
        println!("Dry run: nothing written");
    } else if event.is_some() || output.is_some() {
        notebook.save(output)?;
    }
    Ok(())
}
