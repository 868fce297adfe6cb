//! Info command implementation for Folio CLI.
//!
//! Prints the cells of a notebook with their kind, language and outputs.

use folio_core::CellKind;

use crate::colors;
use crate::notebook::OpenNotebook;

const PREVIEW_WIDTH: usize = 40;

/// Execute the info command.
pub fn execute(notebook_path: &str, json: bool) -> anyhow::Result<()> {
    let notebook = OpenNotebook::open(notebook_path)?;
    let document = &notebook.document;

    if json {
        println!("{}", serde_json::to_string_pretty(&document.to_cell_data())?);
        return Ok(());
    }

    notebook.print_header("Info");
    for (index, cell) in document.cells().iter().enumerate() {
        let kind = match cell.kind() {
            CellKind::Code => "code",
            CellKind::Markup => "markup",
        };
        println!(
            "  {}[{}]{} {} ({}) {}{} outputs{}  {}",
            colors::CYAN,
            index,
            colors::RESET,
            kind,
            cell.language(),
            colors::DIM,
            cell.outputs().len(),
            colors::RESET,
            preview(cell.source())
        );
    }

    println!("{}", "─".repeat(50));
    println!("{} cells, version {}", document.len(), document.version());
    Ok(())
}

/// First line of a cell, shortened for display.
fn preview(source: &str) -> String {
    let first = source.lines().next().unwrap_or_default();
    if first.chars().count() > PREVIEW_WIDTH {
        let cut: String = first.chars().take(PREVIEW_WIDTH).collect();
        format!("{}…", cut)
    } else {
        first.to_string()
    }
}
