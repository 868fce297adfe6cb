//! Loading, saving and applying batches to notebook files.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use anyhow::Context;
use folio_core::{ApplyOptions, CellEdit, ChangeEvent, NotebookDocument};
use folio_sync::SyncOptions;

use crate::colors;

/// A notebook opened from disk.
pub struct OpenNotebook {
    pub path: PathBuf,
    pub document: NotebookDocument,
}

impl OpenNotebook {
    pub fn open(notebook_path: &str) -> anyhow::Result<Self> {
        let path = Path::new(notebook_path);
        if !path.exists() {
            anyhow::bail!("Notebook not found: {}", notebook_path);
        }

        let document = folio_sync::read_document(path, &SyncOptions::default())
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn print_header(&self, action: &str) {
        println!(
            "\n{}Folio {}{} - {}",
            colors::BOLD,
            action,
            colors::RESET,
            self.path.display()
        );
        println!("{}", "─".repeat(50));
    }

    /// Apply one batch and return the change event it fired, if any.
    pub fn apply(&mut self, edits: Vec<CellEdit>) -> anyhow::Result<Option<ChangeEvent>> {
        let fired = Rc::new(RefCell::new(None));
        let sink = fired.clone();
        let subscription = self
            .document
            .on_did_change_content(move |event| *sink.borrow_mut() = Some(event.clone()));

        let edit_count = edits.len();
        self.document
            .apply_edits(edits, ApplyOptions::default(), |_| None)
            .with_context(|| format!("Failed to apply {} edits", edit_count))?;
        subscription.dispose();

        Ok(fired.borrow_mut().take())
    }

    /// Write the document to `output`, or back to where it was read from.
    pub fn save(&self, output: Option<&str>) -> anyhow::Result<()> {
        let target = output.map(PathBuf::from).unwrap_or_else(|| self.path.clone());
        let start = Instant::now();

        print!("  Writing {} ... ", target.display());
        colors::flush_stdout();

        folio_sync::write_document(&self.document, &target)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        println!(
            "{}✓{} ({:.2}ms)",
            colors::GREEN,
            colors::RESET,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }
}

/// Print the summary line for a batch.
pub fn print_change(event: Option<&ChangeEvent>) {
    match event {
        Some(event) => println!(
            "{}Applied{} {} changes (version {})",
            colors::GREEN,
            colors::RESET,
            event.raw_events.len(),
            event.version
        ),
        None => println!("{}no changes{}", colors::YELLOW, colors::RESET),
    }
}
