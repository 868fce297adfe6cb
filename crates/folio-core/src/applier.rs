//! Batch validation and application.
//!
//! Every index in a batch addresses the document as it was before the
//! batch. Edits are applied from the end of the sequence towards the start,
//! so applying one edit never shifts the position another edit names.

use std::ops::Range;

use tracing::trace;

use crate::cell::{Cell, HandleAllocator};
use crate::edit::CellEdit;
use crate::error::{NotebookError, Result};
use crate::metadata::NotebookMetadata;
use crate::operation::{CellOperation, Direction};

/// Applies an ordered list of edits to a cell sequence.
///
/// The whole batch is validated before anything is touched, so a rejected
/// batch leaves the sequence exactly as it was.
pub struct EditBatchApplier<'a> {
    cells: &'a mut Vec<Cell>,
    metadata: &'a mut NotebookMetadata,
    handles: &'a mut HandleAllocator,
}

/// Where an edit lands, for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    Document,
    Cell,
    Replace,
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    class: Class,
}

fn span(edit: &CellEdit) -> Span {
    match edit {
        CellEdit::Replace { index, count, .. } => Span {
            start: *index,
            end: index + count,
            class: Class::Replace,
        },
        CellEdit::Output { index, .. } | CellEdit::Metadata { index, .. } | CellEdit::PartialMetadata { index, .. } => {
            Span {
                start: *index,
                end: *index,
                class: Class::Cell,
            }
        }
        CellEdit::DocumentMetadata { .. } => Span {
            start: usize::MAX,
            end: usize::MAX,
            class: Class::Document,
        },
    }
}

/// Order in which to apply the edits of a validated batch.
///
/// Rightmost edits go first. On a shared boundary, cell edits run before a
/// replace so they still see the original cell, edits on the same cell keep
/// call order, and inserts at the same point run last-first so the inserted
/// cells end up in call order.
fn application_order(edits: &[CellEdit]) -> Vec<usize> {
    let spans: Vec<Span> = edits.iter().map(span).collect();
    let mut order: Vec<usize> = (0..edits.len()).collect();
    order.sort_by(|&a, &b| {
        let (sa, sb) = (spans[a], spans[b]);
        sb.end
            .cmp(&sa.end)
            .then(sb.start.cmp(&sa.start))
            .then(sa.class.cmp(&sb.class))
            .then_with(|| match sa.class {
                Class::Replace => b.cmp(&a),
                Class::Document | Class::Cell => a.cmp(&b),
            })
    });
    order
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn ordered_overlap(a: usize, b: usize) -> NotebookError {
    NotebookError::OverlappingEdits {
        first: a.min(b),
        second: a.max(b),
    }
}

impl<'a> EditBatchApplier<'a> {
    pub(crate) fn new(
        cells: &'a mut Vec<Cell>,
        metadata: &'a mut NotebookMetadata,
        handles: &'a mut HandleAllocator,
    ) -> Self {
        Self {
            cells,
            metadata,
            handles,
        }
    }

    /// Check every edit against a document of `len` cells.
    ///
    /// Replace edits need `index <= len` and `index + count <= len`; cell
    /// edits must name an existing cell. Two replaces may not delete the same
    /// cell, no cell edit may target a cell that the batch deletes, and no
    /// insert may land strictly inside a range that the batch deletes.
    pub fn validate(len: usize, edits: &[CellEdit]) -> Result<()> {
        let mut deleted: Vec<(usize, Range<usize>)> = Vec::new();
        let mut targets: Vec<(usize, usize)> = Vec::new();
        let mut insertions: Vec<(usize, usize)> = Vec::new();

        for (position, edit) in edits.iter().enumerate() {
            let kind = edit.kind();
            match edit {
                CellEdit::Replace { index, count, cells } => {
                    if *index > len {
                        return Err(NotebookError::IndexOutOfRange {
                            position,
                            edit: kind,
                            index: *index,
                            len,
                        });
                    }
                    if *count > len - index {
                        return Err(NotebookError::InvalidRange {
                            position,
                            edit: kind,
                            start: *index,
                            count: *count,
                            len,
                        });
                    }
                    if *count > 0 {
                        deleted.push((position, *index..index + count));
                    } else if !cells.is_empty() {
                        insertions.push((position, *index));
                    }
                }
                CellEdit::Output { index, .. }
                | CellEdit::Metadata { index, .. }
                | CellEdit::PartialMetadata { index, .. } => {
                    if *index >= len {
                        return Err(NotebookError::IndexOutOfRange {
                            position,
                            edit: kind,
                            index: *index,
                            len,
                        });
                    }
                    targets.push((position, *index));
                }
                CellEdit::DocumentMetadata { .. } => {}
            }
        }

        for (i, (first, a)) in deleted.iter().enumerate() {
            for (second, b) in &deleted[i + 1..] {
                if overlaps(a, b) {
                    return Err(NotebookError::OverlappingEdits {
                        first: *first,
                        second: *second,
                    });
                }
            }
            for (target, index) in &targets {
                if a.contains(index) {
                    return Err(ordered_overlap(*first, *target));
                }
            }
            for (insert, index) in &insertions {
                if a.start < *index && *index < a.end {
                    return Err(ordered_overlap(*first, *insert));
                }
            }
        }

        Ok(())
    }

    /// Validate, then apply `edits`.
    ///
    /// Returns one operation per edit that changed something, in the order
    /// they were applied; edits with no observable effect are dropped.
    pub(crate) fn apply(mut self, edits: Vec<CellEdit>) -> Result<Vec<CellOperation>> {
        Self::validate(self.cells.len(), &edits)?;

        let order = application_order(&edits);
        let mut slots: Vec<Option<CellEdit>> = edits.into_iter().map(Some).collect();
        let mut operations = Vec::with_capacity(slots.len());

        for position in order {
            let Some(edit) = slots[position].take() else {
                continue;
            };
            let kind = edit.kind();
            match self.build(edit) {
                Some(operation) => {
                    operation.apply(self.cells, self.metadata, Direction::Forward);
                    operations.push(operation);
                }
                None => trace!(position, edit = kind, "edit has no observable effect"),
            }
        }

        Ok(operations)
    }

    fn build(&mut self, edit: CellEdit) -> Option<CellOperation> {
        match edit {
            CellEdit::Replace { index, count, cells } => {
                if count == 0 && cells.is_empty() {
                    return None;
                }
                let removed = self.cells[index..index + count].to_vec();
                let inserted = cells.into_iter().map(|data| self.handles.adopt(data)).collect();
                Some(CellOperation::Splice {
                    index,
                    removed,
                    inserted,
                })
            }
            CellEdit::Output {
                index,
                outputs,
                append,
            } => {
                let cell = &self.cells[index];
                let before = cell.outputs().to_vec();
                let after = if append {
                    let mut after = before.clone();
                    after.extend(outputs);
                    after
                } else {
                    outputs
                };
                (before != after).then(|| CellOperation::Outputs {
                    index,
                    handle: cell.handle(),
                    before,
                    after,
                    append,
                })
            }
            CellEdit::Metadata { index, metadata } => {
                let cell = &self.cells[index];
                let before = cell.metadata().clone();
                (before != metadata).then(|| CellOperation::Metadata {
                    index,
                    handle: cell.handle(),
                    before,
                    after: metadata,
                })
            }
            CellEdit::PartialMetadata { index, metadata } => {
                let cell = &self.cells[index];
                let before = cell.metadata().clone();
                let mut after = before.clone();
                after.merge(&metadata);
                (before != after).then(|| CellOperation::Metadata {
                    index,
                    handle: cell.handle(),
                    before,
                    after,
                })
            }
            CellEdit::DocumentMetadata { metadata } => {
                let before = self.metadata.clone();
                (before != metadata).then_some(CellOperation::DocumentMetadata {
                    before,
                    after: metadata,
                })
            }
        }
    }
}

impl std::fmt::Debug for EditBatchApplier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditBatchApplier")
            .field("cells", &self.cells.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellData;
    use crate::metadata::CellMetadata;

    fn markup(source: &str) -> Vec<CellData> {
        vec![CellData::markup(source)]
    }

    fn run(sources: &[&str], edits: Vec<CellEdit>) -> Result<Vec<String>> {
        let mut handles = HandleAllocator::default();
        let mut cells: Vec<Cell> = sources
            .iter()
            .map(|s| handles.adopt(CellData::code(*s, "rust")))
            .collect();
        let mut metadata = NotebookMetadata::default();
        EditBatchApplier::new(&mut cells, &mut metadata, &mut handles).apply(edits)?;
        Ok(cells.iter().map(|c| c.source().to_string()).collect())
    }

    #[test]
    fn test_indices_address_original_document() {
        let result = run(
            &["A", "B", "C", "D"],
            vec![CellEdit::delete(1, 1), CellEdit::insert(3, markup("E"))],
        )
        .unwrap();
        assert_eq!(result, ["A", "C", "E", "D"]);
    }

    #[test]
    fn test_inserts_at_same_index_keep_call_order() {
        let result = run(
            &["A", "B", "C", "D"],
            vec![CellEdit::insert(1, markup("E")), CellEdit::insert(1, markup("F"))],
        )
        .unwrap();
        assert_eq!(result, ["A", "E", "F", "B", "C", "D"]);
    }

    #[test]
    fn test_insert_at_end_of_deleted_range() {
        let result = run(
            &["A", "B", "C", "D"],
            vec![CellEdit::insert(2, markup("E")), CellEdit::delete(1, 1)],
        )
        .unwrap();
        assert_eq!(result, ["A", "E", "C", "D"]);
    }

    #[test]
    fn test_insert_inside_deleted_range_is_rejected() {
        let batch = vec![CellEdit::delete(1, 2), CellEdit::insert(2, markup("E"))];
        assert!(matches!(
            run(&["A", "B", "C", "D"], batch.clone()),
            Err(NotebookError::OverlappingEdits { first: 0, second: 1 })
        ));
        assert!(matches!(
            run(&["A", "B", "C"], batch),
            Err(NotebookError::OverlappingEdits { first: 0, second: 1 })
        ));

        // Either boundary of the deleted range is fine.
        let result = run(
            &["A", "B", "C", "D"],
            vec![CellEdit::delete(1, 2), CellEdit::insert(1, markup("E")), CellEdit::insert(3, markup("F"))],
        )
        .unwrap();
        assert_eq!(result, ["A", "E", "F", "D"]);
    }

    #[test]
    fn test_cell_edit_next_to_delete_targets_original_cell() {
        let mut handles = HandleAllocator::default();
        let mut cells: Vec<Cell> = ["A", "B", "C"]
            .iter()
            .map(|s| handles.adopt(CellData::code(*s, "rust")))
            .collect();
        let mut metadata = NotebookMetadata::default();

        EditBatchApplier::new(&mut cells, &mut metadata, &mut handles)
            .apply(vec![
                CellEdit::delete(0, 1),
                CellEdit::metadata(1, CellMetadata::new().with("tag", "b")),
                CellEdit::insert(1, markup("X")),
            ])
            .unwrap();

        let tagged: Vec<&str> = cells
            .iter()
            .filter(|c| c.metadata().contains_key("tag"))
            .map(Cell::source)
            .collect();
        assert_eq!(tagged, ["B"]);
        let sources: Vec<&str> = cells.iter().map(Cell::source).collect();
        assert_eq!(sources, ["X", "B", "C"]);
    }

    #[test]
    fn test_edits_on_same_cell_keep_call_order() {
        let mut handles = HandleAllocator::default();
        let mut cells = vec![handles.adopt(CellData::code("a", "rust"))];
        let mut metadata = NotebookMetadata::default();

        EditBatchApplier::new(&mut cells, &mut metadata, &mut handles)
            .apply(vec![
                CellEdit::metadata(0, CellMetadata::new().with("x", 1)),
                CellEdit::partial_metadata(0, CellMetadata::new().with("y", 2)),
            ])
            .unwrap();

        assert_eq!(cells[0].metadata(), &CellMetadata::new().with("x", 1).with("y", 2));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(EditBatchApplier::validate(4, &[CellEdit::insert(4, markup("tail"))]).is_ok());
        assert!(matches!(
            EditBatchApplier::validate(4, &[CellEdit::insert(5, markup("x"))]),
            Err(NotebookError::IndexOutOfRange { index: 5, len: 4, .. })
        ));
        assert!(matches!(
            EditBatchApplier::validate(4, &[CellEdit::delete(2, 3)]),
            Err(NotebookError::InvalidRange {
                start: 2,
                count: 3,
                len: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_validate_output_requires_existing_cell() {
        let edits = vec![CellEdit::outputs(1, Vec::new())];
        assert!(EditBatchApplier::validate(1, &edits).is_err());
        assert!(EditBatchApplier::validate(2, &edits).is_ok());

        let edits = vec![CellEdit::metadata(usize::MAX, CellMetadata::new())];
        assert!(EditBatchApplier::validate(1, &edits).is_err());
    }

    #[test]
    fn test_validate_rejects_overlaps() {
        assert!(matches!(
            EditBatchApplier::validate(4, &[CellEdit::delete(0, 2), CellEdit::delete(1, 2)]),
            Err(NotebookError::OverlappingEdits { first: 0, second: 1 })
        ));
        assert!(matches!(
            EditBatchApplier::validate(4, &[CellEdit::outputs(1, Vec::new()), CellEdit::delete(0, 2)]),
            Err(NotebookError::OverlappingEdits { first: 0, second: 1 })
        ));
        assert!(EditBatchApplier::validate(4, &[CellEdit::delete(0, 1), CellEdit::delete(1, 1)]).is_ok());
    }

    #[test]
    fn test_rejected_batch_changes_nothing() {
        let result = run(&["A", "B"], vec![CellEdit::delete(0, 1), CellEdit::outputs(2, Vec::new())]);
        assert!(result.is_err());
    }

    #[test]
    fn test_noop_edits_produce_no_operations() {
        let mut handles = HandleAllocator::default();
        let mut cells = vec![handles.adopt(CellData::code("a", "rust"))];
        let mut metadata = NotebookMetadata::default();

        let operations = EditBatchApplier::new(&mut cells, &mut metadata, &mut handles)
            .apply(vec![
                CellEdit::outputs(0, Vec::new()),
                CellEdit::append_outputs(0, Vec::new()),
                CellEdit::insert(0, Vec::new()),
                CellEdit::partial_metadata(0, CellMetadata::new()),
                CellEdit::DocumentMetadata {
                    metadata: NotebookMetadata::new(),
                },
            ])
            .unwrap();

        assert!(operations.is_empty());
        assert_eq!(cells.len(), 1);
    }
}
