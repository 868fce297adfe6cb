//! Reversible cell operations.
//!
//! Every observable edit is recorded as a `CellOperation` holding both the
//! old and the new state, so the same record can be replayed forward (redo)
//! or backward (undo) and can describe itself as a `RawChange`.

use crate::cell::{Cell, CellHandle};
use crate::event::RawChange;
use crate::metadata::{CellMetadata, NotebookMetadata};
use crate::output::CellOutput;

/// Which way to replay an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// An applied edit with enough state to reverse it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOperation {
    /// Cells removed and inserted at `index`.
    Splice {
        index: usize,
        removed: Vec<Cell>,
        inserted: Vec<Cell>,
    },

    /// Outputs of one cell changed.
    Outputs {
        index: usize,
        handle: CellHandle,
        before: Vec<CellOutput>,
        after: Vec<CellOutput>,
        append: bool,
    },

    /// Metadata of one cell changed.
    Metadata {
        index: usize,
        handle: CellHandle,
        before: CellMetadata,
        after: CellMetadata,
    },

    /// Source text of one cell changed.
    Content {
        index: usize,
        handle: CellHandle,
        before: String,
        after: String,
    },

    /// Document-level metadata changed.
    DocumentMetadata {
        before: NotebookMetadata,
        after: NotebookMetadata,
    },
}

impl CellOperation {
    /// Replay this operation against `cells`.
    ///
    /// The sequence must be in the state this operation was recorded
    /// against (forward) or produced (backward).
    pub(crate) fn apply(&self, cells: &mut Vec<Cell>, metadata: &mut NotebookMetadata, direction: Direction) {
        match (self, direction) {
            (Self::Splice { index, removed, inserted }, Direction::Forward) => {
                cells.splice(*index..*index + removed.len(), inserted.iter().cloned());
            }
            (Self::Splice { index, removed, inserted }, Direction::Backward) => {
                cells.splice(*index..*index + inserted.len(), removed.iter().cloned());
            }
            (Self::Outputs { index, before, after, .. }, direction) => {
                let outputs = pick(direction, before, after);
                cells[*index].set_outputs(outputs.clone());
            }
            (Self::Metadata { index, before, after, .. }, direction) => {
                let value = pick(direction, before, after);
                cells[*index].set_metadata(value.clone());
            }
            (Self::Content { index, before, after, .. }, direction) => {
                let source = pick(direction, before, after);
                cells[*index].set_source(source.clone());
            }
            (Self::DocumentMetadata { before, after }, direction) => {
                *metadata = pick(direction, before, after).clone();
            }
        }
    }

    /// The change record produced by replaying in `direction`.
    pub fn raw_change(&self, direction: Direction) -> RawChange {
        match (self, direction) {
            (Self::Splice { index, removed, inserted }, Direction::Forward) => RawChange::ModelChange {
                index: *index,
                delete_count: removed.len(),
                inserted: inserted.iter().map(Cell::handle).collect(),
            },
            (Self::Splice { index, removed, inserted }, Direction::Backward) => RawChange::ModelChange {
                index: *index,
                delete_count: inserted.len(),
                inserted: removed.iter().map(Cell::handle).collect(),
            },
            (Self::Outputs { index, handle, before, after, append }, Direction::Forward) => {
                let outputs = if *append {
                    after[before.len()..].to_vec()
                } else {
                    after.clone()
                };
                RawChange::Output {
                    index: *index,
                    handle: *handle,
                    outputs,
                    append: *append,
                }
            }
            (Self::Outputs { index, handle, before, .. }, Direction::Backward) => RawChange::Output {
                index: *index,
                handle: *handle,
                outputs: before.clone(),
                append: false,
            },
            (Self::Metadata { index, handle, before, after }, direction) => RawChange::Metadata {
                index: *index,
                handle: *handle,
                metadata: pick(direction, before, after).clone(),
            },
            (Self::Content { index, handle, .. }, _) => RawChange::Content {
                index: *index,
                handle: *handle,
            },
            (Self::DocumentMetadata { before, after }, direction) => RawChange::DocumentMetadata {
                metadata: pick(direction, before, after).clone(),
            },
        }
    }

    /// Whether replaying this operation shifts cell positions.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Splice { .. })
    }

    /// Human-readable summary, used for undo labels.
    pub fn describe(&self) -> String {
        match self {
            Self::Splice { index, removed, inserted } => match (removed.len(), inserted.len()) {
                (0, n) => format!("Insert {} at {}", plural(n), index),
                (n, 0) => format!("Delete {} at {}", plural(n), index),
                (r, i) => format!("Replace {} with {} at {}", plural(r), plural(i), index),
            },
            Self::Outputs { index, append: true, .. } => format!("Append outputs to cell {}", index),
            Self::Outputs { index, .. } => format!("Replace outputs of cell {}", index),
            Self::Metadata { index, .. } => format!("Change metadata of cell {}", index),
            Self::Content { index, .. } => format!("Edit cell {}", index),
            Self::DocumentMetadata { .. } => "Change notebook metadata".to_string(),
        }
    }
}

fn pick<'a, T>(direction: Direction, before: &'a T, after: &'a T) -> &'a T {
    match direction {
        Direction::Forward => after,
        Direction::Backward => before,
    }
}

fn plural(n: usize) -> String {
    if n == 1 {
        "1 cell".to_string()
    } else {
        format!("{} cells", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellData, HandleAllocator};

    fn cells(sources: &[&str]) -> (HandleAllocator, Vec<Cell>) {
        let mut handles = HandleAllocator::default();
        let cells = sources
            .iter()
            .map(|s| handles.adopt(CellData::code(*s, "rust")))
            .collect();
        (handles, cells)
    }

    fn sources(cells: &[Cell]) -> Vec<&str> {
        cells.iter().map(Cell::source).collect()
    }

    #[test]
    fn test_splice_round_trip() {
        let (mut handles, mut list) = cells(&["a", "b", "c"]);
        let mut metadata = NotebookMetadata::default();
        let op = CellOperation::Splice {
            index: 1,
            removed: vec![list[1].clone()],
            inserted: vec![handles.adopt(CellData::code("x", "rust")), handles.adopt(CellData::code("y", "rust"))],
        };

        op.apply(&mut list, &mut metadata, Direction::Forward);
        assert_eq!(sources(&list), ["a", "x", "y", "c"]);

        op.apply(&mut list, &mut metadata, Direction::Backward);
        assert_eq!(sources(&list), ["a", "b", "c"]);
    }

    #[test]
    fn test_content_round_trip() {
        let (_, mut list) = cells(&["a"]);
        let mut metadata = NotebookMetadata::default();
        let op = CellOperation::Content {
            index: 0,
            handle: list[0].handle(),
            before: "a".to_string(),
            after: "b".to_string(),
        };

        op.apply(&mut list, &mut metadata, Direction::Forward);
        assert_eq!(sources(&list), ["b"]);

        op.apply(&mut list, &mut metadata, Direction::Backward);
        assert_eq!(sources(&list), ["a"]);
    }

    #[test]
    fn test_append_raw_change_carries_only_new_outputs() {
        let first = CellOutput::text("1", "text/plain", "one");
        let second = CellOutput::text("2", "text/plain", "two");
        let op = CellOperation::Outputs {
            index: 0,
            handle: CellHandle::new(0),
            before: vec![first.clone()],
            after: vec![first.clone(), second.clone()],
            append: true,
        };

        match op.raw_change(Direction::Forward) {
            RawChange::Output { outputs, append, .. } => {
                assert!(append);
                assert_eq!(outputs, vec![second]);
            }
            other => panic!("Expected Output, got {:?}", other),
        }
        match op.raw_change(Direction::Backward) {
            RawChange::Output { outputs, append, .. } => {
                assert!(!append);
                assert_eq!(outputs, vec![first]);
            }
            other => panic!("Expected Output, got {:?}", other),
        }
    }

    #[test]
    fn test_describe() {
        let (_, list) = cells(&["a", "b"]);
        let op = CellOperation::Splice {
            index: 0,
            removed: list,
            inserted: Vec::new(),
        };
        assert_eq!(op.describe(), "Delete 2 cells at 0");
        assert!(op.is_structural());
    }
}
