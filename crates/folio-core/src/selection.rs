//! Selection state recorded alongside edit batches.

use serde::{Deserialize, Serialize};

use crate::cell::CellHandle;

/// Half-open range of cell indices, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: usize,
    pub end: usize,
}

impl CellRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Range covering exactly one cell.
    pub fn single(index: usize) -> Self {
        Self::new(index, index + 1)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }
}

/// Focused and selected cells, either by position or by identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionState {
    Index {
        focus: CellRange,
        selections: Vec<CellRange>,
    },
    Handle {
        primary: Option<CellHandle>,
        selections: Vec<CellHandle>,
    },
}

impl SelectionState {
    /// Single focused range that is also the only selection.
    pub fn focus(range: CellRange) -> Self {
        Self::Index {
            focus: range,
            selections: vec![range],
        }
    }

    /// Index selections, if this is an index-based state.
    pub fn index_selections(&self) -> Option<&[CellRange]> {
        match self {
            Self::Index { selections, .. } => Some(selections),
            Self::Handle { .. } => None,
        }
    }
}
