//! Document configuration.

use crate::undo::DEFAULT_MAX_UNDO_HISTORY;

/// Options fixed when a document is created.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    /// Number of batches kept on the undo stack.
    pub max_undo_history: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            max_undo_history: DEFAULT_MAX_UNDO_HISTORY,
        }
    }
}
