//! Error types for folio-explorer.

use thiserror::Error;

/// Result type for explorer operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Errors that can occur while manipulating an explorer tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExplorerError {
    /// No item with this id is in the tree.
    #[error("unknown test item: {0}")]
    UnknownItem(String),

    /// An item with this id is already in the tree.
    #[error("duplicate test item: {0}")]
    DuplicateItem(String),
}
