//! Headless test explorer model.
//!
//! This crate provides:
//! - A tree of test items with per-item result state
//! - Text, state, location and exclusion filters
//! - Sorting by aggregated state, location and name
//! - Flattened rows for rendering, with accessible labels
//!
//! Changes are announced through the same `Emitter`/`Subscription` pair
//! the notebook document uses.

pub mod error;
pub mod filter;
pub mod item;
pub mod tree;

pub use error::{ExplorerError, Result};
pub use filter::{ExplorerFilter, FilterResult, FilterTarget, StateFilter, Visibility};
pub use item::{LineRange, TestItem, TestResultState};
pub use tree::{ExplorerChange, ExplorerTree, RevealOutcome, Row, ViewMode, ViewSorting};
