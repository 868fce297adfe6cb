//! Test items and result states.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Line span of a test in its source file. Lines are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: u32,
}

impl LineRange {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self { start_line, end_line }
    }
}

/// A node in the explorer: a test, a suite or a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestItem {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<LineRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TestItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            uri: None,
            range: None,
            description: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_range(mut self, start_line: u32, end_line: u32) -> Self {
        self.range = Some(LineRange::new(start_line, end_line));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Outcome of the most recent run of a test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResultState {
    #[default]
    Unset,
    Queued,
    Running,
    Passed,
    Failed,
    Skipped,
    Errored,
}

impl TestResultState {
    /// Name shown to the user.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Unset => "Not yet run",
            Self::Queued => "Queued",
            Self::Running => "Running",
            Self::Passed => "Passed",
            Self::Failed => "Failed",
            Self::Skipped => "Skipped",
            Self::Errored => "Errored",
        }
    }

    /// Weight used when sorting and when rolling child states up to a parent.
    pub fn priority(self) -> u8 {
        match self {
            Self::Running => 6,
            Self::Errored => 5,
            Self::Failed => 4,
            Self::Queued => 3,
            Self::Passed => 2,
            Self::Skipped => 1,
            Self::Unset => 0,
        }
    }

    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed | Self::Errored)
    }

    /// The state with the higher priority.
    pub fn max_priority(self, other: Self) -> Self {
        if other.priority() > self.priority() { other } else { self }
    }

    /// Orders higher-priority states first.
    pub fn cmp_priority(self, other: Self) -> Ordering {
        other.priority().cmp(&self.priority())
    }
}

impl fmt::Display for TestResultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
