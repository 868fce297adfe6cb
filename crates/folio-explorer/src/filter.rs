//! Visibility rules for explorer nodes.
//!
//! Three independent checks run per node: the text filter, the location
//! filter and the state filter. Each yields a `FilterResult`; the lowest of
//! the three decides the node's `Visibility`.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::item::TestResultState;

/// Per-check verdict, ordered `Exclude < Inherit < Include`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterResult {
    Exclude,
    Inherit,
    Include,
}

/// Combined verdict for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Hidden with its whole subtree.
    Hidden,
    /// Shown only if some descendant is shown.
    Recurse,
    Visible,
}

impl From<FilterResult> for Visibility {
    fn from(result: FilterResult) -> Self {
        match result {
            FilterResult::Exclude => Self::Hidden,
            FilterResult::Inherit => Self::Recurse,
            FilterResult::Include => Self::Visible,
        }
    }
}

/// Which results to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateFilter {
    #[default]
    All,
    OnlyExecuted,
    OnlyFailed,
}

/// What the filter needs to know about one node.
#[derive(Debug, Clone, Copy)]
pub struct FilterTarget<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub uri: Option<&'a str>,
    pub own_state: TestResultState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pattern {
    include: bool,
    needle: String,
}

/// Filter state for an explorer tree.
#[derive(Debug, Clone, Default)]
pub struct ExplorerFilter {
    text: String,
    patterns: Vec<Pattern>,
    state: StateFilter,
    location: Option<String>,
    excluded: FxHashSet<String>,
    show_excluded: bool,
}

impl ExplorerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Set the text filter: comma-separated patterns, `!` negates.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.patterns = split_patterns(self.text.trim())
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| match p.strip_prefix('!') {
                Some(rest) => Pattern {
                    include: false,
                    needle: rest.to_lowercase(),
                },
                None => Pattern {
                    include: true,
                    needle: p.to_lowercase(),
                },
            })
            .collect();
    }

    pub fn state(&self) -> StateFilter {
        self.state
    }

    pub fn set_state(&mut self, state: StateFilter) {
        self.state = state;
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Restrict the tree to items of one document, or lift the restriction.
    pub fn set_location(&mut self, uri: Option<String>) {
        self.location = uri;
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded.contains(id)
    }

    /// Returns whether the set changed.
    pub fn set_excluded(&mut self, id: &str, excluded: bool) -> bool {
        if excluded {
            self.excluded.insert(id.to_string())
        } else {
            self.excluded.remove(id)
        }
    }

    pub fn show_excluded(&self) -> bool {
        self.show_excluded
    }

    pub fn set_show_excluded(&mut self, show: bool) {
        self.show_excluded = show;
    }

    /// Decide the visibility of `chain[0]`, where the rest of `chain` are its
    /// ancestors from nearest to root.
    pub fn visibility(&self, chain: &[FilterTarget<'_>]) -> Visibility {
        let Some(element) = chain.first() else {
            return Visibility::Hidden;
        };

        if !self.show_excluded && self.excluded.contains(element.id) {
            return Visibility::Hidden;
        }

        self.text_result(chain)
            .min(self.location_result(chain))
            .min(self.state_result(element))
            .into()
    }

    fn state_result(&self, element: &FilterTarget<'_>) -> FilterResult {
        let matched = match self.state {
            StateFilter::All => true,
            StateFilter::OnlyExecuted => element.own_state != TestResultState::Unset,
            StateFilter::OnlyFailed => element.own_state.is_failed(),
        };
        if matched {
            FilterResult::Include
        } else {
            FilterResult::Inherit
        }
    }

    fn location_result(&self, chain: &[FilterTarget<'_>]) -> FilterResult {
        let Some(location) = self.location.as_deref() else {
            return FilterResult::Include;
        };

        // Items without a uri take their document from the nearest ancestor.
        match chain.iter().find_map(|e| e.uri) {
            Some(uri) if uri == location => FilterResult::Include,
            Some(_) => FilterResult::Exclude,
            None => FilterResult::Inherit,
        }
    }

    fn text_result(&self, chain: &[FilterTarget<'_>]) -> FilterResult {
        let Some(first) = self.patterns.first() else {
            return FilterResult::Include;
        };

        let initial = if first.include {
            FilterResult::Inherit
        } else {
            FilterResult::Include
        };

        for element in chain {
            let label = element.label.to_lowercase();
            let mut result = initial;
            for pattern in &self.patterns {
                if label.contains(&pattern.needle) {
                    result = if pattern.include {
                        FilterResult::Include
                    } else {
                        FilterResult::Exclude
                    };
                }
            }
            if result != FilterResult::Inherit {
                return result;
            }
        }

        FilterResult::Inherit
    }
}

/// Split on commas that are not inside `{}` or `[]` groups.
fn split_patterns(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
