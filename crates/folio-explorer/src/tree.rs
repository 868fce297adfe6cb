//! Explorer tree: items, expansion state, sorting and flattened rows.

use std::cmp::Ordering;

use folio_core::{Emitter, Subscription};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExplorerError, Result};
use crate::filter::{ExplorerFilter, FilterTarget, StateFilter, Visibility};
use crate::item::{TestItem, TestResultState};

/// Sibling order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewSorting {
    #[default]
    ByLocation,
    ByName,
}

/// How items are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    /// Items nested under their parents.
    #[default]
    Tree,
    /// Leaf tests only, flat.
    List,
}

/// What changed in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerChange {
    /// Items were added or removed.
    Structure,
    /// Result state or retired flag of one item.
    State(String),
    Expansion,
    Filter,
    Sorting,
    ViewMode,
    /// An item was revealed and focused.
    Revealed(String),
}

/// Result of a reveal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Revealed,
    /// The target is not in the tree yet. The request is retried as items
    /// arrive.
    Pending,
}

/// One visible line of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: String,
    pub depth: usize,
    pub label: String,
    pub state: TestResultState,
    pub expanded: bool,
    pub has_children: bool,
}

#[derive(Debug)]
struct Node {
    item: TestItem,
    parent: Option<String>,
    children: Vec<String>,
    own_state: TestResultState,
    retired: bool,
    expanded: bool,
}

/// Headless model of a hierarchical test explorer.
#[derive(Debug, Default)]
pub struct ExplorerTree {
    nodes: FxHashMap<String, Node>,
    roots: Vec<String>,
    filter: ExplorerFilter,
    sorting: ViewSorting,
    view_mode: ViewMode,
    focused: Option<String>,
    pending_reveal: Option<Vec<String>>,
    on_did_change: Emitter<ExplorerChange>,
}

/// Aggregate states and visibility of every node, computed once per
/// `rows()` call.
#[derive(Debug, Default)]
struct Layout<'a> {
    states: FxHashMap<&'a str, TestResultState>,
    shown: FxHashMap<&'a str, bool>,
    /// Shown leaves with no hidden ancestor, in tree order.
    leaves: Vec<&'a str>,
}

impl Layout<'_> {
    fn state(&self, id: &str) -> TestResultState {
        self.states.get(id).copied().unwrap_or_default()
    }

    fn shown(&self, id: &str) -> bool {
        self.shown.get(id).copied().unwrap_or(false)
    }
}

impl ExplorerTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn item(&self, id: &str) -> Option<&TestItem> {
        self.nodes.get(id).map(|node| &node.item)
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|node| node.parent.as_deref())
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn sorting(&self) -> ViewSorting {
        self.sorting
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn filter(&self) -> &ExplorerFilter {
        &self.filter
    }

    /// Register a change listener.
    pub fn on_did_change(&self, listener: impl FnMut(&ExplorerChange) + 'static) -> Subscription {
        self.on_did_change.subscribe(listener)
    }

    /// Add `item` under `parent`, or as a root.
    pub fn insert(&mut self, parent: Option<&str>, item: TestItem) -> Result<()> {
        if self.nodes.contains_key(&item.id) {
            return Err(ExplorerError::DuplicateItem(item.id));
        }
        match parent {
            Some(parent_id) => self
                .nodes
                .get_mut(parent_id)
                .ok_or_else(|| ExplorerError::UnknownItem(parent_id.to_string()))?
                .children
                .push(item.id.clone()),
            None => self.roots.push(item.id.clone()),
        }

        let id = item.id.clone();
        self.nodes.insert(
            id.clone(),
            Node {
                item,
                parent: parent.map(str::to_string),
                children: Vec::new(),
                own_state: TestResultState::Unset,
                retired: false,
                expanded: false,
            },
        );
        debug!(id = %id, "inserted test item");
        self.on_did_change.fire(&ExplorerChange::Structure);

        if let Some(path) = self.pending_reveal.take() {
            self.reveal(path.as_slice());
        }
        Ok(())
    }

    /// Remove an item and its whole subtree.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| ExplorerError::UnknownItem(id.to_string()))?;

        match node.parent.as_deref().and_then(|p| self.nodes.get_mut(p)) {
            Some(parent) => parent.children.retain(|child| child != id),
            None => self.roots.retain(|root| root != id),
        }

        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                stack.extend(removed.children);
            }
        }

        if self.focused.as_deref().is_some_and(|f| !self.nodes.contains_key(f)) {
            self.focused = None;
        }
        debug!(id, "removed test item");
        self.on_did_change.fire(&ExplorerChange::Structure);
        Ok(())
    }

    /// Record the latest result of one item.
    pub fn set_state(&mut self, id: &str, state: TestResultState) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.own_state == state {
            return Ok(());
        }
        node.own_state = state;
        self.on_did_change.fire(&ExplorerChange::State(id.to_string()));
        Ok(())
    }

    /// Mark an item's result as outdated.
    pub fn set_retired(&mut self, id: &str, retired: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.retired == retired {
            return Ok(());
        }
        node.retired = retired;
        self.on_did_change.fire(&ExplorerChange::State(id.to_string()));
        Ok(())
    }

    pub fn own_state(&self, id: &str) -> Result<TestResultState> {
        Ok(self.node(id)?.own_state)
    }

    /// The highest-priority state among the item and its descendants.
    pub fn state(&self, id: &str) -> Result<TestResultState> {
        let node = self.node(id)?;
        Ok(self.aggregate_state(node))
    }

    pub fn is_retired(&self, id: &str) -> Result<bool> {
        Ok(self.node(id)?.retired)
    }

    pub fn is_expanded(&self, id: &str) -> Result<bool> {
        Ok(self.node(id)?.expanded)
    }

    /// Expand one item, or with `deep` its whole subtree.
    pub fn expand(&mut self, id: &str, deep: bool) -> Result<()> {
        self.node_mut(id)?.expanded = true;
        if deep {
            let mut stack = self.node(id)?.children.clone();
            while let Some(child) = stack.pop() {
                if let Some(node) = self.nodes.get_mut(&child) {
                    node.expanded = true;
                    stack.extend(node.children.iter().cloned());
                }
            }
        }
        self.on_did_change.fire(&ExplorerChange::Expansion);
        Ok(())
    }

    pub fn collapse(&mut self, id: &str) -> Result<()> {
        self.node_mut(id)?.expanded = false;
        self.on_did_change.fire(&ExplorerChange::Expansion);
        Ok(())
    }

    pub fn collapse_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.expanded = false;
        }
        self.on_did_change.fire(&ExplorerChange::Expansion);
    }

    /// Show and focus the last item of `id_path`, a root-first chain of ids.
    ///
    /// Every known ancestor on the path is expanded. If the target is
    /// excluded, or sits under an excluded item, excluded items are shown.
    /// An empty path cancels a pending reveal.
    pub fn reveal<S: AsRef<str>>(&mut self, id_path: &[S]) -> RevealOutcome {
        let path: Vec<String> = id_path.iter().map(|s| s.as_ref().to_string()).collect();
        let Some(target) = path.last().cloned() else {
            self.pending_reveal = None;
            return RevealOutcome::Revealed;
        };

        if !self.nodes.contains_key(&target) {
            // Open the deepest known ancestor so its children can load.
            let known = path[..path.len() - 1]
                .iter()
                .rev()
                .find(|id| self.nodes.contains_key(id.as_str()))
                .cloned();
            if let Some(known) = known {
                self.expand_with_ancestors(&known);
                self.on_did_change.fire(&ExplorerChange::Expansion);
            }
            debug!(target = %target, "reveal pending");
            self.pending_reveal = Some(path);
            return RevealOutcome::Pending;
        }

        if let Some(parent) = self.parent(&target).map(str::to_string) {
            self.expand_with_ancestors(&parent);
        }
        if self.ancestors_and_self(&target).any(|id| self.filter.is_excluded(id)) {
            self.filter.set_show_excluded(true);
        }
        self.pending_reveal = None;
        self.focused = Some(target.clone());
        self.on_did_change.fire(&ExplorerChange::Revealed(target));
        RevealOutcome::Revealed
    }

    pub fn has_pending_reveal(&self) -> bool {
        self.pending_reveal.is_some()
    }

    pub fn set_sorting(&mut self, sorting: ViewSorting) {
        if self.sorting == sorting {
            return;
        }
        self.sorting = sorting;
        self.on_did_change.fire(&ExplorerChange::Sorting);
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode == mode {
            return;
        }
        self.view_mode = mode;
        debug!(?mode, "view mode changed");
        self.on_did_change.fire(&ExplorerChange::ViewMode);
    }

    pub fn set_filter_text(&mut self, text: impl Into<String>) {
        self.filter.set_text(text);
        self.on_did_change.fire(&ExplorerChange::Filter);
    }

    pub fn set_state_filter(&mut self, state: StateFilter) {
        self.filter.set_state(state);
        self.on_did_change.fire(&ExplorerChange::Filter);
    }

    pub fn set_location_filter(&mut self, uri: Option<String>) {
        self.filter.set_location(uri);
        self.on_did_change.fire(&ExplorerChange::Filter);
    }

    pub fn set_excluded(&mut self, id: &str, excluded: bool) -> Result<()> {
        self.node(id)?;
        if self.filter.set_excluded(id, excluded) {
            self.on_did_change.fire(&ExplorerChange::Filter);
        }
        Ok(())
    }

    pub fn set_show_excluded(&mut self, show: bool) {
        self.filter.set_show_excluded(show);
        self.on_did_change.fire(&ExplorerChange::Filter);
    }

    /// Filter verdict for one item, before descendants are considered.
    pub fn visibility(&self, id: &str) -> Result<Visibility> {
        self.node(id)?;
        let chain: Vec<FilterTarget<'_>> = self
            .ancestors_and_self(id)
            .filter_map(|id| self.nodes.get(id))
            .map(|node| FilterTarget {
                id: &node.item.id,
                label: &node.item.label,
                uri: node.item.uri.as_deref(),
                own_state: node.own_state,
            })
            .collect();
        Ok(self.filter.visibility(&chain))
    }

    /// Whether the item shows up in `rows()` when its ancestors are expanded.
    pub fn is_shown(&self, id: &str) -> Result<bool> {
        self.node(id)?;
        if self.ancestors_and_self(id).skip(1).any(|a| matches!(self.visibility(a), Ok(Visibility::Hidden))) {
            return Ok(false);
        }
        Ok(self.measure(id, false, &mut Layout::default()).1)
    }

    /// Visible rows in sort order.
    ///
    /// In `ViewMode::Tree` rows come depth first and children of collapsed
    /// items are skipped. In `ViewMode::List` every shown leaf test is one
    /// row at depth 0.
    pub fn rows(&self) -> Vec<Row> {
        let mut layout = Layout::default();
        for root in &self.roots {
            self.measure(root, false, &mut layout);
        }

        match self.view_mode {
            ViewMode::Tree => {
                let mut rows = Vec::new();
                for id in self.sorted(&self.roots, &layout) {
                    self.push_rows(id, 0, &layout, &mut rows);
                }
                rows
            }
            ViewMode::List => {
                let mut leaves = layout.leaves.clone();
                self.sort_ids(&mut leaves, &layout);
                leaves
                    .into_iter()
                    .filter_map(|id| self.nodes.get(id))
                    .map(|node| Row {
                        id: node.item.id.clone(),
                        depth: 0,
                        label: node.item.label.clone(),
                        state: layout.state(&node.item.id),
                        expanded: false,
                        has_children: false,
                    })
                    .collect()
            }
        }
    }

    /// Screen-reader label: `"{label} ({state})"`, noting outdated results.
    pub fn accessible_label(&self, id: &str) -> Result<String> {
        let node = self.node(id)?;
        let state = self.aggregate_state(node);
        let mut label = format!("{} ({})", node.item.label, state.display_name());
        if node.retired {
            label.push_str(", outdated result");
        }
        Ok(label)
    }

    /// Sibling comparator for the current `ViewSorting`.
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering> {
        let (a, b) = (self.node(a)?, self.node(b)?);
        Ok(self.compare_nodes(a, b))
    }

    fn compare_nodes(&self, a: &Node, b: &Node) -> Ordering {
        self.compare_with_states(a, self.aggregate_state(a), b, self.aggregate_state(b))
    }

    fn compare_with_states(&self, a: &Node, state_a: TestResultState, b: &Node, state_b: TestResultState) -> Ordering {
        let delta = state_a.cmp_priority(state_b);
        if delta != Ordering::Equal {
            return delta;
        }

        if self.sorting == ViewSorting::ByLocation && a.item.uri.is_some() && a.item.uri == b.item.uri {
            if let (Some(ra), Some(rb)) = (a.item.range, b.item.range) {
                let delta = ra.start_line.cmp(&rb.start_line);
                if delta != Ordering::Equal {
                    return delta;
                }
            }
        }

        a.item
            .label
            .to_lowercase()
            .cmp(&b.item.label.to_lowercase())
            .then_with(|| a.item.label.cmp(&b.item.label))
    }

    fn push_rows(&self, id: &str, depth: usize, layout: &Layout<'_>, rows: &mut Vec<Row>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !layout.shown(id) {
            return;
        }

        let visible_children: Vec<&str> = self
            .sorted(&node.children, layout)
            .into_iter()
            .filter(|child| layout.shown(child))
            .collect();

        rows.push(Row {
            id: id.to_string(),
            depth,
            label: node.item.label.clone(),
            state: layout.state(id),
            expanded: node.expanded,
            has_children: !visible_children.is_empty(),
        });

        if node.expanded {
            for child in visible_children {
                self.push_rows(child, depth + 1, layout, rows);
            }
        }
    }

    /// Record the aggregate state and visibility of `id` and its subtree.
    /// Returns the aggregate state and whether `id` shows up below a shown
    /// parent.
    fn measure<'a>(&'a self, id: &'a str, under_hidden: bool, layout: &mut Layout<'a>) -> (TestResultState, bool) {
        let Some(node) = self.nodes.get(id) else {
            return (TestResultState::Unset, false);
        };
        let visibility = self.visibility(id).unwrap_or(Visibility::Hidden);
        let hidden_below = under_hidden || visibility == Visibility::Hidden;

        let mut state = node.own_state;
        let mut child_shown = false;
        for child in &node.children {
            let (child_state, shown) = self.measure(child, hidden_below, layout);
            state = state.max_priority(child_state);
            child_shown |= shown;
        }

        let shown = match visibility {
            Visibility::Hidden => false,
            Visibility::Visible => true,
            Visibility::Recurse => child_shown,
        };
        if shown && !under_hidden && node.children.is_empty() {
            layout.leaves.push(id);
        }
        layout.states.insert(id, state);
        layout.shown.insert(id, shown);
        (state, shown)
    }

    fn sorted<'a>(&self, ids: &'a [String], layout: &Layout<'_>) -> Vec<&'a str> {
        let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.sort_ids(&mut sorted, layout);
        sorted
    }

    fn sort_ids(&self, ids: &mut [&str], layout: &Layout<'_>) {
        ids.sort_by(|a, b| match (self.nodes.get(*a), self.nodes.get(*b)) {
            (Some(na), Some(nb)) => self.compare_with_states(na, layout.state(a), nb, layout.state(b)),
            _ => Ordering::Equal,
        });
    }

    fn aggregate_state(&self, node: &Node) -> TestResultState {
        node.children
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .fold(node.own_state, |state, child| state.max_priority(self.aggregate_state(child)))
    }

    fn expand_with_ancestors(&mut self, id: &str) {
        let chain: Vec<String> = self.ancestors_and_self(id).map(str::to_string).collect();
        for id in chain {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.expanded = true;
            }
        }
    }

    fn ancestors_and_self<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::successors(Some(id), move |current| self.parent(current))
    }

    fn node(&self, id: &str) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| ExplorerError::UnknownItem(id.to_string()))
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| ExplorerError::UnknownItem(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ExplorerTree {
        let mut tree = ExplorerTree::new();
        tree.insert(None, TestItem::new("suite", "Suite").with_uri("file:///a.rs"))
            .unwrap();
        tree.insert(Some("suite"), TestItem::new("suite/b", "beta").with_uri("file:///a.rs").with_range(20, 25))
            .unwrap();
        tree.insert(Some("suite"), TestItem::new("suite/a", "alpha").with_uri("file:///a.rs").with_range(10, 15))
            .unwrap();
        tree
    }

    fn ids(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_insert_rejects_duplicates_and_unknown_parents() {
        let mut tree = tree();
        assert_eq!(
            tree.insert(None, TestItem::new("suite", "again")),
            Err(ExplorerError::DuplicateItem("suite".to_string()))
        );
        assert_eq!(
            tree.insert(Some("nope"), TestItem::new("x", "x")),
            Err(ExplorerError::UnknownItem("nope".to_string()))
        );
    }

    #[test]
    fn test_rows_respect_expansion() {
        let mut tree = tree();
        assert_eq!(ids(&tree.rows()), ["suite"]);
        assert!(tree.rows()[0].has_children);

        tree.expand("suite", false).unwrap();
        let rows = tree.rows();
        assert_eq!(ids(&rows), ["suite", "suite/a", "suite/b"]);
        assert_eq!(rows[1].depth, 1);

        tree.collapse_all();
        assert_eq!(tree.rows().len(), 1);
    }

    #[test]
    fn test_sort_by_location_then_name() {
        let mut tree = tree();
        tree.expand("suite", false).unwrap();
        tree.set_sorting(ViewSorting::ByName);
        assert_eq!(ids(&tree.rows()), ["suite", "suite/a", "suite/b"]);

        tree.insert(Some("suite"), TestItem::new("suite/c", "Gamma").with_uri("file:///a.rs").with_range(1, 2))
            .unwrap();
        assert_eq!(ids(&tree.rows()), ["suite", "suite/a", "suite/b", "suite/c"]);

        tree.set_sorting(ViewSorting::ByLocation);
        assert_eq!(ids(&tree.rows()), ["suite", "suite/c", "suite/a", "suite/b"]);
    }

    #[test]
    fn test_state_priority_sorts_first() {
        let mut tree = tree();
        tree.expand("suite", false).unwrap();
        tree.set_state("suite/b", TestResultState::Failed).unwrap();
        assert_eq!(ids(&tree.rows()), ["suite", "suite/b", "suite/a"]);
        assert_eq!(tree.state("suite").unwrap(), TestResultState::Failed);
        assert_eq!(tree.own_state("suite").unwrap(), TestResultState::Unset);
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = tree();
        tree.reveal(&["suite", "suite/a"]);
        assert_eq!(tree.focused(), Some("suite/a"));

        tree.remove("suite").unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.focused(), None);
        assert!(tree.rows().is_empty());
    }

    #[test]
    fn test_recurse_parent_shown_through_child() {
        let mut tree = tree();
        tree.expand("suite", false).unwrap();
        tree.set_filter_text("alpha");
        assert_eq!(tree.visibility("suite").unwrap(), Visibility::Recurse);
        assert_eq!(ids(&tree.rows()), ["suite", "suite/a"]);

        tree.set_filter_text("nothing matches");
        assert!(tree.rows().is_empty());
    }

    #[test]
    fn test_list_mode_flattens_leaves() {
        let mut tree = tree();
        tree.set_view_mode(ViewMode::List);
        let rows = tree.rows();
        assert_eq!(ids(&rows), ["suite/a", "suite/b"]);
        assert!(rows.iter().all(|r| r.depth == 0 && !r.has_children));

        tree.set_view_mode(ViewMode::Tree);
        assert_eq!(ids(&tree.rows()), ["suite"]);
    }

    #[test]
    fn test_rows_on_deep_chain() {
        let mut tree = ExplorerTree::new();
        tree.insert(None, TestItem::new("n0", "level 0")).unwrap();
        for i in 1..300 {
            let parent = format!("n{}", i - 1);
            tree.insert(Some(&parent), TestItem::new(format!("n{}", i), format!("level {}", i)))
                .unwrap();
        }
        tree.expand("n0", true).unwrap();
        tree.set_state("n299", TestResultState::Failed).unwrap();
        tree.set_filter_text("level 299");

        let rows = tree.rows();
        assert_eq!(rows.len(), 300);
        assert_eq!(rows[299].depth, 299);
        assert!(rows.iter().all(|r| r.state == TestResultState::Failed));
    }

    #[test]
    fn test_is_shown_follows_descendants() {
        let mut tree = tree();
        tree.set_filter_text("beta");
        assert!(tree.is_shown("suite").unwrap());
        assert!(tree.is_shown("suite/b").unwrap());
        assert!(!tree.is_shown("suite/a").unwrap());
    }

    #[test]
    fn test_accessible_label() {
        let mut tree = tree();
        tree.set_state("suite/a", TestResultState::Passed).unwrap();
        assert_eq!(tree.accessible_label("suite/a").unwrap(), "alpha (Passed)");
        assert_eq!(tree.accessible_label("suite/b").unwrap(), "beta (Not yet run)");

        tree.set_retired("suite/a", true).unwrap();
        assert_eq!(tree.accessible_label("suite/a").unwrap(), "alpha (Passed), outdated result");
    }
}
