//! Integration tests for the explorer tree.

use std::cell::RefCell;
use std::rc::Rc;

use folio_explorer::{
    ExplorerChange, ExplorerError, ExplorerTree, RevealOutcome, StateFilter, TestItem, TestResultState, ViewMode,
};

fn ids(tree: &ExplorerTree) -> Vec<String> {
    tree.rows().into_iter().map(|row| row.id).collect()
}

/// Two files with a suite each.
fn workspace() -> ExplorerTree {
    let mut tree = ExplorerTree::new();
    tree.insert(None, TestItem::new("math", "math.rs").with_uri("file:///math.rs"))
        .unwrap();
    tree.insert(Some("math"), TestItem::new("math/add", "adds numbers").with_uri("file:///math.rs").with_range(4, 8))
        .unwrap();
    tree.insert(Some("math"), TestItem::new("math/div", "divides numbers").with_uri("file:///math.rs").with_range(10, 14))
        .unwrap();
    tree.insert(None, TestItem::new("io", "io.rs").with_uri("file:///io.rs"))
        .unwrap();
    tree.insert(Some("io"), TestItem::new("io/read", "reads file").with_uri("file:///io.rs").with_range(2, 6))
        .unwrap();
    tree.insert(Some("io/read"), TestItem::new("io/read/slow", "slow disk").with_uri("file:///io.rs").with_range(3, 4))
        .unwrap();
    tree
}

#[test]
fn test_deep_expand_shows_every_row() {
    let mut tree = workspace();
    tree.expand("io", true).unwrap();
    tree.expand("math", false).unwrap();

    assert_eq!(ids(&tree), ["io", "io/read", "io/read/slow", "math", "math/add", "math/div"]);
    let depths: Vec<usize> = tree.rows().iter().map(|r| r.depth).collect();
    assert_eq!(depths, [0, 1, 2, 0, 1, 1]);
}

#[test]
fn test_failed_suite_sorts_above_passing_one() {
    let mut tree = workspace();
    tree.set_state("io/read/slow", TestResultState::Passed).unwrap();
    tree.set_state("math/div", TestResultState::Failed).unwrap();

    assert_eq!(ids(&tree), ["math", "io"]);
    assert_eq!(tree.accessible_label("math").unwrap(), "math.rs (Failed)");
    assert_eq!(tree.accessible_label("io").unwrap(), "io.rs (Passed)");
}

#[test]
fn test_only_failed_filter_keeps_failed_branch() {
    let mut tree = workspace();
    tree.expand("math", true).unwrap();
    tree.expand("io", true).unwrap();
    tree.set_state("math/div", TestResultState::Errored).unwrap();
    tree.set_state("io/read", TestResultState::Passed).unwrap();

    tree.set_state_filter(StateFilter::OnlyFailed);
    assert_eq!(ids(&tree), ["math", "math/div"]);
}

#[test]
fn test_text_filter_with_negation() {
    let mut tree = workspace();
    tree.expand("io", true).unwrap();
    tree.expand("math", true).unwrap();

    tree.set_filter_text("numbers, !div");
    assert_eq!(ids(&tree), ["math", "math/add"]);

    // A leading negation starts everything as included.
    tree.set_filter_text("!slow");
    assert_eq!(ids(&tree), ["io", "io/read", "math", "math/add", "math/div"]);
}

#[test]
fn test_location_filter_hides_other_documents() {
    let mut tree = workspace();
    tree.set_location_filter(Some("file:///io.rs".to_string()));
    assert_eq!(ids(&tree), ["io"]);

    tree.set_location_filter(None);
    assert_eq!(ids(&tree).len(), 2);
}

#[test]
fn test_reveal_expands_ancestors_and_shows_excluded() {
    let mut tree = workspace();
    tree.set_excluded("io/read", true).unwrap();
    assert!(!tree.is_shown("io/read/slow").unwrap());

    let outcome = tree.reveal(&["io", "io/read", "io/read/slow"]);
    assert_eq!(outcome, RevealOutcome::Revealed);
    assert_eq!(tree.focused(), Some("io/read/slow"));
    assert!(tree.is_expanded("io").unwrap());
    assert!(tree.is_expanded("io/read").unwrap());
    assert!(tree.filter().show_excluded());
    assert!(tree.is_shown("io/read/slow").unwrap());
}

#[test]
fn test_reveal_waits_for_missing_item() {
    let mut tree = workspace();
    let outcome = tree.reveal(&["math", "math/mul"]);
    assert_eq!(outcome, RevealOutcome::Pending);
    assert!(tree.is_expanded("math").unwrap());
    assert!(tree.has_pending_reveal());

    tree.insert(Some("math"), TestItem::new("math/mul", "multiplies")).unwrap();
    assert!(!tree.has_pending_reveal());
    assert_eq!(tree.focused(), Some("math/mul"));
}

#[test]
fn test_change_events() {
    let mut tree = workspace();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let sub = tree.on_did_change(move |change| sink.borrow_mut().push(change.clone()));

    tree.set_state("math/add", TestResultState::Running).unwrap();
    tree.set_state("math/add", TestResultState::Running).unwrap();
    tree.collapse("math").unwrap();
    sub.dispose();
    tree.collapse_all();

    assert_eq!(
        *seen.borrow(),
        vec![ExplorerChange::State("math/add".to_string()), ExplorerChange::Expansion]
    );
}

#[test]
fn test_list_mode_shows_leaf_tests_flat() {
    let mut tree = workspace();
    tree.expand("io", true).unwrap();

    tree.set_view_mode(ViewMode::List);
    assert_eq!(ids(&tree), ["math/add", "math/div", "io/read/slow"]);
    assert!(tree.rows().iter().all(|row| row.depth == 0 && !row.has_children && !row.expanded));

    tree.set_state("io/read/slow", TestResultState::Failed).unwrap();
    assert_eq!(ids(&tree), ["io/read/slow", "math/add", "math/div"]);

    tree.set_view_mode(ViewMode::Tree);
    assert_eq!(ids(&tree), ["io", "io/read", "io/read/slow", "math"]);
}

#[test]
fn test_list_mode_applies_filters() {
    let mut tree = workspace();
    tree.set_view_mode(ViewMode::List);

    tree.set_filter_text("numbers");
    assert_eq!(ids(&tree), ["math/add", "math/div"]);

    tree.set_filter_text("");
    tree.set_excluded("io", true).unwrap();
    assert_eq!(ids(&tree), ["math/add", "math/div"]);

    tree.set_show_excluded(true);
    assert_eq!(ids(&tree), ["math/add", "math/div", "io/read/slow"]);
}

#[test]
fn test_view_mode_change_event() {
    let mut tree = workspace();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _sub = tree.on_did_change(move |change| sink.borrow_mut().push(change.clone()));

    tree.set_view_mode(ViewMode::List);
    tree.set_view_mode(ViewMode::List);
    assert_eq!(tree.view_mode(), ViewMode::List);
    assert_eq!(*seen.borrow(), vec![ExplorerChange::ViewMode]);
}

#[test]
fn test_unknown_items_are_reported() {
    let mut tree = workspace();
    assert_eq!(tree.remove("nope"), Err(ExplorerError::UnknownItem("nope".to_string())));
    assert!(tree.set_state("nope", TestResultState::Passed).is_err());
    assert!(tree.accessible_label("nope").is_err());
}
