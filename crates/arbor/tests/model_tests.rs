//! Tests for tree model commands and the events they emit.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::Key;

use arbor::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `1[2[3[4]],5,6,7]`; childless nodes are leaves. `ids[v]` is the node with value `v`.
fn sample() -> (TreeModel<i32>, Vec<NodeId>) {
    let mut tree = Tree::new();
    let n4 = tree.create(4);
    let n3 = tree.create_with_children(3, [n4]).unwrap();
    let n2 = tree.create_with_children(2, [n3]).unwrap();
    let n5 = tree.create(5);
    let n6 = tree.create(6);
    let n7 = tree.create(7);
    let n1 = tree.create_with_children(1, [n2, n5, n6, n7]).unwrap();

    let model = TreeModel::builder(tree, n1)
        .leaf_when(|tree, node| tree.children(node).is_empty())
        .build()
        .unwrap();
    (model, vec![n1, n1, n2, n3, n4, n5, n6, n7])
}

/// `0[10,20,30]` sorted by value; only `0` is a container.
fn sorted_sample() -> (TreeModel<i32>, Vec<NodeId>) {
    let mut tree = Tree::new();
    let kids: Vec<NodeId> = [10, 20, 30].into_iter().map(|v| tree.create(v)).collect();
    let root = tree.create_with_children(0, kids.clone()).unwrap();

    let model = TreeModel::builder(tree, root)
        .leaf_when(|tree, node| tree.value(node) != Some(&0))
        .sorted_by(|a: &i32, b: &i32| a.cmp(b))
        .build()
        .unwrap();
    (model, vec![root, kids[0], kids[1], kids[2]])
}

fn inline(model: &TreeModel<i32>) -> String {
    TreeDebug::inline(model.tree(), model.root())
}

/// Subscribes a recorder and drops the initial replay.
fn record(model: &TreeModel<i32>) -> Arc<Mutex<Vec<ModelEvent<i32>>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    model.connect(move |event| events_clone.lock().push(event.clone()));
    events.lock().clear();
    events
}

/// Rebuilds the document from events alone.
#[derive(Default)]
struct Mirror {
    tree: Tree<i32>,
    root: Option<NodeId>,
    nodes: HashMap<NodeId, NodeId>,
}

impl Mirror {
    fn apply(&mut self, event: &ModelEvent<i32>) {
        match event {
            ModelEvent::Insert {
                node,
                parent,
                next_sibling,
                value,
            } => {
                let mirrored = self.tree.create(*value);
                self.nodes.insert(*node, mirrored);
                match parent {
                    Some(parent) => {
                        let parent = self.nodes[parent];
                        let reference = next_sibling.map(|next| self.nodes[&next]);
                        self.tree.insert_before(parent, reference, mirrored).unwrap();
                    }
                    None => self.root = Some(mirrored),
                }
            }
            ModelEvent::Remove { node } => {
                if let Some(mirrored) = self.nodes.remove(node) {
                    self.tree.destroy(mirrored).unwrap();
                }
            }
            ModelEvent::ChangeValue { node, value } => {
                self.tree.set_value(self.nodes[node], *value).unwrap();
            }
            _ => {}
        }
    }

    fn inline(&self) -> String {
        self.root
            .map(|root| TreeDebug::inline(&self.tree, root))
            .unwrap_or_default()
    }
}

fn mirror(model: &TreeModel<i32>) -> Arc<Mutex<Mirror>> {
    let mirror = Arc::new(Mutex::new(Mirror::default()));
    let mirror_clone = mirror.clone();
    model.connect(move |event| mirror_clone.lock().apply(event));
    mirror
}

// =============================================================================
// Scenarios on 1[2[3[4]],5,6,7]
// =============================================================================

#[test]
fn test_copy_paste_after_leaf_cursor() {
    init_tracing();
    let (mut model, ids) = sample();

    model.select_one(Some(ids[3]));
    model.copy().unwrap();
    model.select_one(Some(ids[6]));
    model.paste().unwrap();

    assert_eq!(inline(&model), "1[2[3[4]],5,6,3[4],7]");
    let pasted = model.tree().next_sibling(ids[6]).unwrap();
    assert_ne!(pasted, ids[3]);
    assert_ne!(model.tree().first_child(pasted), Some(ids[4]));
}

#[test]
fn test_selected_subtrees_drop_descendants() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[2]));
    model.select_toggle(ids[3]);

    assert_eq!(model.sorted_selection(), vec![ids[2], ids[3]]);
    assert_eq!(model.selected_subtrees(), vec![ids[2]]);
}

#[test]
fn test_select_until_inclusive_range() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[3]));
    model.select_until(ids[6]);

    assert_eq!(
        model.sorted_selection(),
        vec![ids[3], ids[4], ids[5], ids[6]]
    );
    assert_eq!(model.cursor(), Some(ids[6]));
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_select_one_is_idempotent() {
    let (mut model, ids) = sample();
    let events = record(&model);

    model.select_one(Some(ids[5]));
    model.select_one(Some(ids[5]));

    assert!(model.is_only_selected(ids[5]));
    assert_eq!(
        *events.lock(),
        vec![
            ModelEvent::AddToSelection { node: ids[5] },
            ModelEvent::MoveCursor { node: Some(ids[5]) },
        ]
    );
}

#[test]
fn test_select_one_none_keeps_valid_cursor() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[4]));
    model.select_one(None);

    assert!(model.selection().is_empty());
    assert_eq!(model.cursor(), Some(ids[4]));
}

// =============================================================================
// Clipboard
// =============================================================================

#[test]
fn test_paste_is_repeatable() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[5]));
    model.select_toggle(ids[2]);
    model.copy().unwrap();
    model.select_one(Some(ids[7]));

    model.paste().unwrap();
    assert_eq!(inline(&model), "1[2[3[4]],5,6,7,2[3[4]],5]");
    model.paste().unwrap();
    assert_eq!(inline(&model), "1[2[3[4]],5,6,7,2[3[4]],5,2[3[4]],5]");
    assert_eq!(model.clipboard().len(), 2);
}

#[test]
fn test_paste_into_container_prepends() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[6]));
    model.copy().unwrap();
    model.select_one(Some(ids[2]));
    model.paste().unwrap();

    assert_eq!(inline(&model), "1[2[6,3[4]],5,6,7]");
}

#[test]
fn test_clipboard_is_independent_of_document() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[5]));
    model.copy().unwrap();

    model.set_value(50).unwrap();
    model.paste().unwrap();

    assert_eq!(inline(&model), "1[2[3[4]],50,5,6,7]");
    assert_eq!(model.clipboard().values().copied().collect::<Vec<_>>(), vec![5]);
}

#[test]
fn test_paste_without_cursor_or_clipboard_is_noop() {
    let (mut model, ids) = sample();
    let events = record(&model);

    model.paste().unwrap();
    model.select_one(Some(ids[5]));
    events.lock().clear();
    model.paste().unwrap();

    assert!(events.lock().is_empty());
    assert_eq!(inline(&model), "1[2[3[4]],5,6,7]");
}

#[test]
fn test_paste_events() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[3]));
    model.copy().unwrap();
    model.select_one(Some(ids[6]));
    let events = record(&model);

    model.paste().unwrap();

    let events = events.lock();
    assert_eq!(events.len(), 3);
    let ModelEvent::Insert { node, parent, next_sibling, value } = events[0].clone() else {
        panic!("expected insert, got {:?}", events[0]);
    };
    assert_eq!((parent, next_sibling, value), (Some(ids[1]), Some(ids[7]), 3));
    let ModelEvent::Insert { parent, value, .. } = events[1].clone() else {
        panic!("expected insert, got {:?}", events[1]);
    };
    assert_eq!((parent, value), (Some(node), 4));
    assert_eq!(events[2], ModelEvent::TreeChange { node: ids[1] });
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_removes_selected_subtrees() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[3]));
    model.select_toggle(ids[4]);
    model.select_toggle(ids[5]);
    let events = record(&model);

    model.delete().unwrap();

    assert_eq!(inline(&model), "1[2,6,7]");
    for id in [ids[3], ids[4], ids[5]] {
        assert!(!model.contains(id));
        assert!(!model.tree().contains(id));
    }
    assert!(model.selection().is_empty());
    assert_eq!(model.cursor(), None);
    assert_eq!(
        *events.lock(),
        vec![
            ModelEvent::RemoveFromSelection { node: ids[3] },
            ModelEvent::RemoveFromSelection { node: ids[4] },
            ModelEvent::Remove { node: ids[3] },
            ModelEvent::RemoveFromSelection { node: ids[5] },
            ModelEvent::Remove { node: ids[5] },
            ModelEvent::MoveCursor { node: None },
            ModelEvent::TreeChange { node: ids[1] },
        ]
    );
}

#[test]
fn test_delete_keeps_cursor_outside_removed_nodes() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[6]));
    model.select_toggle(ids[7]);
    model.unselect(ids[7]);
    // Cursor stays on 7, selection is {6}.
    model.delete().unwrap();

    assert_eq!(inline(&model), "1[2[3[4]],5,7]");
    assert_eq!(model.cursor(), Some(ids[7]));
}

#[test]
fn test_delete_never_removes_root() {
    let (mut model, ids) = sample();
    model.select_all();
    model.delete().unwrap();

    assert_eq!(inline(&model), "1[2[3[4]],5,6,7]");
    assert!(model.is_selected(ids[1]));
}

#[test]
fn test_delete_with_empty_selection_is_noop() {
    let (mut model, _) = sample();
    let events = record(&model);
    model.delete().unwrap();
    assert!(events.lock().is_empty());
}

// =============================================================================
// Moves and inserts
// =============================================================================

#[test]
fn test_drop_selection_keeps_selection_and_cursor() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[2]));
    let events = record(&model);

    model.drop_selection_into(ids[7]).unwrap();

    assert_eq!(inline(&model), "1[5,6,7,2[3[4]]]");
    assert!(model.is_only_selected(ids[2]));
    assert_eq!(model.cursor(), Some(ids[2]));

    let events = events.lock();
    assert_eq!(events.len(), 7);
    assert_eq!(
        events[..3].to_vec(),
        vec![
            ModelEvent::RemoveFromSelection { node: ids[2] },
            ModelEvent::Remove { node: ids[2] },
            ModelEvent::Insert {
                node: ids[2],
                parent: Some(ids[1]),
                next_sibling: None,
                value: 2,
            },
        ]
    );
    assert_eq!(
        events[5..].to_vec(),
        vec![
            ModelEvent::AddToSelection { node: ids[2] },
            ModelEvent::TreeChange { node: ids[1] },
        ]
    );
}

#[test]
fn test_move_events_match_state_changes() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[2]));
    model.select_toggle(ids[4]);
    model.close(ids[3]);
    let cursor = model.cursor();

    let selected = Arc::new(Mutex::new(0i32));
    let closed = Arc::new(Mutex::new(0i32));
    let cursor_moves = Arc::new(Mutex::new(0usize));
    let (selected_clone, closed_clone, cursor_clone) =
        (selected.clone(), closed.clone(), cursor_moves.clone());
    model.connect(move |event: &ModelEvent<i32>| match event {
        ModelEvent::AddToSelection { .. } => *selected_clone.lock() += 1,
        ModelEvent::RemoveFromSelection { .. } => *selected_clone.lock() -= 1,
        ModelEvent::Close { .. } => *closed_clone.lock() += 1,
        ModelEvent::Open { .. } => *closed_clone.lock() -= 1,
        ModelEvent::MoveCursor { .. } => *cursor_clone.lock() += 1,
        _ => {}
    });
    // The replay counts the current state once.
    assert_eq!(*selected.lock(), 2);
    assert_eq!(*closed.lock(), 1);
    *cursor_moves.lock() = 0;

    model.drop_selection_into(ids[7]).unwrap();

    assert_eq!(inline(&model), "1[5,6,7,2[3[4]]]");
    assert_eq!(*selected.lock(), model.selection().len() as i32);
    assert_eq!(*closed.lock(), 1);
    assert!(!model.is_open(ids[3]));
    assert_eq!(model.cursor(), cursor);
    assert_eq!(*cursor_moves.lock(), 0);
}

#[test]
fn test_insert_all_in_detached_nodes() {
    let (mut model, ids) = sample();
    let a = model.create_node(8);
    let b = model.create_node(9);

    model.insert_all_in(ids[1], &[a, b]).unwrap();

    assert_eq!(inline(&model), "1[8,9,2[3[4]],5,6,7]");
    assert!(model.contains(a));
}

#[test]
fn test_insert_all_in_skips_nested_and_duplicate_nodes() {
    let (mut model, ids) = sample();
    model.insert_all_in(ids[7], &[ids[4], ids[3], ids[4]]).unwrap();

    assert_eq!(inline(&model), "1[2,5,6,7,3[4]]");
}

#[test]
fn test_insert_all_in_imported_subtree() {
    let (mut model, ids) = sample();
    let mut other = Tree::new();
    let leaf = other.create(11);
    let branch = other.create_with_children(10, [leaf]).unwrap();

    let imported = model.import_subtree(&other, branch).unwrap();
    model.insert_all_in(ids[5], &[imported]).unwrap();

    assert_eq!(inline(&model), "1[2[3[4]],5,10[11],6,7]");
}

#[test]
fn test_insert_all_in_rejects_invalid_batches() {
    let (mut model, ids) = sample();
    let stray = model.create_node(99);
    let events = record(&model);

    assert_eq!(
        model.insert_all_in(ids[4], &[ids[6], ids[2]]),
        Err(ModelError::Tree(TreeError::CircularParentage))
    );
    assert_eq!(
        model.insert_all_in(ids[5], &[ids[6], ids[5]]),
        Err(ModelError::AnchorMoved)
    );
    assert_eq!(
        model.insert_all_in(stray, &[ids[6]]),
        Err(ModelError::NotInDocument)
    );
    assert_eq!(
        model.insert_all_in(ids[1], &[stray, NodeId::null()]),
        Err(ModelError::Tree(TreeError::InvalidNodeId))
    );

    assert!(events.lock().is_empty());
    assert_eq!(inline(&model), "1[2[3[4]],5,6,7]");
    assert!(!model.contains(stray));
}

#[test]
fn test_can_drop_into_matches_drop_outcome() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[2]));

    assert!(!model.can_drop_into(ids[3]));
    assert!(model.drop_selection_into(ids[3]).is_err());
    assert!(model.can_drop_into(ids[1]));
    model.drop_selection_into(ids[1]).unwrap();
    assert_eq!(inline(&model), "1[2[3[4]],5,6,7]");
}

// =============================================================================
// Values and sorting
// =============================================================================

#[test]
fn test_set_value_of() {
    let (mut model, ids) = sample();
    let events = record(&model);

    model.set_value_of(ids[6], 60).unwrap();
    model.set_value_of(ids[1], 100).unwrap();

    assert_eq!(inline(&model), "1[2[3[4]],5,60,7]");
    assert_eq!(
        *events.lock(),
        vec![
            ModelEvent::ChangeValue { node: ids[6], value: 60 },
            ModelEvent::TreeChange { node: ids[1] },
        ]
    );
}

#[test]
fn test_set_value_of_outside_document_is_noop() {
    let (mut model, _) = sample();
    let stray = model.create_node(8);
    let events = record(&model);

    assert_eq!(model.set_value_of(stray, 9), Ok(()));

    assert_eq!(model.value(stray), Some(&8));
    assert!(events.lock().is_empty());
}

#[test]
fn test_sorted_insert_ignores_position() {
    let (mut model, ids) = sorted_sample();
    let node = model.create_node(25);

    model.insert_all_in(ids[1], &[node]).unwrap();

    assert_eq!(inline(&model), "0[10,20,25,30]");
}

#[test]
fn test_sorted_move_may_include_leaf_target() {
    let (mut model, ids) = sorted_sample();
    let events = record(&model);

    assert_eq!(model.insert_all_in(ids[2], &[ids[1], ids[2]]), Ok(()));

    assert_eq!(inline(&model), "0[10,20,30]");
    assert_eq!(
        events.lock().last(),
        Some(&ModelEvent::TreeChange { node: ids[0] })
    );
}

#[test]
fn test_sorted_paste_places_each_copy() {
    let (mut model, ids) = sorted_sample();
    model.select_one(Some(ids[1]));
    model.select_toggle(ids[3]);
    model.copy().unwrap();
    model.select_one(Some(ids[2]));

    model.paste().unwrap();

    assert_eq!(inline(&model), "0[10,10,20,30,30]");
}

#[test]
fn test_sorted_set_value_repositions() {
    let (mut model, ids) = sorted_sample();
    let mirror = mirror(&model);
    model.select_one(Some(ids[1]));
    let events = record(&model);

    model.set_value(35).unwrap();

    assert_eq!(inline(&model), "0[20,30,35]");
    assert_eq!(mirror.lock().inline(), "0[20,30,35]");
    assert!(model.is_only_selected(ids[1]));
    assert_eq!(
        *events.lock(),
        vec![
            ModelEvent::ChangeValue { node: ids[1], value: 35 },
            ModelEvent::RemoveFromSelection { node: ids[1] },
            ModelEvent::Remove { node: ids[1] },
            ModelEvent::Insert {
                node: ids[1],
                parent: Some(ids[0]),
                next_sibling: None,
                value: 35,
            },
            ModelEvent::AddToSelection { node: ids[1] },
            ModelEvent::TreeChange { node: ids[0] },
        ]
    );

    events.lock().clear();
    model.set_value_of(ids[2], 21).unwrap();
    assert_eq!(inline(&model), "0[21,30,35]");
    assert_eq!(events.lock().len(), 2);
}

// =============================================================================
// Root replacement and observation
// =============================================================================

#[test]
fn test_set_root_replaces_document() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[3]));
    let mirror = mirror(&model);

    let mut other = Tree::new();
    let child = other.create(9);
    let root = other.create_with_children(8, [child]).unwrap();
    let new_root = model.import_subtree(&other, root).unwrap();
    let events = record(&model);

    model.set_root(new_root).unwrap();

    assert_eq!(model.root(), new_root);
    assert_eq!(inline(&model), "8[9]");
    assert_eq!(mirror.lock().inline(), "8[9]");
    assert!(model.selection().is_empty());
    assert_eq!(model.cursor(), None);
    assert!(!model.tree().contains(ids[1]));
    assert_eq!(model.tree().len(), 2);

    let events = events.lock();
    assert_eq!(
        events[..3].to_vec(),
        vec![
            ModelEvent::RemoveFromSelection { node: ids[3] },
            ModelEvent::MoveCursor { node: None },
            ModelEvent::Remove { node: ids[1] },
        ]
    );
    assert_eq!(events.last(), Some(&ModelEvent::TreeChange { node: new_root }));
}

#[test]
fn test_set_root_to_inner_node() {
    let (mut model, ids) = sample();
    model.set_root(ids[2]).unwrap();

    assert_eq!(inline(&model), "2[3[4]]");
    assert_eq!(model.tree().parent(ids[2]), None);
    assert!(!model.tree().contains(ids[5]));
}

#[test]
fn test_mirror_follows_edits() {
    init_tracing();
    let (mut model, ids) = sample();
    let mirror = mirror(&model);
    assert_eq!(mirror.lock().inline(), "1[2[3[4]],5,6,7]");

    model.select_one(Some(ids[3]));
    model.copy().unwrap();
    model.select_one(Some(ids[7]));
    model.paste().unwrap();
    model.select_one(Some(ids[2]));
    model.drop_selection_into(ids[6]).unwrap();
    model.select_one(Some(ids[5]));
    model.delete().unwrap();
    model.set_value_of(ids[4], 40).unwrap();

    assert_eq!(inline(&model), "1[6,2[3[40]],7,3[4]]");
    assert_eq!(mirror.lock().inline(), inline(&model));
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let (mut model, ids) = sample();
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    let id = model.connect(move |event: &ModelEvent<i32>| events_clone.lock().push(event.clone()));
    events.lock().clear();

    assert!(model.unsubscribe(id));
    model.select_one(Some(ids[2]));

    assert!(events.lock().is_empty());
    assert_eq!(model.event_bus().observer_count(), 0);
}

#[test]
fn test_blocked_bus_suppresses_events() {
    let (mut model, ids) = sample();
    let events = record(&model);

    model.event_bus().set_blocked(true);
    model.select_one(Some(ids[2]));
    assert!(events.lock().is_empty());

    model.event_bus().set_blocked(false);
    model.select_one(Some(ids[5]));
    assert_eq!(events.lock().len(), 3);
}

#[test]
fn test_copy_empty_selection_clears_clipboard() {
    let (mut model, ids) = sample();
    model.select_one(Some(ids[3]));
    model.copy().unwrap();
    assert_eq!(model.clipboard().len(), 1);

    model.reset_selection();
    model.copy().unwrap();

    assert!(model.clipboard().is_empty());
    assert!(model.clipboard().store().is_empty());
}
