//! Tree editing model.
//!
//! [`TreeModel`] owns one document tree plus the editing state around it:
//! a selection, a single cursor, a clipboard and per-node collapse state.
//! Every change goes through a model command, and every command announces
//! its net effect as a deterministic sequence of [`ModelEvent`]s on the
//! model's [`EventBus`].
//!
//! # Invariants
//!
//! - Selected nodes are always reachable from the document root. Removing a
//!   node deselects it (and everything below it) in the same command.
//! - The cursor is either `None` or a node reachable from the root. When a
//!   command invalidates it, it falls back to the oldest remaining
//!   selected node, or `None`.
//! - The clipboard holds copies in a separate arena, never live nodes.
//!
//! # Event Order
//!
//! A subtree entering the document is announced node by node with
//! [`ModelEvent::Insert`], visiting the next sibling's subtree before the
//! node itself and the node before its first child. Each insert therefore
//! names a `next_sibling` that observers have already seen.
//!
//! # Example
//!
//! ```
//! use arbor::model::{ModelEvent, TreeModel};
//! use arbor_core::Tree;
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let mut tree = Tree::new();
//! let a = tree.create("a");
//! let root = tree.create_with_children("root", [a]).unwrap();
//! let mut model = TreeModel::new(tree, root, |tree, node| tree.children(node).is_empty()).unwrap();
//!
//! let inserts = Arc::new(Mutex::new(0));
//! let inserts_clone = inserts.clone();
//! model.connect(move |event| {
//!     if let ModelEvent::Insert { .. } = event {
//!         *inserts_clone.lock() += 1;
//!     }
//! });
//! // Subscribing replays the current document.
//! assert_eq!(*inserts.lock(), 2);
//!
//! model.select_one(Some(a));
//! model.copy().unwrap();
//! model.paste().unwrap();
//! assert_eq!(model.tree().children(root).len(), 2);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use arbor_core::logging::targets;
use arbor_core::{EventBus, NodeId, Observer, PerfSpan, SubscriptionId, Tree, TreeError};

use super::clipboard::Clipboard;
use super::event::ModelEvent;
use super::policy::{ModelPolicy, TreeModelBuilder};
use super::selection::{topmost, Selection};
use crate::error::{ModelError, ModelResult};

/// Resolved insertion point: container plus the child to insert after.
type DropTarget = (NodeId, Option<NodeId>);

/// Selection and collapse state taken from a subtree while it moves.
#[derive(Debug, Default)]
struct MovedState {
    selected: Vec<NodeId>,
    closed: Vec<NodeId>,
}

/// A headless tree editing model.
///
/// See the [module documentation](self) for invariants and event order.
pub struct TreeModel<V> {
    tree: Tree<V>,
    root: NodeId,
    selection: Selection,
    cursor: Option<NodeId>,
    clipboard: Clipboard<V>,
    /// Collapsed nodes. Everything else is open.
    closed: HashSet<NodeId>,
    policy: ModelPolicy<V>,
    bus: Arc<EventBus<ModelEvent<V>>>,
}

impl<V: Clone + 'static> TreeModel<V> {
    /// Create a model over `root` with the given leaf predicate.
    ///
    /// `root` must exist in `tree` and have no parent.
    pub fn new<F>(tree: Tree<V>, root: NodeId, is_leaf: F) -> ModelResult<Self>
    where
        F: Fn(&Tree<V>, NodeId) -> bool + Send + Sync + 'static,
    {
        Self::with_policy(tree, root, ModelPolicy::new(is_leaf))
    }

    /// Start a [`TreeModelBuilder`].
    pub fn builder(tree: Tree<V>, root: NodeId) -> TreeModelBuilder<V> {
        TreeModelBuilder::new(tree, root)
    }

    /// Create a model with an explicit policy.
    pub fn with_policy(tree: Tree<V>, root: NodeId, policy: ModelPolicy<V>) -> ModelResult<Self> {
        if !tree.contains(root) {
            return Err(TreeError::InvalidNodeId.into());
        }
        if tree.parent(root).is_some() {
            return Err(ModelError::RootHasParent);
        }

        tracing::debug!(
            target: targets::MODEL,
            ?root,
            nodes = tree.len(),
            sorted = policy.is_sorted(),
            "model created"
        );

        Ok(Self {
            tree,
            root,
            selection: Selection::new(),
            cursor: None,
            clipboard: Clipboard::new(),
            closed: HashSet::new(),
            policy,
            bus: Arc::new(EventBus::new()),
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn tree(&self) -> &Tree<V> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard<V> {
        &self.clipboard
    }

    pub fn policy(&self) -> &ModelPolicy<V> {
        &self.policy
    }

    /// The bus events are published on.
    pub fn event_bus(&self) -> &Arc<EventBus<ModelEvent<V>>> {
        &self.bus
    }

    pub fn value(&self, node: NodeId) -> Option<&V> {
        self.tree.value(node)
    }

    /// Check if a node is reachable from the document root.
    pub fn contains(&self, node: NodeId) -> bool {
        self.tree.root(node) == Some(self.root)
    }

    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.policy.is_leaf(&self.tree, node)
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.selection.contains(node)
    }

    pub fn is_only_selected(&self, node: NodeId) -> bool {
        self.selection.is_only(node)
    }

    /// Selected nodes in document order.
    pub fn sorted_selection(&self) -> Vec<NodeId> {
        self.selection.sorted_in(&self.tree)
    }

    /// Topmost selected nodes in document order.
    ///
    /// This is the set copy, delete and drag operate on.
    pub fn selected_subtrees(&self) -> Vec<NodeId> {
        self.selection.subtrees_in(&self.tree)
    }

    pub fn is_open(&self, node: NodeId) -> bool {
        !self.closed.contains(&node)
    }

    /// Check if the current selection may be dropped into `target`.
    ///
    /// The target must be a container in the document and must not lie
    /// inside any selected subtree.
    pub fn can_drop_into(&self, target: NodeId) -> bool {
        self.contains(target)
            && !self.is_leaf(target)
            && !self
                .selected_subtrees()
                .into_iter()
                .any(|subtree| subtree == target || self.tree.is_descendant_of(target, subtree))
    }

    // =========================================================================
    // Node Creation
    // =========================================================================

    /// Create a detached node in the model's arena.
    ///
    /// Detached nodes are invisible to observers until inserted with
    /// [`insert_all_in`](Self::insert_all_in) or installed with
    /// [`set_root`](Self::set_root).
    pub fn create_node(&mut self, value: V) -> NodeId {
        self.tree.create(value)
    }

    /// Copy a subtree of another arena into the model's arena, detached.
    pub fn import_subtree(&mut self, source: &Tree<V>, node: NodeId) -> ModelResult<NodeId> {
        Ok(self.tree.import_subtree(source, node)?)
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Register an observer and replay the current state to it.
    ///
    /// The replay goes to the new observer only: the document as inserts,
    /// then `Close` for collapsed nodes, `AddToSelection` in document order
    /// and finally `MoveCursor` if there is a cursor. Subscribing an
    /// observer that is already registered returns its ID and replays
    /// nothing.
    pub fn subscribe(&self, observer: Observer<ModelEvent<V>>) -> SubscriptionId {
        let before = self.bus.observer_count();
        let id = self.bus.subscribe(observer);
        if self.bus.observer_count() > before {
            let target = Some(id);
            self.emit_tree(Some(self.root), target);
            self.replay_state(self.root, target);
        }
        id
    }

    /// Register a closure as a new observer and replay the current state to it.
    pub fn connect<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&ModelEvent<V>) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(observer))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn unsubscribe_observer(&self, observer: &Observer<ModelEvent<V>>) -> bool {
        self.bus.unsubscribe_observer(observer)
    }

    // =========================================================================
    // Selection Commands
    // =========================================================================

    /// Make `node` the only selected node and move the cursor to it.
    ///
    /// Does nothing if `node` is already the only selected node or is not in
    /// the document. `None` clears the selection.
    #[tracing::instrument(skip(self), target = "arbor::model", level = "debug")]
    pub fn select_one(&mut self, node: Option<NodeId>) {
        if let Some(node) = node
            && (!self.contains(node) || self.selection.is_only(node))
        {
            return;
        }

        self.clear_selection();
        match node {
            Some(node) => {
                self.add_to_selection(node);
                self.set_cursor(Some(node));
            }
            None => self.ensure_valid_cursor(),
        }
    }

    /// Select the node before the cursor in document order.
    pub fn select_prev(&mut self) {
        if let Some(previous) = self.cursor.and_then(|cursor| self.tree.previous(cursor)) {
            self.select_one(Some(previous));
        }
    }

    /// Select the node after the cursor in document order.
    pub fn select_next(&mut self) {
        if let Some(next) = self.cursor.and_then(|cursor| self.tree.next(cursor)) {
            self.select_one(Some(next));
        }
    }

    /// Flip the selection state of one node.
    ///
    /// Selecting also moves the cursor to the node.
    #[tracing::instrument(skip(self), target = "arbor::model", level = "debug")]
    pub fn select_toggle(&mut self, node: NodeId) {
        if !self.contains(node) {
            return;
        }
        if self.selection.contains(node) {
            self.unselect(node);
        } else {
            self.add_to_selection(node);
            self.set_cursor(Some(node));
        }
    }

    /// Extend the selection over the document-order range from the cursor
    /// to `node`, both ends included, and move the cursor to `node`.
    ///
    /// Does nothing without a cursor.
    #[tracing::instrument(skip(self), target = "arbor::model", level = "debug")]
    pub fn select_until(&mut self, node: NodeId) {
        let Some(cursor) = self.cursor else {
            return;
        };
        if !self.contains(node) {
            return;
        }

        let (start, end) = if self.tree.cmp_document_order(node, cursor).is_lt() {
            (node, cursor)
        } else {
            (cursor, node)
        };

        let mut range = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            range.push(id);
            if id == end {
                break;
            }
            current = self.tree.next(id);
        }

        for id in range {
            self.add_to_selection(id);
        }
        self.set_cursor(Some(node));
    }

    /// Select every node in the document.
    pub fn select_all(&mut self) {
        let all: Vec<NodeId> = self.tree.preorder(self.root).collect();
        for node in all {
            self.add_to_selection(node);
        }
    }

    /// Clear the selection.
    pub fn reset_selection(&mut self) {
        self.clear_selection();
        self.ensure_valid_cursor();
    }

    /// Deselect one node.
    pub fn unselect(&mut self, node: NodeId) {
        self.remove_from_selection(node);
        self.ensure_valid_cursor();
    }

    // =========================================================================
    // Collapse State
    // =========================================================================

    /// Expand a collapsed node.
    pub fn open(&mut self, node: NodeId) {
        if self.contains(node) && self.closed.remove(&node) {
            self.emit(ModelEvent::Open { node });
        }
    }

    /// Collapse a node.
    pub fn close(&mut self, node: NodeId) {
        if self.contains(node) && self.closed.insert(node) {
            self.emit(ModelEvent::Close { node });
        }
    }

    pub fn open_selected(&mut self) {
        for node in self.selected_subtrees() {
            self.open(node);
        }
    }

    pub fn close_selected(&mut self) {
        for node in self.selected_subtrees() {
            self.close(node);
        }
    }

    // =========================================================================
    // Clipboard and Structure Commands
    // =========================================================================

    /// Copy the selected subtrees to the clipboard, in document order.
    ///
    /// An empty selection empties the clipboard.
    #[tracing::instrument(skip(self), target = "arbor::model", level = "debug")]
    pub fn copy(&mut self) -> ModelResult<()> {
        let subtrees = self.selected_subtrees();
        if subtrees.is_empty() {
            self.clipboard.clear();
            return Ok(());
        }
        self.clipboard.replace(&self.tree, &subtrees)?;
        tracing::debug!(target: targets::MODEL, entries = subtrees.len(), "copied selection");
        Ok(())
    }

    /// Insert fresh copies of the clipboard at the cursor.
    ///
    /// A leaf cursor receives the copies as following siblings; a container
    /// cursor receives them as its first children. The clipboard is left
    /// intact, so pasting again inserts another set of copies. Does nothing
    /// without a cursor or with an empty clipboard.
    #[tracing::instrument(skip(self), target = "arbor::model", level = "debug")]
    pub fn paste(&mut self) -> ModelResult<()> {
        let Some(cursor) = self.cursor else {
            return Ok(());
        };
        if self.clipboard.is_empty() {
            return Ok(());
        }
        let Some((parent, anchor)) = self.resolve_target(cursor) else {
            return Ok(());
        };
        let _perf = PerfSpan::new("paste");

        let mut fresh = Vec::with_capacity(self.clipboard.len());
        for &entry in self.clipboard.entries() {
            fresh.push(self.tree.import_subtree(self.clipboard.store(), entry)?);
        }

        self.insert_nodes(parent, anchor, &fresh)?;
        self.emit(ModelEvent::TreeChange { node: self.root });
        Ok(())
    }

    /// Move or insert `nodes` into `target`.
    ///
    /// The target resolves like a paste cursor. Nodes already in the
    /// document are moved and keep their selection, cursor and collapse
    /// state; detached nodes of the model's arena are inserted. Duplicates
    /// and nodes whose ancestor is also listed are skipped, since they
    /// travel with that ancestor. The listed order is kept.
    ///
    /// A moved subtree gives up its selection and collapse state before its
    /// `Remove` event and takes it back after its inserts, so each
    /// `AddToSelection`, `RemoveFromSelection`, `Open` and `Close` matches a
    /// real change. The cursor does not move.
    ///
    /// # Errors
    ///
    /// Nothing changes if any of these hold:
    ///
    /// - [`ModelError::NotInDocument`] if `target` is not in the document
    /// - [`TreeError::InvalidNodeId`] if a node does not exist
    /// - [`TreeError::CircularParentage`] if a node contains the target container
    /// - [`ModelError::AnchorMoved`] if the leaf target itself is being moved
    ///   in an unsorted model
    #[tracing::instrument(skip(self, nodes), fields(count = nodes.len()), target = "arbor::model", level = "debug")]
    pub fn insert_all_in(&mut self, target: NodeId, nodes: &[NodeId]) -> ModelResult<()> {
        let Some((parent, anchor, nodes)) = self.plan_insert(target, nodes)? else {
            return Ok(());
        };
        if nodes.is_empty() {
            return Ok(());
        }
        let _perf = PerfSpan::new("insert_all_in");

        self.insert_nodes(parent, anchor, &nodes)?;
        self.emit(ModelEvent::TreeChange { node: self.root });
        Ok(())
    }

    /// Move the selected subtrees into `target`.
    pub fn drop_selection_into(&mut self, target: NodeId) -> ModelResult<()> {
        let subtrees = self.selected_subtrees();
        self.insert_all_in(target, &subtrees)
    }

    /// Remove the selected subtrees from the document and free them.
    ///
    /// Every selected node inside a removed subtree is deselected first.
    /// The document root is never removed.
    #[tracing::instrument(skip(self), target = "arbor::model", level = "debug")]
    pub fn delete(&mut self) -> ModelResult<()> {
        let _perf = PerfSpan::new("delete");
        let mut removed = 0;
        for subtree in self.selected_subtrees() {
            if subtree == self.root {
                continue;
            }
            let doomed: Vec<NodeId> = self.tree.preorder(subtree).collect();
            for &node in &doomed {
                self.remove_from_selection(node);
                self.closed.remove(&node);
            }
            self.tree.destroy(subtree)?;
            self.emit(ModelEvent::Remove { node: subtree });
            removed += 1;
        }

        self.ensure_valid_cursor();
        if removed > 0 {
            tracing::debug!(target: targets::MODEL, removed, "deleted selection");
            self.emit(ModelEvent::TreeChange { node: self.root });
        }
        Ok(())
    }

    /// Set the value of the cursor node.
    pub fn set_value(&mut self, value: V) -> ModelResult<()> {
        match self.cursor {
            Some(cursor) => self.set_value_of(cursor, value),
            None => Ok(()),
        }
    }

    /// Set the value of a node.
    ///
    /// With a sort comparator the node is moved to its sorted position among
    /// its siblings. The document root has no siblings and is left alone, as
    /// is any node outside the document.
    #[tracing::instrument(skip(self, value), target = "arbor::model", level = "debug")]
    pub fn set_value_of(&mut self, node: NodeId, value: V) -> ModelResult<()> {
        if !self.contains(node) {
            return Ok(());
        }
        let Some(parent) = self.tree.parent(node) else {
            return Ok(());
        };

        self.tree.set_value(node, value.clone())?;
        self.emit(ModelEvent::ChangeValue { node, value });

        if self.policy.is_sorted() {
            let reference = self
                .tree
                .value(node)
                .and_then(|value| self.policy.sorted_reference(&self.tree, parent, node, value));
            if reference != self.tree.next_sibling(node) {
                let state = self.take_state(node);
                self.tree.remove(node)?;
                self.emit(ModelEvent::Remove { node });
                self.tree.insert_before(parent, reference, node)?;
                self.announce_insert(node);
                self.restore_state(state);
            }
        }

        self.emit(ModelEvent::TreeChange { node: self.root });
        Ok(())
    }

    /// Replace the whole document.
    ///
    /// Selection and cursor are cleared, the old document is removed and
    /// freed, and `new_root` (detached first if it has a parent) is
    /// announced as the new document.
    #[tracing::instrument(skip(self), target = "arbor::model", level = "debug")]
    pub fn set_root(&mut self, new_root: NodeId) -> ModelResult<()> {
        if !self.tree.contains(new_root) {
            return Err(TreeError::InvalidNodeId.into());
        }
        if new_root == self.root {
            return Ok(());
        }
        let _perf = PerfSpan::new("set_root");

        self.clear_selection();
        self.set_cursor(None);
        self.tree.remove(new_root)?;

        let old_root = self.root;
        self.closed.clear();
        let freed = self.tree.destroy(old_root)?;
        self.emit(ModelEvent::Remove { node: old_root });

        self.root = new_root;
        tracing::debug!(target: targets::MODEL, ?old_root, ?new_root, freed, "document replaced");
        self.emit_tree(Some(new_root), None);
        self.emit(ModelEvent::TreeChange { node: new_root });
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn add_to_selection(&mut self, node: NodeId) {
        if self.selection.insert(node) {
            self.emit(ModelEvent::AddToSelection { node });
        }
    }

    fn remove_from_selection(&mut self, node: NodeId) {
        if self.selection.remove(node) {
            self.emit(ModelEvent::RemoveFromSelection { node });
        }
    }

    fn clear_selection(&mut self) {
        let selected: Vec<NodeId> = self.selection.iter().collect();
        for node in selected {
            self.remove_from_selection(node);
        }
    }

    fn set_cursor(&mut self, node: Option<NodeId>) {
        if self.cursor != node {
            self.cursor = node;
            self.emit(ModelEvent::MoveCursor { node });
        }
    }

    /// Move a cursor that left the document to the oldest selected node.
    fn ensure_valid_cursor(&mut self) {
        if let Some(cursor) = self.cursor
            && !self.contains(cursor)
        {
            let fallback = self.selection.first();
            self.set_cursor(fallback);
        }
    }

    /// Leaf targets resolve to (parent, after target); containers to
    /// (target, first position). `None` for a leaf without a parent.
    fn resolve_target(&self, target: NodeId) -> Option<DropTarget> {
        if self.is_leaf(target) {
            self.tree.parent(target).map(|parent| (parent, Some(target)))
        } else {
            Some((target, None))
        }
    }

    /// Validate an `insert_all_in` call without touching anything.
    fn plan_insert(
        &self,
        target: NodeId,
        nodes: &[NodeId],
    ) -> ModelResult<Option<(NodeId, Option<NodeId>, Vec<NodeId>)>> {
        if !self.contains(target) {
            return Err(ModelError::NotInDocument);
        }
        if nodes.iter().any(|&node| !self.tree.contains(node)) {
            return Err(TreeError::InvalidNodeId.into());
        }
        let Some((parent, anchor)) = self.resolve_target(target) else {
            return Ok(None);
        };

        let nodes = self.outermost(nodes);
        for &node in &nodes {
            if node == parent || self.tree.is_descendant_of(parent, node) {
                return Err(TreeError::CircularParentage.into());
            }
            if !self.policy.is_sorted() && anchor == Some(node) {
                return Err(ModelError::AnchorMoved);
            }
        }
        Ok(Some((parent, anchor, nodes)))
    }

    /// Drop duplicates and nodes that have a listed ancestor, keeping order.
    fn outermost(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let unique: Vec<NodeId> = nodes.iter().copied().filter(|&node| seen.insert(node)).collect();
        if unique.len() > 1 && unique.iter().all(|&node| self.contains(node)) {
            // Single document: sort, collapse, then restore the caller's order.
            let mut sorted = unique.clone();
            sorted.sort_by(|&a, &b| self.tree.cmp_document_order(a, b));
            let keep: HashSet<NodeId> = topmost(&self.tree, sorted).into_iter().collect();
            return unique.into_iter().filter(|node| keep.contains(node)).collect();
        }
        unique
            .iter()
            .copied()
            .filter(|&node| {
                !unique
                    .iter()
                    .any(|&other| other != node && self.tree.is_descendant_of(node, other))
            })
            .collect()
    }

    /// Place and announce `nodes` so their final order under `parent` is the
    /// given order, or sorted order when a comparator is set.
    fn insert_nodes(
        &mut self,
        parent: NodeId,
        anchor: Option<NodeId>,
        nodes: &[NodeId],
    ) -> ModelResult<()> {
        // Inserting right after a fixed anchor reverses the input.
        let ordered: Vec<NodeId> = if self.policy.is_sorted() {
            nodes.to_vec()
        } else {
            nodes.iter().rev().copied().collect()
        };

        for node in ordered {
            let moved = if self.contains(node) {
                let state = self.take_state(node);
                self.tree.remove(node)?;
                self.emit(ModelEvent::Remove { node });
                Some(state)
            } else {
                None
            };

            if self.policy.is_sorted() {
                let reference = self
                    .tree
                    .value(node)
                    .and_then(|value| self.policy.sorted_reference(&self.tree, parent, node, value));
                self.tree.insert_before(parent, reference, node)?;
            } else {
                self.tree.insert_after(parent, anchor, node)?;
            }
            self.announce_insert(node);
            if let Some(state) = moved {
                self.restore_state(state);
            }
        }
        Ok(())
    }

    /// Announce a node that just entered the document together with its
    /// subtree.
    fn announce_insert(&self, node: NodeId) {
        if let Some(event) = self.insert_event(node) {
            self.emit(event);
        }
        self.emit_tree(self.tree.first_child(node), None);
    }

    /// Deselect and reopen a subtree about to leave the document.
    ///
    /// The cursor is left alone.
    fn take_state(&mut self, node: NodeId) -> MovedState {
        let mut state = MovedState::default();
        for id in self.tree.preorder(node) {
            if self.selection.contains(id) {
                state.selected.push(id);
            }
            if self.closed.contains(&id) {
                state.closed.push(id);
            }
        }
        for &id in &state.selected {
            self.remove_from_selection(id);
        }
        for &id in &state.closed {
            self.open(id);
        }
        state
    }

    /// Reapply state taken by [`take_state`](Self::take_state) once the
    /// subtree is back in the document.
    fn restore_state(&mut self, state: MovedState) {
        for id in state.closed {
            self.close(id);
        }
        for id in state.selected {
            self.add_to_selection(id);
        }
    }

    fn insert_event(&self, node: NodeId) -> Option<ModelEvent<V>> {
        let value = self.tree.value(node)?.clone();
        Some(ModelEvent::Insert {
            node,
            parent: self.tree.parent(node),
            next_sibling: self.tree.next_sibling(node),
            value,
        })
    }

    /// Announce `start`, its following siblings and all their descendants.
    ///
    /// Order: next sibling's subtree, then the node, then its first child's
    /// subtree. Uses an explicit stack, so deep trees are fine.
    fn emit_tree(&self, start: Option<NodeId>, target: Option<SubscriptionId>) {
        let Some(start) = start else {
            return;
        };
        let _span = tracing::trace_span!(target: targets::MODEL, "emit_tree", ?start).entered();

        let mut stack = vec![start];
        stack.extend(self.tree.next_siblings(start));
        while let Some(node) = stack.pop() {
            if let Some(event) = self.insert_event(node) {
                self.deliver(target, event);
            }
            stack.extend(self.tree.children(node).iter().copied());
        }
    }

    /// Replay collapse, selection and cursor state for a subtree.
    fn replay_state(&self, node: NodeId, target: Option<SubscriptionId>) {
        for id in self.tree.preorder(node) {
            if self.closed.contains(&id) {
                self.deliver(target, ModelEvent::Close { node: id });
            }
        }
        for id in self.tree.preorder(node) {
            if self.selection.contains(id) {
                self.deliver(target, ModelEvent::AddToSelection { node: id });
            }
        }
        if let Some(cursor) = self.cursor
            && (cursor == node || self.tree.is_descendant_of(cursor, node))
        {
            self.deliver(target, ModelEvent::MoveCursor { node: Some(cursor) });
        }
    }

    fn deliver(&self, target: Option<SubscriptionId>, event: ModelEvent<V>) {
        match target {
            Some(id) => {
                self.bus.emit_to(id, &event);
            }
            None => self.emit(event),
        }
    }

    fn emit(&self, event: ModelEvent<V>) {
        tracing::trace!(target: targets::MODEL, kind = event.kind(), node = ?event.node(), "event");
        self.bus.emit(&event);
    }
}

impl<V> fmt::Debug for TreeModel<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeModel")
            .field("root", &self.root)
            .field("nodes", &self.tree.len())
            .field("selected", &self.selection.len())
            .field("cursor", &self.cursor)
            .field("clipboard", &self.clipboard.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(TreeModel<String>: Send, Sync);
