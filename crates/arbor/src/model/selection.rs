//! Selection set for tree models.
//!
//! [`Selection`] stores node IDs with unique membership. Storage keeps
//! insertion order; document order is derived on demand against a
//! [`Tree`] with [`Selection::sorted_in`] and [`Selection::subtrees_in`].

use std::collections::HashSet;

use arbor_core::{NodeId, Tree};

/// A set of selected nodes.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Fast membership lookup.
    members: HashSet<NodeId>,
    /// Members in insertion order.
    order: Vec<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `false` if it was already selected.
    pub fn insert(&mut self, node: NodeId) -> bool {
        if !self.members.insert(node) {
            return false;
        }
        self.order.push(node);
        true
    }

    /// Remove a node. Returns `false` if it was not selected.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if !self.members.remove(&node) {
            return false;
        }
        self.order.retain(|&id| id != node);
        true
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    /// Check if `node` is the only selected node.
    pub fn is_only(&self, node: NodeId) -> bool {
        self.order.len() == 1 && self.order[0] == node
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The earliest selected node still in the set.
    pub fn first(&self) -> Option<NodeId> {
        self.order.first().copied()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// Members sorted in document order.
    pub fn sorted_in<V>(&self, tree: &Tree<V>) -> Vec<NodeId> {
        let mut sorted = self.order.clone();
        sorted.sort_by(|&a, &b| tree.cmp_document_order(a, b));
        sorted
    }

    /// Topmost members in document order.
    ///
    /// A member is dropped when one of its ancestors is also selected.
    pub fn subtrees_in<V>(&self, tree: &Tree<V>) -> Vec<NodeId> {
        topmost(tree, self.sorted_in(tree))
    }
}

/// Collapse a document-ordered list to its topmost nodes.
///
/// Walking the list, a node is kept only if it is not a descendant of the
/// most recently kept node. Pre-order guarantees that checking the last kept
/// node is enough.
pub fn topmost<V>(tree: &Tree<V>, sorted: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
    let mut result: Vec<NodeId> = Vec::new();
    for node in sorted {
        match result.last() {
            Some(&last) if tree.is_descendant_of(node, last) => {}
            _ => result.push(node),
        }
    }
    result
}
