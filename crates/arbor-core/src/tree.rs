//! Arena-backed ordered trees.
//!
//! A [`Tree<V>`] is an arena of nodes. Each node owns an ordered list of
//! children and keeps a non-owning back reference to its parent, so the
//! ownership graph never contains cycles. Nodes are addressed by [`NodeId`],
//! a generational key: once a node is destroyed its ID is never handed out
//! again, and lookups through a stale ID simply find nothing.
//!
//! One arena may hold several disjoint trees. A freshly created node is its
//! own root until it is inserted somewhere.
//!
//! # Key Types
//!
//! - [`Tree`] - The arena and every structural operation
//! - [`NodeId`] - Stable handle to a node
//! - [`Descendants`] - Lazy pre-order walk over a subtree
//!
//! # Document Order
//!
//! All nodes reachable from a common root are totally ordered by pre-order
//! traversal: a node precedes its descendants, and siblings keep their list
//! order. [`Tree::next`] and [`Tree::previous`] step through that order, and
//! [`Tree::cmp_document_order`] compares any two nodes under it.
//!
//! # Example
//!
//! ```
//! use arbor_core::Tree;
//!
//! let mut tree = Tree::new();
//! let leaf = tree.create("leaf");
//! let branch = tree.create_with_children("branch", [leaf]).unwrap();
//! let root = tree.create_with_children("root", [branch]).unwrap();
//!
//! assert_eq!(tree.next(root), Some(branch));
//! assert_eq!(tree.next(branch), Some(leaf));
//! assert_eq!(tree.previous(leaf), Some(branch));
//! assert_eq!(tree.root(leaf), Some(root));
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::error::{TreeError, TreeResult};
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a node in a [`Tree`].
    ///
    /// `NodeId`s stay valid while the node is moved around the tree and
    /// become invalid once the node is destroyed.
    pub struct NodeId;
}

/// Storage for a single node.
#[derive(Debug, Clone)]
struct Node<V> {
    value: V,
    /// Non-owning back reference, `None` for roots.
    parent: Option<NodeId>,
    /// Owned children in sibling order.
    children: Vec<NodeId>,
}

/// One step of a subtree copy: (source id, source parent, value).
type CopyStep<V> = (NodeId, Option<NodeId>, V);

/// An arena of ordered n-ary trees.
///
/// Uses slotmap storage for stable node IDs. Every mutator either leaves the
/// arena in a valid shape (single parent, no cycles, parent and child links
/// in agreement) or fails with a [`TreeError`] before changing anything.
#[derive(Debug, Clone)]
pub struct Tree<V> {
    nodes: SlotMap<NodeId, Node<V>>,
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Tree<V> {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Create a standalone node. It is its own root until inserted.
    pub fn create(&mut self, value: V) -> NodeId {
        let id = self.nodes.insert(Node {
            value,
            parent: None,
            children: Vec::new(),
        });
        tracing::trace!(target: targets::TREE, ?id, "created node");
        id
    }

    /// Create a node and adopt `children` in order.
    ///
    /// Each child is detached from its previous parent first.
    pub fn create_with_children<I>(&mut self, value: V, children: I) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let children: Vec<NodeId> = children.into_iter().collect();
        if children.iter().any(|&child| !self.contains(child)) {
            return Err(TreeError::InvalidNodeId);
        }

        let id = self.create(value);
        for child in children {
            self.insert_before(id, None, child)?;
        }
        Ok(id)
    }

    /// Check if a node exists in the arena.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Total number of nodes in the arena, across all trees.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over every parentless node in the arena.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Get a node's value.
    pub fn value(&self, id: NodeId) -> Option<&V> {
        self.nodes.get(id).map(|node| &node.value)
    }

    /// Get a node's value mutably.
    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.nodes.get_mut(id).map(|node| &mut node.value)
    }

    /// Replace a node's value, returning the old one.
    pub fn set_value(&mut self, id: NodeId, value: V) -> TreeResult<V> {
        let node = self.nodes.get_mut(id).ok_or(TreeError::InvalidNodeId)?;
        Ok(std::mem::replace(&mut node.value, value))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Get the children of a node. Unknown IDs have no children.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Get the parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Follow parent links up to the node with no parent.
    pub fn root(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Some(current)
    }

    /// Returns true if the node exists and has no parent.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.parent.is_none())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Get the index of a node among its siblings, `None` for roots.
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.position_in(parent, id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.position_in(parent, id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.position_in(parent, id)?;
        index
            .checked_sub(1)
            .and_then(|prev| self.children(parent).get(prev).copied())
    }

    /// The deepest last descendant of a node, `None` for childless nodes.
    pub fn last_descendant(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.last_child(id)?;
        while let Some(last) = self.last_child(current) {
            current = last;
        }
        Some(current)
    }

    /// The pre-order successor of a node.
    ///
    /// First child if any, else the next sibling, else the next sibling of
    /// the nearest ancestor that has one. `None` past the end of the tree.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(id) {
            return Some(child);
        }
        let mut current = id;
        loop {
            if let Some(sibling) = self.next_sibling(current) {
                return Some(sibling);
            }
            current = self.parent(current)?;
        }
    }

    /// The pre-order predecessor of a node.
    ///
    /// The previous sibling's deepest last descendant (or the sibling itself),
    /// else the parent. `None` at the root.
    pub fn previous(&self, id: NodeId) -> Option<NodeId> {
        match self.previous_sibling(id) {
            Some(sibling) => Some(self.last_descendant(sibling).unwrap_or(sibling)),
            None => self.parent(id),
        }
    }

    /// Check if `ancestor` is a proper ancestor of `id`.
    #[doc(alias = "is_child_of")]
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(current_id) = current {
            if current_id == ancestor {
                return true;
            }
            current = self.parent(current_id);
        }
        false
    }

    /// Compare two nodes in document (pre-order) order.
    ///
    /// Ancestor chains are walked from the root down. At the first point where
    /// they diverge the two nodes share a parent, and the one with the lower
    /// sibling index comes first. An ancestor comes before its descendants.
    ///
    /// Returns `Equal` only for identical nodes. Nodes of disjoint trees have
    /// no defined order and also compare `Equal`; callers must not rely on it.
    #[doc(alias = "is_before")]
    pub fn cmp_document_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }

        let chain_a = self.chain(a);
        let chain_b = self.chain(b);

        for (&x, &y) in chain_a.iter().zip(&chain_b) {
            if x != y {
                let Some(parent) = self.parent(x) else {
                    return Ordering::Equal;
                };
                return self.position_in(parent, x).cmp(&self.position_in(parent, y));
            }
        }
        chain_a.len().cmp(&chain_b.len())
    }

    // =========================================================================
    // Structural Mutation
    // =========================================================================

    /// Insert `node` into `parent` just before `reference`.
    ///
    /// `node` is detached from its current parent first. With no reference
    /// the node is appended. This is the primitive every other positional
    /// insert reduces to.
    ///
    /// # Errors
    ///
    /// - [`TreeError::InvalidNodeId`] if any ID is unknown
    /// - [`TreeError::NotAChild`] if `reference` is not a child of `parent`
    /// - [`TreeError::CircularParentage`] if `node` is `parent` or one of its ancestors
    #[tracing::instrument(skip(self), target = "arbor_core::tree", level = "trace")]
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        reference: Option<NodeId>,
        node: NodeId,
    ) -> TreeResult<()> {
        self.validate_insert(parent, reference, node)?;
        if reference == Some(node) {
            return Ok(());
        }

        self.detach(node);
        let index = match reference {
            Some(reference) => self
                .position_in(parent, reference)
                .ok_or(TreeError::NotAChild)?,
            None => self.children(parent).len(),
        };
        self.attach(parent, index, node);
        Ok(())
    }

    /// Insert `node` into `parent` just after `reference`.
    ///
    /// With no reference the node becomes the first child.
    pub fn insert_after(
        &mut self,
        parent: NodeId,
        reference: Option<NodeId>,
        node: NodeId,
    ) -> TreeResult<()> {
        self.validate_insert(parent, reference, node)?;
        let before = match reference {
            Some(reference) => self.next_sibling(reference),
            None => self.first_child(parent),
        };
        self.insert_before(parent, before, node)
    }

    /// Append `node` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        self.insert_before(parent, None, node)
    }

    /// Insert `node` as the sibling right before `sibling`.
    pub fn before(&mut self, sibling: NodeId, node: NodeId) -> TreeResult<()> {
        let parent = self.parent_for_sibling_insert(sibling)?;
        self.insert_before(parent, Some(sibling), node)
    }

    /// Insert `node` as the sibling right after `sibling`.
    pub fn after(&mut self, sibling: NodeId, node: NodeId) -> TreeResult<()> {
        let parent = self.parent_for_sibling_insert(sibling)?;
        self.insert_after(parent, Some(sibling), node)
    }

    /// Detach a node from its parent.
    ///
    /// The node and its subtree stay in the arena as a standalone tree.
    /// Returns `false` if the node was already a root.
    pub fn remove(&mut self, node: NodeId) -> TreeResult<bool> {
        if !self.contains(node) {
            return Err(TreeError::InvalidNodeId);
        }
        Ok(self.detach(node).is_some())
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(TreeError::InvalidNodeId);
        }
        if self.parent(child) != Some(parent) {
            return Err(TreeError::NotAChild);
        }
        self.detach(child);
        Ok(())
    }

    /// Stable in-place sort of the direct children of `parent` by value.
    pub fn sort_children<F>(&mut self, parent: NodeId, mut compare: F) -> TreeResult<()>
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        let node = self.nodes.get_mut(parent).ok_or(TreeError::InvalidNodeId)?;
        let mut children = std::mem::take(&mut node.children);

        children.sort_by(|&a, &b| match (self.nodes.get(a), self.nodes.get(b)) {
            (Some(a), Some(b)) => compare(&a.value, &b.value),
            _ => Ordering::Equal,
        });

        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = children;
        }
        Ok(())
    }

    /// Detach a node and free it together with its whole subtree.
    ///
    /// Returns the number of nodes freed.
    #[tracing::instrument(skip(self), target = "arbor_core::tree", level = "trace")]
    pub fn destroy(&mut self, node: NodeId) -> TreeResult<usize> {
        if !self.contains(node) {
            return Err(TreeError::InvalidNodeId);
        }
        self.detach(node);

        let doomed: Vec<NodeId> = self.preorder(node).collect();
        for &id in &doomed {
            self.nodes.remove(id);
        }
        tracing::trace!(target: targets::TREE, ?node, freed = doomed.len(), "destroyed subtree");
        Ok(doomed.len())
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Siblings before `child` in `parent`, nearest first.
    ///
    /// Empty if `child` is not a child of `parent`.
    pub fn children_before(
        &self,
        parent: NodeId,
        child: NodeId,
    ) -> impl Iterator<Item = NodeId> + '_ {
        let siblings = self.children(parent);
        let end = self.position_in(parent, child).unwrap_or(0);
        siblings[..end].iter().rev().copied()
    }

    /// Siblings after `child` in `parent`, nearest first.
    ///
    /// Empty if `child` is not a child of `parent`.
    pub fn children_after(
        &self,
        parent: NodeId,
        child: NodeId,
    ) -> impl Iterator<Item = NodeId> + '_ {
        let siblings = self.children(parent);
        let start = self
            .position_in(parent, child)
            .map_or(siblings.len(), |index| index + 1);
        siblings[start..].iter().copied()
    }

    /// Siblings before a node, nearest first.
    pub fn previous_siblings(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.parent(id)
            .map(|parent| self.children_before(parent, id))
            .into_iter()
            .flatten()
    }

    /// Siblings after a node, nearest first.
    pub fn next_siblings(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.parent(id)
            .map(|parent| self.children_after(parent, id))
            .into_iter()
            .flatten()
    }

    /// Pre-order walk over the subtree below a node, excluding the node.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_, V> {
        Descendants {
            tree: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    /// Pre-order walk over a node and its subtree.
    pub fn preorder(&self, id: NodeId) -> Descendants<'_, V> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// Ancestors of a node from the root down to its parent.
    pub fn ancestors(&self, id: NodeId) -> impl DoubleEndedIterator<Item = NodeId> {
        let mut chain = self.chain(id);
        chain.pop();
        chain.into_iter()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// The root-to-node chain including the node itself.
    fn chain(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut chain = vec![id];
        let mut current = self.parent(id);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent(parent);
        }
        chain.reverse();
        chain
    }

    fn position_in(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    fn validate_insert(
        &self,
        parent: NodeId,
        reference: Option<NodeId>,
        node: NodeId,
    ) -> TreeResult<()> {
        if !self.contains(parent) || !self.contains(node) {
            return Err(TreeError::InvalidNodeId);
        }
        if node == parent || self.is_descendant_of(parent, node) {
            return Err(TreeError::CircularParentage);
        }
        if let Some(reference) = reference {
            if !self.contains(reference) {
                return Err(TreeError::InvalidNodeId);
            }
            if self.parent(reference) != Some(parent) {
                return Err(TreeError::NotAChild);
            }
        }
        Ok(())
    }

    fn parent_for_sibling_insert(&self, sibling: NodeId) -> TreeResult<NodeId> {
        if !self.contains(sibling) {
            return Err(TreeError::InvalidNodeId);
        }
        self.parent(sibling).ok_or(TreeError::NoParent)
    }

    /// Unlink a node from its parent. Returns the old parent.
    fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get_mut(node)?.parent.take()?;
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&child| child != node);
        }
        Some(parent)
    }

    fn attach(&mut self, parent: NodeId, index: usize, node: NodeId) {
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.insert(index, node);
        }
        if let Some(child) = self.nodes.get_mut(node) {
            child.parent = Some(parent);
        }
    }
}

impl<V: Clone> Tree<V> {
    /// Deep copy a subtree inside this arena.
    ///
    /// The copy gets fresh IDs, the same values and shape, and no parent.
    pub fn clone_subtree(&mut self, node: NodeId) -> TreeResult<NodeId> {
        let plan = self.copy_plan(node)?;
        self.build_from_plan(plan)
    }

    /// Deep copy a subtree of another arena into this one.
    ///
    /// The copy gets fresh IDs in this arena and no parent.
    pub fn import_subtree(&mut self, source: &Tree<V>, node: NodeId) -> TreeResult<NodeId> {
        let plan = source.copy_plan(node)?;
        self.build_from_plan(plan)
    }

    /// Pre-order list of (id, parent, value) for a subtree. The subtree
    /// root is recorded without a parent.
    fn copy_plan(&self, node: NodeId) -> TreeResult<Vec<CopyStep<V>>> {
        if !self.contains(node) {
            return Err(TreeError::InvalidNodeId);
        }
        Ok(self
            .preorder(node)
            .filter_map(|id| {
                let entry = self.nodes.get(id)?;
                let parent = if id == node { None } else { entry.parent };
                Some((id, parent, entry.value.clone()))
            })
            .collect())
    }

    fn build_from_plan(&mut self, plan: Vec<CopyStep<V>>) -> TreeResult<NodeId> {
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::with_capacity(plan.len());
        let mut root = None;

        for (old_id, old_parent, value) in plan {
            let new_id = self.nodes.insert(Node {
                value,
                parent: None,
                children: Vec::new(),
            });
            match old_parent.and_then(|parent| mapping.get(&parent).copied()) {
                Some(new_parent) => {
                    let len = self.children(new_parent).len();
                    self.attach(new_parent, len, new_id);
                }
                None => root = Some(new_id),
            }
            mapping.insert(old_id, new_id);
        }

        root.ok_or(TreeError::InvalidNodeId)
    }
}

/// Lazy pre-order iterator over a subtree.
///
/// Created by [`Tree::descendants`] and [`Tree::preorder`].
pub struct Descendants<'a, V> {
    tree: &'a Tree<V>,
    stack: Vec<NodeId>,
}

impl<V> Iterator for Descendants<'_, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

static_assertions::assert_impl_all!(Tree<String>: Send, Sync);
