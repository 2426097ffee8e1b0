//! Injected container and ordering policy for tree models.
//!
//! A [`TreeModel`] does not know what its values mean. Two closures supplied
//! at construction decide:
//!
//! - whether a node is a leaf (accepts siblings) or a container (accepts
//!   children), used to resolve paste and drop targets
//! - optionally, how sibling values are ordered. With a comparator every
//!   insertion is placed by value and positional hints are ignored.
//!
//! # Example
//!
//! ```
//! use arbor::model::TreeModelBuilder;
//! use arbor_core::Tree;
//!
//! let mut tree = Tree::new();
//! let root = tree.create(String::from("/"));
//!
//! let model = TreeModelBuilder::new(tree, root)
//!     .leaf_when(|tree, node| tree.value(node).is_some_and(|v| !v.ends_with('/')))
//!     .sorted_by(|a: &String, b: &String| a.cmp(b))
//!     .build()
//!     .unwrap();
//!
//! assert!(!model.is_leaf(root));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use arbor_core::{NodeId, Tree};

use super::TreeModel;
use crate::error::ModelResult;

/// Decides whether a node is a leaf.
pub type LeafPredicate<V> = Arc<dyn Fn(&Tree<V>, NodeId) -> bool + Send + Sync>;

/// Orders sibling values.
pub type SortComparator<V> = Arc<dyn Fn(&V, &V) -> Ordering + Send + Sync>;

/// The leaf predicate and optional sort comparator of a model.
///
/// The default policy treats every node as a container and keeps insertion
/// order.
pub struct ModelPolicy<V> {
    is_leaf: LeafPredicate<V>,
    sort: Option<SortComparator<V>>,
}

impl<V> ModelPolicy<V> {
    /// Create a policy with the given leaf predicate and no sorting.
    pub fn new<F>(is_leaf: F) -> Self
    where
        F: Fn(&Tree<V>, NodeId) -> bool + Send + Sync + 'static,
    {
        Self {
            is_leaf: Arc::new(is_leaf),
            sort: None,
        }
    }

    /// Add a sort comparator.
    pub fn with_sort<F>(mut self, compare: F) -> Self
    where
        F: Fn(&V, &V) -> Ordering + Send + Sync + 'static,
    {
        self.sort = Some(Arc::new(compare));
        self
    }

    pub fn is_leaf(&self, tree: &Tree<V>, node: NodeId) -> bool {
        (self.is_leaf)(tree, node)
    }

    pub fn is_sorted(&self) -> bool {
        self.sort.is_some()
    }

    /// Where a node with `value` belongs among the children of `parent`.
    ///
    /// Returns the first child (other than `node` itself) whose value sorts
    /// strictly after `value`; `None` means append. Returns `None` as well
    /// when no comparator is set.
    pub fn sorted_reference(
        &self,
        tree: &Tree<V>,
        parent: NodeId,
        node: NodeId,
        value: &V,
    ) -> Option<NodeId> {
        let compare = self.sort.as_ref()?;
        tree.children(parent).iter().copied().find(|&child| {
            child != node
                && tree
                    .value(child)
                    .is_some_and(|other| compare(value, other) == Ordering::Less)
        })
    }
}

impl<V: 'static> Default for ModelPolicy<V> {
    fn default() -> Self {
        Self::new(|_, _| false)
    }
}

impl<V> Clone for ModelPolicy<V> {
    fn clone(&self) -> Self {
        Self {
            is_leaf: Arc::clone(&self.is_leaf),
            sort: self.sort.clone(),
        }
    }
}

impl<V> fmt::Debug for ModelPolicy<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPolicy")
            .field("sorted", &self.is_sorted())
            .finish_non_exhaustive()
    }
}

/// Builder pattern for creating tree models.
pub struct TreeModelBuilder<V> {
    tree: Tree<V>,
    root: NodeId,
    policy: ModelPolicy<V>,
}

impl<V: Clone + 'static> TreeModelBuilder<V> {
    /// Start from an arena and the node to use as document root.
    pub fn new(tree: Tree<V>, root: NodeId) -> Self {
        Self {
            tree,
            root,
            policy: ModelPolicy::default(),
        }
    }

    /// Sets the leaf predicate.
    pub fn leaf_when<F>(mut self, is_leaf: F) -> Self
    where
        F: Fn(&Tree<V>, NodeId) -> bool + Send + Sync + 'static,
    {
        self.policy.is_leaf = Arc::new(is_leaf);
        self
    }

    /// Sets the sibling comparator.
    pub fn sorted_by<F>(mut self, compare: F) -> Self
    where
        F: Fn(&V, &V) -> Ordering + Send + Sync + 'static,
    {
        self.policy.sort = Some(Arc::new(compare));
        self
    }

    /// Builds the model.
    pub fn build(self) -> ModelResult<TreeModel<V>> {
        TreeModel::with_policy(self.tree, self.root, self.policy)
    }
}
