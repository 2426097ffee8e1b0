//! Clipboard holding detached copies of subtrees.

use arbor_core::{NodeId, Tree, TreeError, TreeResult};

/// Copies of subtrees, stored in their own arena.
///
/// Entries never alias nodes of the document they were copied from. Each
/// entry is a root in [`Clipboard::store`], kept in copy order.
#[derive(Debug, Clone)]
pub struct Clipboard<V> {
    store: Tree<V>,
    entries: Vec<NodeId>,
}

impl<V> Default for Clipboard<V> {
    fn default() -> Self {
        Self {
            store: Tree::new(),
            entries: Vec::new(),
        }
    }
}

impl<V: Clone> Clipboard<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with deep copies of `roots` taken from `source`.
    ///
    /// All roots are checked first; on error the clipboard is left as it was.
    pub fn replace(&mut self, source: &Tree<V>, roots: &[NodeId]) -> TreeResult<()> {
        if roots.iter().any(|&root| !source.contains(root)) {
            return Err(TreeError::InvalidNodeId);
        }

        let mut store = Tree::new();
        let entries = roots
            .iter()
            .map(|&root| store.import_subtree(source, root))
            .collect::<TreeResult<Vec<_>>>()?;

        self.store = store;
        self.entries = entries;
        Ok(())
    }

    /// Top-level entry values in copy order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().filter_map(|&id| self.store.value(id))
    }
}

impl<V> Clipboard<V> {
    pub fn clear(&mut self) {
        self.store = Tree::new();
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entry roots in copy order.
    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    /// The arena holding the copies.
    pub fn store(&self) -> &Tree<V> {
        &self.store
    }
}
