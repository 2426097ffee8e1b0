//! Error types for Arbor tree operations.

/// Result type alias for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// Errors that can occur during structural tree operations.
///
/// Every mutator validates its inputs before touching the arena, so an `Err`
/// always means the tree is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node ID is unknown or the node has been destroyed.
    #[error("Invalid or destroyed node ID")]
    InvalidNodeId,

    /// The reference node is not a direct child of the target parent.
    #[error("Reference node is not a child of the target parent")]
    NotAChild,

    /// A sibling-relative insert was requested next to a root node.
    #[error("Node has no parent to insert a sibling into")]
    NoParent,

    /// Attempted to insert a node into itself or one of its descendants.
    #[error("Cannot insert a node into itself or one of its descendants")]
    CircularParentage,
}
