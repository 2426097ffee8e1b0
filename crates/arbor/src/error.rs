//! Error types for model commands.

use arbor_core::TreeError;

/// Result type alias for model commands.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while applying a model command.
///
/// Commands check every input before the first mutation, so an `Err` means
/// neither the document nor the selection changed and no event was emitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A structural tree operation was rejected.
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    /// The node is not reachable from the document root.
    #[error("Node is not part of the document")]
    NotInDocument,

    /// A node used as the document root still has a parent.
    #[error("Document root must not have a parent")]
    RootHasParent,

    /// The insertion anchor is one of the nodes being moved.
    #[error("Insertion anchor is one of the nodes being moved")]
    AnchorMoved,
}
