//! Change notifications emitted by [`TreeModel`](super::TreeModel).

use arbor_core::NodeId;

/// One observable effect of a model command.
///
/// Events are delivered synchronously and in order. Replaying them from the
/// first event onward is enough to mirror the document, selection, cursor
/// and collapse state without reading the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent<V> {
    /// A node entered the document.
    ///
    /// `next_sibling` has always been announced before this event, so a
    /// mirror can place the node right before it (or append when `None`).
    Insert {
        node: NodeId,
        parent: Option<NodeId>,
        next_sibling: Option<NodeId>,
        value: V,
    },
    /// A node and its subtree left the document.
    Remove { node: NodeId },
    /// A node's value was replaced.
    ChangeValue { node: NodeId, value: V },
    AddToSelection { node: NodeId },
    RemoveFromSelection { node: NodeId },
    /// The cursor moved, possibly to nowhere.
    MoveCursor { node: Option<NodeId> },
    /// A collapsed node was expanded.
    Open { node: NodeId },
    /// A node was collapsed.
    Close { node: NodeId },
    /// A command that changed the document finished. `node` is the document root.
    TreeChange { node: NodeId },
}

impl<V> ModelEvent<V> {
    /// The node this event is about, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Insert { node, .. }
            | Self::Remove { node }
            | Self::ChangeValue { node, .. }
            | Self::AddToSelection { node }
            | Self::RemoveFromSelection { node }
            | Self::Open { node }
            | Self::Close { node }
            | Self::TreeChange { node } => Some(*node),
            Self::MoveCursor { node } => *node,
        }
    }

    /// Short lowercase name of the event kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Remove { .. } => "remove",
            Self::ChangeValue { .. } => "change-value",
            Self::AddToSelection { .. } => "add-to-selection",
            Self::RemoveFromSelection { .. } => "remove-from-selection",
            Self::MoveCursor { .. } => "move-cursor",
            Self::Open { .. } => "open",
            Self::Close { .. } => "close",
            Self::TreeChange { .. } => "tree-change",
        }
    }
}
