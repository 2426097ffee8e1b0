//! Arbor: a headless ordered-tree editing model.
//!
//! Arbor keeps a tree document consistent under editing: document-order
//! traversal, multi-node selection, a movable cursor, copy and paste, and
//! structural moves, all observable through a stream of change events. It
//! draws nothing and reads no input; views and controllers sit on top.
//!
//! # Crates
//!
//! - [`arbor_core`]: the arena [`Tree`], the [`EventBus`] and logging helpers
//! - `arbor` (this crate): [`TreeModel`] and its events
//!
//! # Example
//!
//! ```
//! use arbor::prelude::*;
//!
//! let mut tree = Tree::new();
//! let leaf = tree.create("notes.txt");
//! let root = tree.create_with_children("home", [leaf]).unwrap();
//!
//! let mut model = TreeModel::builder(tree, root)
//!     .leaf_when(|tree, node| tree.value(node).is_some_and(|name| name.contains('.')))
//!     .build()
//!     .unwrap();
//!
//! model.select_one(Some(leaf));
//! model.copy().unwrap();
//! model.paste().unwrap();
//!
//! assert_eq!(TreeDebug::inline(model.tree(), root), "home[notes.txt,notes.txt]");
//! ```

mod error;
pub mod model;
pub mod prelude;

pub use arbor_core::{
    logging, EventBus, NodeId, Observer, SubscriptionId, Tree, TreeDebug, TreeError, TreeResult,
};
pub use error::{ModelError, ModelResult};
pub use model::{ModelEvent, ModelPolicy, Selection, TreeModel, TreeModelBuilder};
