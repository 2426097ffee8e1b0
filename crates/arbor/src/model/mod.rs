//! Headless tree editing model.
//!
//! This module turns an arena [`Tree`](arbor_core::Tree) into an editable
//! document with the state a tree editor needs around it:
//!
//! - **Selection**: a set of nodes, viewable in document order or collapsed
//!   to its topmost nodes
//! - **Cursor**: the single focused node used for range selection and paste
//! - **Clipboard**: detached copies of subtrees, pasteable any number of times
//! - **Collapse state**: open or closed per node
//!
//! Rendering and input handling stay outside. They drive the model through
//! its commands and follow it through the [`ModelEvent`] stream.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────┐  commands  ┌─────────────┐   events   ┌─────────────┐
//! │ Input / Drag │──────────> │  TreeModel  │──────────> │  Observers  │
//! └──────────────┘            │ Tree + state│  EventBus  │ (views etc) │
//!                             └─────────────┘            └─────────────┘
//! ```

mod clipboard;
mod event;
mod policy;
pub mod selection;
mod tree_model;

pub use clipboard::Clipboard;
pub use event::ModelEvent;
pub use policy::{LeafPredicate, ModelPolicy, SortComparator, TreeModelBuilder};
pub use selection::Selection;
pub use tree_model::TreeModel;
