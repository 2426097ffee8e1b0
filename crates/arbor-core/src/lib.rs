//! Core data structures for Arbor.
//!
//! This crate provides the building blocks the Arbor tree model is made of:
//!
//! - **Tree**: An arena of ordered n-ary trees with document-order navigation
//! - **Event Bus**: Synchronous publish/subscribe with snapshot dispatch
//! - **Logging**: Tracing targets, perf spans and a text tree formatter
//!
//! # Tree Example
//!
//! ```
//! use arbor_core::Tree;
//! use std::cmp::Ordering;
//!
//! let mut tree = Tree::new();
//! let a = tree.create("a");
//! let b = tree.create("b");
//! let root = tree.create_with_children("root", [b, a]).unwrap();
//!
//! tree.sort_children(root, |x, y| x.cmp(y)).unwrap();
//! assert_eq!(tree.children(root), &[a, b]);
//! assert_eq!(tree.cmp_document_order(root, b), Ordering::Less);
//! ```
//!
//! # Event Bus Example
//!
//! ```
//! use arbor_core::EventBus;
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! let bus = EventBus::<&'static str>::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let seen_clone = seen.clone();
//! bus.connect(move |event| seen_clone.lock().push(*event));
//! bus.emit(&"insert");
//!
//! assert_eq!(*seen.lock(), vec!["insert"]);
//! ```

pub mod bus;
mod error;
pub mod logging;
pub mod tree;

pub use bus::{EventBus, Observer, SubscriptionId};
pub use error::{TreeError, TreeResult};
pub use logging::{PerfSpan, TreeDebug, TreeFormatOptions, TreeStyle};
pub use tree::{Descendants, NodeId, Tree};
