//! Logging and debugging facilities for Arbor.
//!
//! This module provides:
//! - Target names for filtering `tracing` output
//! - Debug visualization for trees held in a [`Tree`] arena
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Arbor uses the `tracing` crate for instrumentation. To see logs, install a
//! tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("arbor=debug,arbor_core=trace")
//!         .init();
//! }
//! ```
//!
//! # Debug Visualization
//!
//! ```
//! use arbor_core::Tree;
//! use arbor_core::logging::TreeDebug;
//!
//! let mut tree = Tree::new();
//! let leaf = tree.create(2);
//! let root = tree.create_with_children(1, [leaf]).unwrap();
//!
//! assert_eq!(TreeDebug::inline(&tree, root), "1[2]");
//! println!("{}", TreeDebug::new().format_subtree(&tree, root).unwrap());
//! ```

use std::fmt::Display;

use crate::error::{TreeError, TreeResult};
use crate::tree::{NodeId, Tree};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Tree arena target.
    pub const TREE: &str = "arbor_core::tree";
    /// Event bus target.
    pub const BUS: &str = "arbor_core::bus";
    /// Model target.
    pub const MODEL: &str = "arbor::model";
    /// Performance spans.
    pub const PERF: &str = "arbor::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Dash-prefixed lines with no branch art.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to append node IDs.
    pub show_ids: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            style: TreeStyle::Compact,
            show_ids: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing trees.
#[derive(Debug, Clone, Default)]
pub struct TreeDebug {
    options: TreeFormatOptions,
}

impl TreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every tree in the arena, one root after another.
    pub fn format_all<V: Display>(&self, tree: &Tree<V>) -> String {
        let mut output = format!("Tree ({} total nodes):\n", tree.len());
        let mut roots = tree.roots().peekable();
        if roots.peek().is_none() {
            output.push_str("  (empty)\n");
        }
        for root in roots {
            self.format_subtree_into(tree, root, 0, true, &mut output);
        }
        output
    }

    /// Format a subtree starting from a specific node.
    pub fn format_subtree<V: Display>(&self, tree: &Tree<V>, root: NodeId) -> TreeResult<String> {
        if !tree.contains(root) {
            return Err(TreeError::InvalidNodeId);
        }
        let mut output = String::new();
        self.format_subtree_into(tree, root, 0, true, &mut output);
        Ok(output)
    }

    /// Single-line bracket form, e.g. `1[2[3[4]],5,6,7]`.
    ///
    /// Unknown nodes render as an empty string.
    pub fn inline<V: Display>(tree: &Tree<V>, node: NodeId) -> String {
        let mut output = String::new();
        Self::inline_into(tree, node, &mut output);
        output
    }

    fn inline_into<V: Display>(tree: &Tree<V>, node: NodeId, output: &mut String) {
        let Some(value) = tree.value(node) else {
            return;
        };
        output.push_str(&value.to_string());

        let children = tree.children(node);
        if children.is_empty() {
            return;
        }
        output.push('[');
        for (i, &child) in children.iter().enumerate() {
            if i > 0 {
                output.push(',');
            }
            Self::inline_into(tree, child, output);
        }
        output.push(']');
    }

    fn format_subtree_into<V: Display>(
        &self,
        tree: &Tree<V>,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let Some(value) = tree.value(id) else {
            return;
        };

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(&value.to_string());
        if self.options.show_ids {
            output.push_str(&format!(" [{id:?}]"));
        }
        output.push('\n');

        let children = tree.children(id);
        let child_count = children.len();
        for (i, &child) in children.iter().enumerate() {
            self.format_subtree_into(tree, child, depth + 1, i + 1 == child_count, output);
        }
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing a whole command with a span-aware subscriber.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
