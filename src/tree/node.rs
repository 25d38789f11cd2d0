//! Nested tree view types produced by `TreeBuilder::subtree_view`.

use crate::store::Node;
use serde::{Deserialize, Serialize};

/// A node annotated with its position in a built view.
///
/// `level` and `path` are relative to the root of the view they were built
/// for and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,
    /// Depth below the view root (root = 0).
    pub level: usize,
    /// Ids from the view root down to the parent, joined by the separator.
    /// Empty for the view root.
    pub path: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Total number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order walk over the subtree.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// Result of a subtree query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubtreeView {
    /// The root itself, with its descendants nested below it.
    Wrapped(TreeNode),
    /// Only the root's direct child subtrees.
    Unwrapped(Vec<TreeNode>),
}

impl SubtreeView {
    pub fn into_wrapped(self) -> Option<TreeNode> {
        match self {
            SubtreeView::Wrapped(root) => Some(root),
            SubtreeView::Unwrapped(_) => None,
        }
    }

    pub fn into_children(self) -> Vec<TreeNode> {
        match self {
            SubtreeView::Wrapped(root) => root.children,
            SubtreeView::Unwrapped(children) => children,
        }
    }
}
