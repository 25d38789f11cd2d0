//! Tree building and traversal over the interval index.

pub mod builder;
pub mod node;
pub mod query;

pub use builder::{RebuildAllReport, RebuildReport, TreeBuilder};
pub use node::{SubtreeView, TreeNode};
