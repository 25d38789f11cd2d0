//! Nestedset: Interval Index for Hierarchical Records
//!
//! Keeps a nested-set index (`left`/`right` bounds) over parent-pointer
//! records held in a document store, so that ancestor, descendant and subtree
//! queries become single range predicates.

pub mod api;
pub mod check;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod maintainer;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;

pub use api::{NestedSet, RemovedSubtree};
pub use error::{ApiError, StorageError};
pub use maintainer::{InsertOutcome, IntervalMaintainer, RemoveOutcome, SkipReason};
pub use store::{Bound, Filter, MemoryRecordStore, Node, RecordStore, Shift, SledRecordStore};
pub use tree::{SubtreeView, TreeBuilder, TreeNode};
pub use types::{Field, Interval, NodeId};
