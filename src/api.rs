//! NestedSet API
//!
//! The interception point between callers and the record store: every insert
//! runs the maintainer before the record is persisted, every remove runs it
//! before the record is deleted. Nothing happens implicitly on `persist`;
//! writing through the store directly bypasses interval maintenance.

use crate::config::TreeConfig;
use crate::error::{ApiError, StorageError};
use crate::maintainer::{InsertOutcome, IntervalMaintainer, RemoveOutcome};
use crate::store::{Filter, Node, RecordStore};
use crate::tree::{RebuildAllReport, RebuildReport, SubtreeView, TreeBuilder, TreeNode};
use crate::types::{Interval, NodeId};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a subtree removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedSubtree {
    /// Removed records, the subtree root first.
    pub removed: Vec<NodeId>,
    pub outcome: RemoveOutcome,
}

pub struct NestedSet {
    store: Arc<dyn RecordStore>,
    config: TreeConfig,
}

impl NestedSet {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_config(store, TreeConfig::default())
    }

    pub fn with_config(store: Arc<dyn RecordStore>, config: TreeConfig) -> Self {
        NestedSet { store, config }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn maintainer(&self) -> IntervalMaintainer<'_> {
        IntervalMaintainer::new(self.store.as_ref())
    }

    /// Tree builder bound to this collection and its configured root and separator.
    pub fn builder(&self) -> TreeBuilder<'_> {
        TreeBuilder::new(self.store.as_ref()).with_config(&self.config)
    }

    /// Create a child of `parent` and place it after its last sibling.
    ///
    /// `parent == None` creates an unplaced root; use `insert_root` to get a
    /// root that is placed right away. The returned node carries whatever
    /// interval the maintainer assigned (none when the branch is not built).
    pub fn insert(
        &self,
        parent: Option<NodeId>,
        metadata: BTreeMap<String, String>,
    ) -> Result<(Node, InsertOutcome), ApiError> {
        let id = self.store.next_id()?;
        let mut node = Node::new(id, parent).with_metadata(metadata);
        let outcome = self.maintainer().on_insert(&mut node)?;
        self.store.persist(&node)?;
        debug!(node = %id, parent = ?parent, ?outcome, "inserted node");
        Ok((node, outcome))
    }

    /// Create a new root placed after every interval already in the collection.
    pub fn insert_root(&self, metadata: BTreeMap<String, String>) -> Result<Node, ApiError> {
        let id = self.store.next_id()?;
        let out_of_range = || StorageError::IntervalOutOfRange(id);
        let left = match self.store.max_right()? {
            Some(right) => right.checked_add(1).ok_or_else(out_of_range)?,
            None => 1,
        };
        let right = left.checked_add(1).ok_or_else(out_of_range)?;
        let mut node = Node::new(id, None).with_metadata(metadata);
        node.interval = Some(Interval::new(left, right));
        self.store.persist(&node)?;
        debug!(node = %id, left, "inserted root");
        Ok(node)
    }

    /// Remove a single record, closing the gap it leaves.
    ///
    /// Fails with `HasChildren` while the node still has children.
    pub fn remove(&self, id: &NodeId) -> Result<RemoveOutcome, ApiError> {
        let node = self.require(id)?;
        let children = self.store.find_by_filter(&Filter::children_of(Some(*id)))?;
        if !children.is_empty() {
            return Err(ApiError::HasChildren(*id));
        }
        let outcome = self.maintainer().on_remove(&node)?;
        self.store.remove(id)?;
        debug!(node = %id, ?outcome, "removed node");
        Ok(outcome)
    }

    /// Remove a node and every descendant reachable by parent pointer.
    ///
    /// The gap is closed once, by the width of the subtree root's interval,
    /// before any record is deleted.
    pub fn remove_subtree(&self, id: &NodeId) -> Result<RemovedSubtree, ApiError> {
        let node = self.require(id)?;

        let mut removed = vec![node.id];
        let mut seen = HashSet::from([node.id]);
        let mut pending = vec![node.id];
        while let Some(current) = pending.pop() {
            for child in self.store.find_by_filter(&Filter::children_of(Some(current)))? {
                if !seen.insert(child.id) {
                    return Err(ApiError::Cycle(child.id));
                }
                removed.push(child.id);
                pending.push(child.id);
            }
        }

        let outcome = self.maintainer().on_remove(&node)?;
        for id in &removed {
            self.store.remove(id)?;
        }
        info!(node = %node.id, removed = removed.len(), "removed subtree");
        Ok(RemovedSubtree { removed, outcome })
    }

    pub fn rebuild(&self, root: &NodeId, left_bound: u64) -> Result<RebuildReport, ApiError> {
        self.builder().rebuild(root, left_bound)
    }

    pub fn rebuild_all(&self) -> Result<RebuildAllReport, ApiError> {
        self.builder().rebuild_all()
    }

    pub fn get(&self, id: &NodeId) -> Result<Option<Node>, ApiError> {
        Ok(self.store.find_by_id(id)?)
    }

    pub fn ancestors(&self, id: &NodeId) -> Result<Vec<Node>, ApiError> {
        self.builder().ancestors(&self.require(id)?)
    }

    pub fn descendants(&self, id: &NodeId) -> Result<Vec<Node>, ApiError> {
        self.builder().descendants(&self.require(id)?)
    }

    pub fn siblings(&self, id: &NodeId) -> Result<Vec<Node>, ApiError> {
        self.builder().siblings(&self.require(id)?)
    }

    pub fn children(&self, id: &NodeId) -> Result<Vec<Node>, ApiError> {
        self.builder().children(&self.require(id)?)
    }

    pub fn parent(&self, id: &NodeId) -> Result<Option<Node>, ApiError> {
        self.builder().parent(&self.require(id)?)
    }

    /// Depth of the node, or `None` when it has no interval yet.
    pub fn level(&self, id: &NodeId) -> Result<Option<usize>, ApiError> {
        let node = self.require(id)?;
        if !node.is_built() {
            return Ok(None);
        }
        Ok(Some(self.builder().level(&node)?))
    }

    pub fn subtree_view(
        &self,
        root: Option<NodeId>,
        include_root: bool,
    ) -> Result<Option<SubtreeView>, ApiError> {
        self.builder().subtree_view(root, include_root)
    }

    pub fn tree(&self, root: Option<NodeId>) -> Result<Option<TreeNode>, ApiError> {
        self.builder().tree(root)
    }

    fn require(&self, id: &NodeId) -> Result<Node, ApiError> {
        self.store
            .find_by_id(id)?
            .ok_or(ApiError::NodeNotFound(*id))
    }
}
