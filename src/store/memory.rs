//! In-memory record store, used by tests and by hosts that keep the whole
//! collection resident.

use crate::error::StorageError;
use crate::store::{Filter, Node, RecordStore, Shift};
use crate::types::NodeId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct MemoryRecordStore {
    nodes: RwLock<BTreeMap<NodeId, Node>>,
    next: AtomicU64,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        MemoryRecordStore {
            nodes: RwLock::new(BTreeMap::new()),
            next: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Snapshot of every record in store order.
    pub fn all(&self) -> Vec<Node> {
        self.nodes.read().values().cloned().collect()
    }
}

impl RecordStore for MemoryRecordStore {
    fn next_id(&self) -> Result<NodeId, StorageError> {
        Ok(NodeId(self.next.fetch_add(1, Ordering::SeqCst)))
    }

    fn find_by_id(&self, id: &NodeId) -> Result<Option<Node>, StorageError> {
        Ok(self.nodes.read().get(id).cloned())
    }

    fn find_by_filter(&self, filter: &Filter) -> Result<Vec<Node>, StorageError> {
        Ok(self
            .nodes
            .read()
            .values()
            .filter(|node| filter.matches(node))
            .cloned()
            .collect())
    }

    fn bulk_update(&self, filter: &Filter, shift: Shift) -> Result<usize, StorageError> {
        let mut nodes = self.nodes.write();
        // Validate first so a failing shift leaves the map untouched.
        let mut updated = Vec::new();
        for node in nodes.values().filter(|node| filter.matches(node)) {
            let mut next = node.clone();
            shift.apply(&mut next)?;
            updated.push(next);
        }
        let count = updated.len();
        for node in updated {
            nodes.insert(node.id, node);
        }
        Ok(count)
    }

    fn persist(&self, node: &Node) -> Result<(), StorageError> {
        // Keep externally chosen ids from colliding with future allocations.
        self.next.fetch_max(node.id.0.saturating_add(1), Ordering::SeqCst);
        self.nodes.write().insert(node.id, node.clone());
        Ok(())
    }

    fn remove(&self, id: &NodeId) -> Result<(), StorageError> {
        self.nodes.write().remove(id);
        Ok(())
    }
}
