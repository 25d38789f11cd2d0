//! Advisory per-tree locking
//!
//! Interval maintenance is a read-then-shift sequence that is not atomic
//! against other writers. Nothing in the core takes a lock; hosts that run
//! several writers in one process can serialize them per tree with
//! `TreeLockManager`, keyed by the tree's root. Readers may skip locking and
//! accept a transiently inconsistent view.
//!
//! Bulk shifts move every record beyond the pivot, including records of other
//! trees stored later in the same collection. Per-tree locks are only enough
//! when each tree owns its own collection; otherwise lock a single shared key
//! (`TreeLockManager::collection_lock`).

use crate::types::NodeId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-tree lock manager for writer serialization
pub struct TreeLockManager {
    locks: Arc<RwLock<HashMap<NodeId, Arc<RwLock<()>>>>>,
    collection: Arc<RwLock<()>>,
}

impl TreeLockManager {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
            collection: Arc::new(RwLock::new(())),
        }
    }

    /// Get the lock for the tree rooted at `root`, creating it on first use.
    ///
    /// Take the write guard around `insert`/`remove`/`rebuild`, the read guard
    /// around queries that must not observe a half-applied shift.
    pub fn get_lock(&self, root: &NodeId) -> Arc<RwLock<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(root) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        map.entry(*root)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Lock covering the whole collection.
    pub fn collection_lock(&self) -> Arc<RwLock<()>> {
        self.collection.clone()
    }

    /// Drop locks nobody holds a handle to.
    pub fn prune(&self) {
        self.locks.write().retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.read().is_empty()
    }
}

impl Default for TreeLockManager {
    fn default() -> Self {
        Self::new()
    }
}
