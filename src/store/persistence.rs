//! Sled-backed record store.
//!
//! Records live in a dedicated tree keyed by the big-endian node id, so sled's
//! key order is the store's natural (creation) order. Values are bincode.
//! A `meta` tree holds the id floor: every id handed out or persisted raises
//! it, so `next_id` never returns an id that is already stored.

use crate::error::StorageError;
use crate::store::{Filter, Node, RecordStore, Shift};
use crate::types::NodeId;
use std::path::Path;

const NODES_TREE: &str = "nodes";
const META_TREE: &str = "meta";
const NEXT_ID_KEY: &[u8] = b"next_id";

pub struct SledRecordStore {
    db: sled::Db,
    nodes: sled::Tree,
    meta: sled::Tree,
}

impl SledRecordStore {
    /// Open (or create) a store at `path`.
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let nodes = db.open_tree(NODES_TREE)?;
        let meta = db.open_tree(META_TREE)?;
        let store = SledRecordStore { db, nodes, meta };
        // Stores written before the floor existed: start after the last key.
        if let Some((key, _)) = store.nodes.last()? {
            store.raise_floor(Self::id_from_key(&key)?.0.saturating_add(1))?;
        }
        Ok(store)
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn key(id: &NodeId) -> [u8; 8] {
        id.0.to_be_bytes()
    }

    fn id_from_key(key: &[u8]) -> Result<NodeId, StorageError> {
        let bytes = <[u8; 8]>::try_from(key)
            .map_err(|_| StorageError::Serialization(format!("bad node key {:?}", key)))?;
        Ok(NodeId(u64::from_be_bytes(bytes)))
    }

    /// Next unused id recorded in `meta`; 0 is never handed out.
    fn floor(bytes: Option<&[u8]>) -> u64 {
        bytes
            .and_then(|b| <[u8; 8]>::try_from(b).ok())
            .map(u64::from_be_bytes)
            .unwrap_or(1)
    }

    fn raise_floor(&self, at_least: u64) -> Result<(), StorageError> {
        self.meta.fetch_and_update(NEXT_ID_KEY, |current| {
            let next = Self::floor(current).max(at_least);
            Some(next.to_be_bytes().to_vec())
        })?;
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<Node, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn scan(&self) -> impl Iterator<Item = Result<Node, StorageError>> + '_ {
        self.nodes.iter().values().map(|value| {
            let value = value?;
            Self::decode(&value)
        })
    }
}

impl RecordStore for SledRecordStore {
    fn next_id(&self) -> Result<NodeId, StorageError> {
        let previous = self.meta.fetch_and_update(NEXT_ID_KEY, |current| {
            let next = Self::floor(current).saturating_add(1);
            Some(next.to_be_bytes().to_vec())
        })?;
        Ok(NodeId(Self::floor(previous.as_deref())))
    }

    fn find_by_id(&self, id: &NodeId) -> Result<Option<Node>, StorageError> {
        match self.nodes.get(Self::key(id))? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn find_by_filter(&self, filter: &Filter) -> Result<Vec<Node>, StorageError> {
        let mut matched = Vec::new();
        for node in self.scan() {
            let node = node?;
            if filter.matches(&node) {
                matched.push(node);
            }
        }
        Ok(matched)
    }

    fn bulk_update(&self, filter: &Filter, shift: Shift) -> Result<usize, StorageError> {
        let mut batch = sled::Batch::default();
        let mut count = 0;
        for node in self.scan() {
            let mut node = node?;
            if !filter.matches(&node) {
                continue;
            }
            shift.apply(&mut node)?;
            batch.insert(Self::key(&node.id).to_vec(), bincode::serialize(&node)?);
            count += 1;
        }
        self.nodes.apply_batch(batch)?;
        Ok(count)
    }

    fn persist(&self, node: &Node) -> Result<(), StorageError> {
        let bytes = bincode::serialize(node)?;
        self.raise_floor(node.id.0.saturating_add(1))?;
        self.nodes.insert(Self::key(&node.id), bytes)?;
        Ok(())
    }

    fn remove(&self, id: &NodeId) -> Result<(), StorageError> {
        self.nodes.remove(Self::key(id))?;
        Ok(())
    }
}
