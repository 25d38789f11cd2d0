//! Record Store
//!
//! The document-store collaborator the interval index runs against. Tree
//! relationships are expressed as store queries (by parent and by
//! `left`/`right` range) rather than as an in-memory pointer graph.

pub mod memory;
pub mod persistence;

pub use memory::MemoryRecordStore;
pub use persistence::SledRecordStore;

use crate::error::StorageError;
use crate::types::{Field, Interval, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node: one tree record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    /// `None` until the node has been placed by an insert or a rebuild.
    pub interval: Option<Interval>,
    /// Host document fields, carried but never interpreted by the index.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    pub fn new(id: NodeId, parent_id: Option<NodeId>) -> Self {
        Node {
            id,
            parent_id,
            interval: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn left(&self) -> Option<u64> {
        self.interval.map(|i| i.left)
    }

    pub fn right(&self) -> Option<u64> {
        self.interval.map(|i| i.right)
    }

    pub fn is_built(&self) -> bool {
        self.interval.is_some()
    }

    /// True if the node has an interval spanning no other node.
    pub fn is_leaf(&self) -> bool {
        self.interval.map(|i| i.is_leaf()).unwrap_or(false)
    }

    /// True if the node has a parent.
    pub fn is_child(&self) -> bool {
        self.parent_id.is_some()
    }

    /// True if `self` lies strictly inside `other`.
    pub fn is_descendant_of(&self, other: &Node) -> bool {
        match (self.interval, other.interval) {
            (Some(mine), Some(theirs)) => theirs.contains(&mine),
            _ => false,
        }
    }

    /// True if `other` lies strictly inside `self`.
    pub fn is_ancestor_of(&self, other: &Node) -> bool {
        other.is_descendant_of(self)
    }
}

/// Comparison against one interval bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Gt(u64),
    Gte(u64),
    Lt(u64),
    Lte(u64),
}

impl Bound {
    pub fn matches(self, value: u64) -> bool {
        match self {
            Bound::Gt(v) => value > v,
            Bound::Gte(v) => value >= v,
            Bound::Lt(v) => value < v,
            Bound::Lte(v) => value <= v,
        }
    }
}

/// Filter: conjunction of predicates over `id`, `parent_id`, `left` and `right`.
///
/// Nodes without an interval never match a `left`/`right` comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// `Some(p)` restricts to nodes whose `parent_id == p` (including `None`).
    pub parent: Option<Option<NodeId>>,
    pub exclude: Option<NodeId>,
    pub left: Vec<Bound>,
    pub right: Vec<Bound>,
}

impl Filter {
    pub fn all() -> Self {
        Filter::default()
    }

    /// Nodes whose parent is `parent`; `None` selects the roots.
    pub fn children_of(parent: Option<NodeId>) -> Self {
        Filter {
            parent: Some(parent),
            ..Filter::default()
        }
    }

    pub fn excluding(mut self, id: NodeId) -> Self {
        self.exclude = Some(id);
        self
    }

    pub fn left(mut self, bound: Bound) -> Self {
        self.left.push(bound);
        self
    }

    pub fn right(mut self, bound: Bound) -> Self {
        self.right.push(bound);
        self
    }

    /// Filter for a single bound of a shift: `field > pivot`.
    pub fn beyond(field: Field, pivot: u64) -> Self {
        match field {
            Field::Left => Filter::all().left(Bound::Gt(pivot)),
            Field::Right => Filter::all().right(Bound::Gt(pivot)),
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        if self.exclude == Some(node.id) {
            return false;
        }
        if let Some(parent) = self.parent {
            if node.parent_id != parent {
                return false;
            }
        }
        if self.left.is_empty() && self.right.is_empty() {
            return true;
        }
        match node.interval {
            Some(interval) => {
                self.left.iter().all(|b| b.matches(interval.left))
                    && self.right.iter().all(|b| b.matches(interval.right))
            }
            None => false,
        }
    }
}

/// Shift: additive delta applied to one bound of every matching record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub field: Field,
    pub delta: i64,
}

impl Shift {
    pub fn new(field: Field, delta: i64) -> Self {
        Shift { field, delta }
    }

    /// Apply the shift to a node in place.
    pub fn apply(&self, node: &mut Node) -> Result<(), StorageError> {
        if let Some(interval) = node.interval {
            let shifted = interval
                .shifted(self.field, self.delta)
                .ok_or(StorageError::IntervalOutOfRange(node.id))?;
            node.interval = Some(shifted);
        }
        Ok(())
    }
}

/// RecordStore interface
///
/// `find_by_filter` returns records in the store's natural order, which is
/// ascending `NodeId` (creation order). A single `bulk_update` call should be
/// applied as one write when the backend allows it.
pub trait RecordStore: Send + Sync {
    /// Allocate a fresh identifier for a record about to be persisted.
    fn next_id(&self) -> Result<NodeId, StorageError>;
    fn find_by_id(&self, id: &NodeId) -> Result<Option<Node>, StorageError>;
    fn find_by_filter(&self, filter: &Filter) -> Result<Vec<Node>, StorageError>;
    /// Apply `shift` to every record matching `filter`; returns the number affected.
    fn bulk_update(&self, filter: &Filter, shift: Shift) -> Result<usize, StorageError>;
    fn persist(&self, node: &Node) -> Result<(), StorageError>;
    fn remove(&self, id: &NodeId) -> Result<(), StorageError>;

    /// Largest `right` bound held by any record, if any record is placed.
    fn max_right(&self) -> Result<Option<u64>, StorageError> {
        let placed = self.find_by_filter(&Filter::all().right(Bound::Gte(0)))?;
        Ok(placed.iter().filter_map(Node::right).max())
    }
}
