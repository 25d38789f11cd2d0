//! Interval Maintenance
//!
//! Keeps the nested-set invariant consistent as single nodes are added to or
//! removed from a tree. Every mutation is expressed as two bulk range shifts
//! over the whole collection: one over `left`, one over `right`. Only records
//! whose bound lies beyond the pivot are touched, and that set is found by
//! comparison, not traversal.
//!
//! A branch whose parent or siblings carry no interval is treated as "not
//! built": the mutation is skipped and the node stays interval-less until the
//! next rebuild. Skips are reported as outcomes, never as errors.
//!
//! The read-then-shift sequence is not atomic. Concurrent mutations touching
//! the same interval space can interleave and corrupt the index; callers must
//! serialize writers (see `concurrency::TreeLockManager`) or rebuild
//! periodically.

use crate::error::{ApiError, StorageError};
use crate::store::{Filter, Node, RecordStore, Shift};
use crate::types::{Field, Interval, NodeId};
use tracing::debug;

/// Why a mutation left the interval space untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The node has no parent; roots are seeded explicitly or by rebuild.
    Root,
    /// The node already carries an interval.
    AlreadyPlaced,
    ParentMissing,
    ParentNotBuilt,
    SiblingsNotBuilt,
    /// The node being removed has no interval, so there is no gap to close.
    NodeNotBuilt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Placed(Interval),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Bounds beyond `pivot` were moved down by `width`.
    Closed { pivot: u64, width: u64 },
    Skipped(SkipReason),
}

/// Parent and siblings of a node, once both are known to be built.
enum Neighbourhood {
    Built { parent: Node, siblings: Vec<Node> },
    Unbuilt(SkipReason),
}

pub struct IntervalMaintainer<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> IntervalMaintainer<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        IntervalMaintainer { store }
    }

    /// Assign an interval to `node`, which is about to be persisted.
    ///
    /// On `Placed`, every record beyond the insertion point has already been
    /// shifted up by two and `node.interval` is set; the caller persists it.
    pub fn on_insert(&self, node: &mut Node) -> Result<InsertOutcome, ApiError> {
        if node.interval.is_some() {
            return Ok(self.skip_insert(node.id, SkipReason::AlreadyPlaced));
        }
        let (parent, siblings) = match self.neighbourhood(node)? {
            Neighbourhood::Built { parent, siblings } => (parent, siblings),
            Neighbourhood::Unbuilt(reason) => return Ok(self.skip_insert(node.id, reason)),
        };
        let parent_interval = match parent.interval {
            Some(interval) => interval,
            None => return Ok(self.skip_insert(node.id, SkipReason::ParentNotBuilt)),
        };

        // Right after the last sibling, or right after the parent's left bound.
        let point = siblings
            .iter()
            .filter_map(Node::right)
            .max()
            .unwrap_or(parent_interval.left);

        let right = point
            .checked_add(2)
            .ok_or(StorageError::IntervalOutOfRange(node.id))?;
        let (lefts, rights) = self.shift_beyond(point, 2)?;
        let interval = Interval::new(point + 1, right);
        node.interval = Some(interval);
        debug!(
            node = %node.id,
            parent = %parent.id,
            point,
            lefts,
            rights,
            "placed node at {}",
            interval
        );
        Ok(InsertOutcome::Placed(interval))
    }

    /// Close the gap `node` leaves behind. Call before the record is deleted.
    ///
    /// Bounds beyond the node's own `right` move down by the node's width (two
    /// for a leaf), so earlier siblings keep their intervals. Descendants of
    /// the node are not deleted here.
    pub fn on_remove(&self, node: &Node) -> Result<RemoveOutcome, ApiError> {
        match self.neighbourhood(node)? {
            Neighbourhood::Built { .. } => {}
            Neighbourhood::Unbuilt(reason) => return Ok(self.skip_remove(node.id, reason)),
        }
        let interval = match node.interval {
            Some(interval) => interval,
            None => return Ok(self.skip_remove(node.id, SkipReason::NodeNotBuilt)),
        };

        let pivot = interval.right;
        let width = interval.width();
        let (lefts, rights) = self.shift_beyond(pivot, -(width as i64))?;
        debug!(node = %node.id, pivot, width, lefts, rights, "closed gap");
        Ok(RemoveOutcome::Closed { pivot, width })
    }

    fn neighbourhood(&self, node: &Node) -> Result<Neighbourhood, ApiError> {
        let parent_id = match node.parent_id {
            Some(id) => id,
            None => return Ok(Neighbourhood::Unbuilt(SkipReason::Root)),
        };
        let parent = match self.store.find_by_id(&parent_id)? {
            Some(parent) => parent,
            None => return Ok(Neighbourhood::Unbuilt(SkipReason::ParentMissing)),
        };
        if !parent.is_built() {
            return Ok(Neighbourhood::Unbuilt(SkipReason::ParentNotBuilt));
        }
        let siblings = self
            .store
            .find_by_filter(&Filter::children_of(Some(parent_id)).excluding(node.id))?;
        if !siblings.iter().all(Node::is_built) {
            return Ok(Neighbourhood::Unbuilt(SkipReason::SiblingsNotBuilt));
        }
        Ok(Neighbourhood::Built { parent, siblings })
    }

    /// Both shifts must finish before the caller assigns or drops an interval.
    fn shift_beyond(&self, pivot: u64, delta: i64) -> Result<(usize, usize), ApiError> {
        let lefts = self.store.bulk_update(
            &Filter::beyond(Field::Left, pivot),
            Shift::new(Field::Left, delta),
        )?;
        let rights = self.store.bulk_update(
            &Filter::beyond(Field::Right, pivot),
            Shift::new(Field::Right, delta),
        )?;
        Ok((lefts, rights))
    }

    fn skip_insert(&self, id: NodeId, reason: SkipReason) -> InsertOutcome {
        debug!(node = %id, ?reason, "insert left interval space untouched");
        InsertOutcome::Skipped(reason)
    }

    fn skip_remove(&self, id: NodeId, reason: SkipReason) -> RemoveOutcome {
        debug!(node = %id, ?reason, "remove left interval space untouched");
        RemoveOutcome::Skipped(reason)
    }
}
