//! Invariant checking
//!
//! Verifies that the interval index agrees with the parent pointers: every
//! placed interval is well formed, intervals nest without crossing, and the
//! innermost placed interval enclosing a node belongs to the node's parent.
//! Together these give "A is an ancestor of B iff A's interval strictly
//! contains B's" for every placed pair.
//!
//! Interval-less records are reported as unbuilt, not as violations.

use crate::error::ApiError;
use crate::store::{Filter, Node, RecordStore};
use crate::types::NodeId;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// `right <= left`
    Malformed { id: NodeId },
    /// Two intervals overlap without one strictly containing the other.
    Crossing { outer: NodeId, inner: NodeId },
    /// The innermost enclosing interval does not belong to the parent.
    Misplaced {
        id: NodeId,
        parent: Option<NodeId>,
        enclosing: Option<NodeId>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub nodes: usize,
    pub unbuilt: Vec<NodeId>,
    pub violations: Vec<Violation>,
}

impl CheckReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check every record in `store`.
pub fn verify(store: &dyn RecordStore) -> Result<CheckReport, ApiError> {
    let all = store.find_by_filter(&Filter::all())?;
    Ok(verify_nodes(&all))
}

pub fn verify_nodes(all: &[Node]) -> CheckReport {
    let mut report = CheckReport {
        nodes: all.len(),
        ..CheckReport::default()
    };
    let by_id: HashMap<NodeId, &Node> = all.iter().map(|n| (n.id, n)).collect();

    let mut placed: Vec<&Node> = Vec::with_capacity(all.len());
    for node in all {
        match node.interval {
            None => report.unbuilt.push(node.id),
            Some(i) if i.right <= i.left => {
                report.violations.push(Violation::Malformed { id: node.id })
            }
            Some(_) => placed.push(node),
        }
    }
    placed.sort_by_key(|n| n.left());

    // Sweep in left order keeping the chain of open intervals.
    let mut open: Vec<&Node> = Vec::new();
    for node in placed {
        let (Some(left), Some(right)) = (node.left(), node.right()) else {
            continue;
        };
        while open.last().and_then(|top| top.right()).is_some_and(|r| r < left) {
            open.pop();
        }
        let enclosing = match open.last() {
            Some(top) if top.left() == Some(left) || top.right() <= Some(right) => {
                report.violations.push(Violation::Crossing {
                    outer: top.id,
                    inner: node.id,
                });
                continue;
            }
            Some(top) => Some(top.id),
            None => None,
        };

        let parent_built = node
            .parent_id
            .and_then(|p| by_id.get(&p))
            .map(|p| p.is_built());
        // A parent without an interval belongs to an unbuilt branch.
        if parent_built != Some(false) && enclosing != node.parent_id {
            report.violations.push(Violation::Misplaced {
                id: node.id,
                parent: node.parent_id,
                enclosing,
            });
        }
        open.push(node);
    }
    report
}
