//! Core types for the nested-set interval index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// NodeId: store-assigned identifier of a tree record.
///
/// Identifiers are allocated monotonically, so ascending `NodeId` order is the
/// store's natural (creation) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(NodeId)
    }
}

/// Which bound of an interval a shift applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Left,
    Right,
}

/// Interval: the `(left, right)` pair owned by a node.
///
/// A settled interval always has `right > left`. Bulk shifts move one bound at
/// a time, so a record may briefly hold `right <= left` between the two shifts
/// of a single mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub left: u64,
    pub right: u64,
}

impl Interval {
    pub fn new(left: u64, right: u64) -> Self {
        Interval { left, right }
    }

    /// Number of bound values the interval spans, inclusive of both ends.
    pub fn width(&self) -> u64 {
        self.right.saturating_sub(self.left) + 1
    }

    pub fn is_leaf(&self) -> bool {
        self.right > self.left && self.right - self.left == 1
    }

    /// True if `other` lies strictly inside this interval.
    pub fn contains(&self, other: &Interval) -> bool {
        self.left < other.left && other.right < self.right
    }

    /// True if the two intervals share no bound range.
    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.right < other.left || other.right < self.left
    }

    /// Apply an additive delta to one bound. Returns `None` on underflow/overflow.
    pub fn shifted(&self, field: Field, delta: i64) -> Option<Interval> {
        let mut next = *self;
        match field {
            Field::Left => next.left = self.left.checked_add_signed(delta)?,
            Field::Right => next.right = self.right.checked_add_signed(delta)?,
        }
        Some(next)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.left, self.right)
    }
}
