//! Tree Builder
//!
//! Rebuild path: recomputes every interval of a subtree from parent pointers
//! alone, in one depth-first pass. Subtree views: assembles a nested
//! `TreeNode` structure from the records inside a root's interval.
//!
//! Both walks use an explicit stack over an arena of records instead of
//! recursion, so deep trees do not grow the call stack.

use crate::config::TreeConfig;
use crate::error::{ApiError, StorageError};
use crate::store::{Bound, Filter, Node, RecordStore};
use crate::tree::node::{SubtreeView, TreeNode};
use crate::types::{Interval, NodeId};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Rebuild report
///
/// Summary of one rebuilt tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    /// Node the rebuild started from
    pub root: NodeId,
    /// Number of records that received an interval
    pub nodes: usize,
    /// Bounds assigned to the start node
    pub left: u64,
    pub right: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Outcome of rebuilding every tree in the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildAllReport {
    pub trees: Vec<RebuildReport>,
    /// Records unreachable from any root whose stale interval was cleared
    pub cleared: usize,
}

impl RebuildAllReport {
    pub fn nodes(&self) -> usize {
        self.trees.iter().map(|t| t.nodes).sum()
    }
}

/// Hand out the next bound for `id`. `u64::MAX` is never assigned.
fn next_bound(counter: &mut u64, id: NodeId) -> Result<u64, ApiError> {
    let value = *counter;
    *counter = value
        .checked_add(1)
        .ok_or(StorageError::IntervalOutOfRange(id))?;
    Ok(value)
}

/// One open node on the rebuild stack.
struct Frame {
    node: Node,
    left: u64,
    children: Vec<Node>,
    next: usize,
}

pub struct TreeBuilder<'a> {
    pub(crate) store: &'a dyn RecordStore,
    separator: String,
    default_root: Option<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        let defaults = TreeConfig::default();
        TreeBuilder {
            store,
            separator: defaults.separator,
            default_root: defaults.root,
        }
    }

    pub fn with_config(mut self, config: &TreeConfig) -> Self {
        self.separator = config.separator.clone();
        self.default_root = config.root;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Rebuild the intervals of `root_id` and all of its descendants,
    /// starting at `left_bound`. Prior interval values are ignored.
    ///
    /// Children are visited in store order, so sibling intervals follow
    /// creation order. Each record is persisted once its subtree is closed.
    pub fn rebuild(&self, root_id: &NodeId, left_bound: u64) -> Result<RebuildReport, ApiError> {
        let mut visited = HashSet::new();
        self.rebuild_with(root_id, left_bound, &mut visited)
    }

    fn rebuild_with(
        &self,
        root_id: &NodeId,
        left_bound: u64,
        visited: &mut HashSet<NodeId>,
    ) -> Result<RebuildReport, ApiError> {
        let start_time = Instant::now();
        let root = self
            .store
            .find_by_id(root_id)?
            .ok_or(ApiError::NodeNotFound(*root_id))?;

        let mut counter = left_bound;
        let mut nodes = 0;
        let mut root_interval = None;
        visited.insert(root.id);
        let mut stack = vec![self.open(root, &mut counter)?];

        while let Some(top) = stack.last_mut() {
            if top.next < top.children.len() {
                let child = top.children[top.next].clone();
                top.next += 1;
                if !visited.insert(child.id) {
                    warn!(node = %child.id, "parent pointers loop back during rebuild");
                    return Err(ApiError::Cycle(child.id));
                }
                let frame = self.open(child, &mut counter)?;
                stack.push(frame);
                continue;
            }

            let Some(Frame { mut node, left, .. }) = stack.pop() else {
                break;
            };
            let interval = Interval::new(left, next_bound(&mut counter, node.id)?);
            node.interval = Some(interval);
            self.store.persist(&node)?;
            nodes += 1;
            if stack.is_empty() {
                root_interval = Some(interval);
            }
        }
        let root_interval = root_interval.ok_or(ApiError::NodeNotFound(*root_id))?;

        let report = RebuildReport {
            root: *root_id,
            nodes,
            left: root_interval.left,
            right: root_interval.right,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };
        info!(
            root = %report.root,
            nodes = report.nodes,
            left = report.left,
            right = report.right,
            duration_ms = report.duration_ms,
            "rebuilt tree"
        );
        Ok(report)
    }

    fn open(&self, node: Node, counter: &mut u64) -> Result<Frame, ApiError> {
        let children = self
            .store
            .find_by_filter(&Filter::children_of(Some(node.id)))?;
        let left = next_bound(counter, node.id)?;
        Ok(Frame {
            node,
            left,
            children,
            next: 0,
        })
    }

    /// Rebuild every tree in the collection, one after another from 1.
    ///
    /// Roots are taken in store order and laid out consecutively so trees that
    /// share the collection never overlap. Records not reachable from any root
    /// (orphans, cycles) lose their interval.
    pub fn rebuild_all(&self) -> Result<RebuildAllReport, ApiError> {
        let roots = self.store.find_by_filter(&Filter::children_of(None))?;
        let mut visited = HashSet::new();
        let mut report = RebuildAllReport::default();
        let mut next_left = 1;
        for root in roots {
            let tree = self.rebuild_with(&root.id, next_left, &mut visited)?;
            next_left = tree
                .right
                .checked_add(1)
                .ok_or(StorageError::IntervalOutOfRange(tree.root))?;
            report.trees.push(tree);
        }

        let stale = self.store.find_by_filter(&Filter::all().left(Bound::Gte(0)))?;
        for mut node in stale.into_iter().filter(|n| !visited.contains(&n.id)) {
            debug!(node = %node.id, "clearing interval of unreachable record");
            node.interval = None;
            self.store.persist(&node)?;
            report.cleared += 1;
        }
        Ok(report)
    }

    /// Build the nested view of `root` (or the configured default root).
    ///
    /// Returns `None` when no root is given and none is configured, or when
    /// the root record does not exist. A root without records strictly inside
    /// its interval yields an empty list, or the bare root when wrapped.
    pub fn subtree_view(
        &self,
        root: Option<NodeId>,
        include_root: bool,
    ) -> Result<Option<SubtreeView>, ApiError> {
        let root_id = match root.or(self.default_root) {
            Some(id) => id,
            None => return Ok(None),
        };
        let root = match self.store.find_by_id(&root_id)? {
            Some(node) => node,
            None => return Ok(None),
        };
        let inside = match root.interval {
            Some(interval) => self.store.find_by_filter(
                &Filter::all()
                    .left(Bound::Gt(interval.left))
                    .right(Bound::Lt(interval.right)),
            )?,
            None => Vec::new(),
        };

        let tree = match self.assemble(root, inside) {
            Some(tree) => tree,
            None => return Ok(None),
        };
        Ok(Some(if include_root {
            SubtreeView::Wrapped(tree)
        } else {
            SubtreeView::Unwrapped(tree.children)
        }))
    }

    /// The root with all of its descendants nested below it.
    pub fn tree(&self, root: Option<NodeId>) -> Result<Option<TreeNode>, ApiError> {
        Ok(self
            .subtree_view(root, true)?
            .and_then(SubtreeView::into_wrapped))
    }

    /// The direct child subtrees of `node`.
    pub fn children_tree(&self, node: &Node) -> Result<Vec<TreeNode>, ApiError> {
        Ok(self
            .subtree_view(Some(node.id), false)?
            .map(SubtreeView::into_children)
            .unwrap_or_default())
    }

    /// Arena assembly: slot 0 is the root, children are attached by
    /// `parent_id` in store order. Records whose parent is not in the arena
    /// are unreachable and dropped.
    fn assemble(&self, root: Node, inside: Vec<Node>) -> Option<TreeNode> {
        let mut arena = Vec::with_capacity(inside.len() + 1);
        arena.push(root);
        arena.extend(inside);

        let slots: HashMap<NodeId, usize> =
            arena.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); arena.len()];
        for (i, node) in arena.iter().enumerate().skip(1) {
            if let Some(&parent) = node.parent_id.as_ref().and_then(|p| slots.get(p)) {
                if parent != i {
                    children[parent].push(i);
                }
            }
        }

        // Pre-order pass assigns level and path top-down.
        let mut level = vec![0usize; arena.len()];
        let mut path = vec![String::new(); arena.len()];
        let mut order = Vec::with_capacity(arena.len());
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            order.push(i);
            let child_path = if path[i].is_empty() {
                arena[i].id.to_string()
            } else {
                format!("{}{}{}", path[i], self.separator, arena[i].id)
            };
            for &c in children[i].iter().rev() {
                level[c] = level[i] + 1;
                path[c] = child_path.clone();
                stack.push(c);
            }
        }

        // Reverse pre-order closes every child before its parent.
        let mut arena: Vec<Option<Node>> = arena.into_iter().map(Some).collect();
        let mut built: Vec<Option<TreeNode>> = vec![None; arena.len()];
        for &i in order.iter().rev() {
            let nested = children[i]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            if let Some(node) = arena[i].take() {
                built[i] = Some(TreeNode {
                    node,
                    level: level[i],
                    path: std::mem::take(&mut path[i]),
                    children: nested,
                });
            }
        }
        built[0].take()
    }
}
