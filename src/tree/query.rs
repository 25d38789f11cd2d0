//! Traversal queries.
//!
//! Ancestors and descendants are single range predicates over the interval
//! index. Siblings and children are parent-pointer lookups, so they work on
//! branches that have not been built yet. A node without an interval has no
//! ancestors or descendants; nothing here reports that as an error.

use crate::error::ApiError;
use crate::store::{Bound, Filter, Node};
use crate::tree::builder::TreeBuilder;

impl<'a> TreeBuilder<'a> {
    /// Nodes whose interval contains `node`'s, plus `node`, root first.
    pub fn self_and_ancestors(&self, node: &Node) -> Result<Vec<Node>, ApiError> {
        let interval = match node.interval {
            Some(interval) => interval,
            None => return Ok(Vec::new()),
        };
        let filter = Filter::all()
            .left(Bound::Lte(interval.left))
            .right(Bound::Gte(interval.right));
        self.sorted_by_left(filter)
    }

    pub fn ancestors(&self, node: &Node) -> Result<Vec<Node>, ApiError> {
        Ok(without(self.self_and_ancestors(node)?, node))
    }

    /// `node` and every node inside its interval, in pre-order.
    pub fn self_and_descendants(&self, node: &Node) -> Result<Vec<Node>, ApiError> {
        let interval = match node.interval {
            Some(interval) => interval,
            None => return Ok(Vec::new()),
        };
        let filter = Filter::all()
            .left(Bound::Gte(interval.left))
            .right(Bound::Lte(interval.right));
        self.sorted_by_left(filter)
    }

    pub fn descendants(&self, node: &Node) -> Result<Vec<Node>, ApiError> {
        Ok(without(self.self_and_descendants(node)?, node))
    }

    /// Every node sharing `node`'s parent, `node` included. Roots are
    /// siblings of each other.
    pub fn self_and_siblings(&self, node: &Node) -> Result<Vec<Node>, ApiError> {
        Ok(self
            .store
            .find_by_filter(&Filter::children_of(node.parent_id))?)
    }

    pub fn siblings(&self, node: &Node) -> Result<Vec<Node>, ApiError> {
        Ok(self
            .store
            .find_by_filter(&Filter::children_of(node.parent_id).excluding(node.id))?)
    }

    /// Direct children by parent pointer, in store order.
    pub fn children(&self, node: &Node) -> Result<Vec<Node>, ApiError> {
        Ok(self
            .store
            .find_by_filter(&Filter::children_of(Some(node.id)))?)
    }

    /// Children followed by `node` itself.
    pub fn self_and_children(&self, node: &Node) -> Result<Vec<Node>, ApiError> {
        let mut nodes = self.children(node)?;
        nodes.push(node.clone());
        Ok(nodes)
    }

    pub fn parent(&self, node: &Node) -> Result<Option<Node>, ApiError> {
        match node.parent_id {
            Some(id) => Ok(self.store.find_by_id(&id)?),
            None => Ok(None),
        }
    }

    /// Depth of `node`: the number of its ancestors (root = 0).
    pub fn level(&self, node: &Node) -> Result<usize, ApiError> {
        Ok(self.ancestors(node)?.len())
    }

    fn sorted_by_left(&self, filter: Filter) -> Result<Vec<Node>, ApiError> {
        let mut nodes = self.store.find_by_filter(&filter)?;
        nodes.sort_by_key(|n| n.left());
        Ok(nodes)
    }
}

fn without(nodes: Vec<Node>, node: &Node) -> Vec<Node> {
    nodes.into_iter().filter(|n| n.id != node.id).collect()
}
