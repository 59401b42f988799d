//! Depth-first traversal producing pending-parent groups
//!
//! The traversal walks the DAG from the entrance and only descends into a
//! node once every one of its direct parents and its tight-couple parent
//! have been visited, so a node's tight-couple parent is always emitted
//! before it, even when the tight parent is not one of its graph parents. The visit order is then
//! cut into contiguous runs of nodes that share the same tight-couple parent
//! and the same area; each run is handed to the batcher as one unit.

use hashbrown::{HashMap, HashSet};

use super::{NodeGraph, NodeId, NodeType};
use crate::error::{GenerationError, Result};

impl NodeGraph {
    /// Topological depth-first visit order starting at the entrance
    ///
    /// Nodes that cannot be reached, or sit on a cycle, are left out. So is a
    /// node whose tight-couple parent is never visited.
    pub fn dfs_order(&self) -> Result<Vec<NodeId>> {
        let entrance = self.entrance().ok_or(GenerationError::MissingEntrance)?;

        // nodes tightly coupled to something other than a graph parent are
        // revisited once that tight parent is emitted
        let mut tight_waiters: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in self.iter() {
            if let Some(tight) = node.tight_couple_parent
                && !node.direct_parents.contains(&tight)
            {
                tight_waiters.entry(tight).or_default().push(node.id);
            }
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut order = Vec::with_capacity(self.len());
        let mut stack = vec![entrance];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            order.push(id);

            let node = self.get(id)?;
            let waiters = tight_waiters.get(&id).map(Vec::as_slice).unwrap_or_default();
            // reversed so the first child is explored first
            for &child in node.children.iter().chain(waiters).rev() {
                if visited.contains(&child) {
                    continue;
                }
                let child_node = self.get(child)?;
                let ready = child_node.direct_parents.iter().all(|p| visited.contains(p))
                    && child_node
                        .tight_couple_parent
                        .is_none_or(|t| visited.contains(&t));
                if ready {
                    stack.push(child);
                }
            }
        }

        Ok(order)
    }

    /// Area divider among the direct parents of a node
    fn divider_parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).ok().and_then(|node| {
            node.direct_parents
                .iter()
                .copied()
                .find(|&p| self.node_type(p) == NodeType::AreaDivider)
        })
    }

    /// Visit order cut into runs sharing a tight-couple parent and area
    pub fn pending_groups(&self) -> Result<Vec<Vec<NodeId>>> {
        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        let mut current_key = None;

        for id in self.dfs_order()? {
            let node = self.get(id)?;
            let key = (node.tight_couple_parent, self.divider_parent(id));
            match groups.last_mut() {
                Some(group) if current_key == Some(key) => group.push(id),
                _ => groups.push(vec![id]),
            }
            current_key = Some(key);
        }

        Ok(groups)
    }
}
