//! Level dependency graph
//!
//! Arena of [`Node`]s addressed by [`NodeId`]. The graph is built upstream
//! (by hand, from JSON, or by a level grammar) and handed to the generator,
//! which only ever writes the `room` back references and, during a
//! corrective insertion, a handful of new nodes and edges.

mod node;
mod spec;
mod traverse;

pub use node::{Node, NodeId, NodeType};
pub use spec::{GraphSpec, NodeSpec};

use hashbrown::HashSet;

use crate::error::{GenerationError, Result};
use crate::layout::RoomId;

/// Arena-backed DAG of level requirements
#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    nodes: Vec<Node>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node
    pub fn add_node(&mut self, node_type: NodeType, tight_couple_parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let mut node = Node::new(id, node_type);
        node.tight_couple_parent = tight_couple_parent;
        self.nodes.push(node);
        id
    }

    /// Add a node that depends on and extends from `parent`
    pub fn add_child(&mut self, parent: NodeId, node_type: NodeType) -> Result<NodeId> {
        self.get(parent)?;
        let id = self.add_node(node_type, Some(parent));
        self.add_edge(parent, id)?;
        Ok(id)
    }

    /// Add a dependency edge; duplicate edges are ignored
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        self.get(child)?;
        if parent == child {
            return Err(GenerationError::Graph(format!("self edge on node {parent}")));
        }
        let child_node = &mut self.nodes[child.index()];
        if !child_node.direct_parents.contains(&parent) {
            child_node.direct_parents.push(parent);
            self.nodes[parent.index()].children.push(child);
        }
        Ok(())
    }

    /// Remove a dependency edge if present
    pub fn remove_edge(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(child.index()) {
            node.direct_parents.retain(|&p| p != parent);
        }
        if let Some(node) = self.nodes.get_mut(parent.index()) {
            node.children.retain(|&c| c != child);
        }
    }

    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.index())
            .ok_or(GenerationError::UnknownNode(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .ok_or(GenerationError::UnknownNode(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Type of a node; unknown ids read as a plain Room
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.nodes
            .get(id.index())
            .map(|n| n.node_type)
            .unwrap_or_default()
    }

    /// Room currently representing a node
    pub fn room_of(&self, id: NodeId) -> Option<RoomId> {
        self.nodes.get(id.index()).and_then(|n| n.room)
    }

    /// First entrance node, if the graph has one
    pub fn entrance(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.node_type == NodeType::Entrance)
            .map(|n| n.id)
    }

    pub fn set_room(&mut self, id: NodeId, room: RoomId) -> Result<()> {
        self.get_mut(id)?.room = Some(room);
        Ok(())
    }

    pub fn clear_room(&mut self, id: NodeId) -> Result<()> {
        self.get_mut(id)?.room = None;
        Ok(())
    }

    /// Forget every room assignment, ready for a fresh attempt
    pub fn clear_rooms(&mut self) {
        for node in &mut self.nodes {
            node.room = None;
        }
    }

    /// True when every listed node already has a room
    pub fn rooms_assigned(&self, ids: &[NodeId]) -> bool {
        ids.iter().all(|&id| self.room_of(id).is_some())
    }

    /// Nodes of `set` with no descendant also in `set`
    pub fn leaf_nodes(&self, set: &[NodeId]) -> Vec<NodeId> {
        let members: HashSet<NodeId> = set.iter().copied().collect();
        set.iter()
            .copied()
            .filter(|&id| !self.has_descendant_in(id, &members))
            .collect()
    }

    fn has_descendant_in(&self, id: NodeId, members: &HashSet<NodeId>) -> bool {
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(id.index()) {
            Some(node) => node.children.clone(),
            None => return false,
        };
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            if members.contains(&next) {
                return true;
            }
            if let Some(node) = self.nodes.get(next.index()) {
                stack.extend(node.children.iter().copied());
            }
        }
        false
    }

    /// Move the direct-parent edges of `child` that come from `from` onto `to`
    pub fn reparent(&mut self, child: NodeId, from: &[NodeId], to: NodeId) -> Result<()> {
        for &parent in from {
            let is_parent = self.get(child)?.direct_parents.contains(&parent);
            if is_parent {
                self.remove_edge(parent, child);
            }
        }
        self.add_edge(to, child)
    }
}
