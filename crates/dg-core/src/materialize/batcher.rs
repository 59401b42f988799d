//! Node batcher
//!
//! Cuts one pending-parent group of nodes into room-sized batches. Each
//! batch becomes exactly one room, so a batch holds at most one
//! room-defining node and no more door nodes than the door budget.

use std::collections::VecDeque;

use crate::graph::{NodeGraph, NodeId, NodeType};
use crate::rng::RandomSource;

/// Door budget of the very first room of a level
pub const BASE_DOOR_BUDGET: usize = 6;

/// Nodes destined to become one room
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Batch {
    nodes: Vec<NodeId>,
}

impl Batch {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// First node, which identifies the batch across requeues
    pub fn lead(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_type(&self, graph: &NodeGraph, node_type: NodeType) -> bool {
        self.nodes.iter().any(|&n| graph.node_type(n) == node_type)
    }

    pub fn door_count(&self, graph: &NodeGraph) -> usize {
        self.nodes
            .iter()
            .filter(|&&n| graph.node_type(n).is_door())
            .count()
    }

    pub fn room_defining_count(&self, graph: &NodeGraph) -> usize {
        self.nodes
            .iter()
            .filter(|&&n| graph.node_type(n).is_room_defining())
            .count()
    }
}

/// Door budget for batches cut while `existing_root_count` roots exist
pub fn door_budget(existing_root_count: usize) -> usize {
    if existing_root_count == 0 {
        BASE_DOOR_BUDGET
    } else {
        BASE_DOOR_BUDGET - 1
    }
}

/// Partition `nodes` into batches
///
/// The nodes are shuffled first so upstream traversal order does not bias
/// which nodes share a room. Any input, including an empty one, yields
/// well-formed batches.
pub fn batch_nodes<R: RandomSource>(
    graph: &NodeGraph,
    nodes: &[NodeId],
    existing_root_count: usize,
    rng: &mut R,
) -> VecDeque<Batch> {
    let mut shuffled = nodes.to_vec();
    rng.shuffle(&mut shuffled);

    let budget = door_budget(existing_root_count);
    let mut queue = VecDeque::new();
    let mut current: Vec<NodeId> = Vec::new();
    let mut doors = 0;
    let mut has_room = false;

    for id in shuffled {
        let node_type = graph.node_type(id);

        // a plain Room always opens its own batch; other room-defining
        // nodes only when the batch already has one
        let closes = !current.is_empty()
            && (node_type == NodeType::Room || (node_type.is_room_defining() && has_room));
        if closes {
            queue.push_back(Batch::new(std::mem::take(&mut current)));
            doors = 0;
            has_room = false;
        }

        current.push(id);
        has_room |= node_type.is_room_defining();

        if node_type.is_door() {
            doors += 1;
            if doors >= budget {
                queue.push_back(Batch::new(std::mem::take(&mut current)));
                doors = 0;
                has_room = false;
            }
        }
    }

    if !current.is_empty() {
        queue.push_back(Batch::new(current));
    }

    queue
}
