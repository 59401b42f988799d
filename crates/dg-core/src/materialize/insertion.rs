//! Corrective room insertion
//!
//! When a batch with a placement constraint cannot hang off its spawn room
//! on any free side, a plain room is pushed in between: it takes the spawn
//! room's locks, extends from the spawn room, and the failing batch is
//! retried from it instead.

use std::collections::VecDeque;

use hashbrown::HashSet;
use tracing::info;

use super::batcher::Batch;
use super::MaterializationState;
use crate::error::Result;
use crate::graph::{NodeGraph, NodeId, NodeType};
use crate::layout::{RoomId, RoomLayout};

/// Rewire the graph around `spawn` and return the rebuilt work queue
///
/// The returned queue starts with the batch of the inserted room, followed
/// by `failing`, followed by everything in `rest` in its original order.
pub(super) fn insert_room<L: RoomLayout>(
    graph: &mut NodeGraph,
    layout: &mut L,
    spawn: RoomId,
    failing: Batch,
    rest: VecDeque<Batch>,
    state: &mut MaterializationState,
) -> Result<VecDeque<Batch>> {
    let resident: Vec<NodeId> = layout.layout_nodes(spawn).to_vec();
    let (moved, mut remaining): (Vec<NodeId>, Vec<NodeId>) = resident
        .iter()
        .copied()
        .partition(|&n| graph.node_type(n).is_lock());

    for &node in &moved {
        graph.clear_room(node)?;
    }

    // a room always represents at least one node
    if remaining.is_empty() {
        let placeholder = stand_in(graph, &moved, spawn)?;
        remaining.push(placeholder);
    }
    layout.set_nodes(spawn, remaining.clone())?;

    let leaves = graph.leaf_nodes(&remaining);
    let anchor = leaves.first().copied().unwrap_or(remaining[0]);
    let inserted = graph.add_node(NodeType::Room, Some(anchor));
    for &leaf in &leaves {
        graph.add_edge(leaf, inserted)?;
    }

    for &node in &moved {
        let in_room: Vec<NodeId> = graph
            .get(node)?
            .direct_parents
            .iter()
            .copied()
            .filter(|p| remaining.contains(p))
            .collect();
        graph.reparent(node, &in_room, inserted)?;
        graph.get_mut(node)?.tight_couple_parent = Some(inserted);
    }

    let resident: HashSet<NodeId> = resident.into_iter().collect();
    for &node in failing.nodes() {
        let parent = graph.get(node)?.tight_couple_parent;
        if parent.is_some_and(|p| resident.contains(&p)) {
            graph.get_mut(node)?.tight_couple_parent = Some(inserted);
            graph.add_edge(inserted, node)?;
        }
    }

    if let Some(lead) = failing.lead() {
        state.corrections.insert(lead, spawn);
    }
    state.inserted_room_parent = Some(spawn);

    info!(
        spawn = %spawn,
        inserted = %inserted,
        moved_locks = moved.len(),
        "inserted corrective room"
    );

    let mut nodes = Vec::with_capacity(moved.len() + 1);
    nodes.push(inserted);
    nodes.extend(moved);

    let mut queue = VecDeque::with_capacity(rest.len() + 2);
    queue.push_back(Batch::new(nodes));
    queue.push_back(failing);
    queue.extend(rest);
    Ok(queue)
}

/// Plain Room node that keeps `spawn` represented once its locks leave
///
/// It takes over the locks' incoming edges so the locks still depend on
/// everything they depended on, through the inserted room.
fn stand_in(graph: &mut NodeGraph, moved: &[NodeId], spawn: RoomId) -> Result<NodeId> {
    let tight = match moved.first() {
        Some(&first) => graph.get(first)?.tight_couple_parent,
        None => None,
    };
    let placeholder = graph.add_node(NodeType::Room, tight);
    graph.set_room(placeholder, spawn)?;

    for &node in moved {
        let parents = graph.get(node)?.direct_parents.clone();
        for parent in parents {
            if moved.contains(&parent) {
                continue;
            }
            graph.remove_edge(parent, node);
            graph.add_edge(parent, placeholder)?;
        }
        graph.add_edge(placeholder, node)?;
    }
    Ok(placeholder)
}
