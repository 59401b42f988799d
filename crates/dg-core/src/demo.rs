//! Built-in sample level graph

use crate::error::Result;
use crate::graph::{NodeGraph, NodeType};

/// A small two-area level exercising every node family
///
/// ```text
/// Entrance
/// ├── Room ── Key, Lock ── RoomSecret ── Secret, Item
/// │     └── RoomDown ── Item
/// ├── RoomHorizontal ── LockOrdered ── LockOrdered, KeyOrdered
/// └── AreaDivider ── Room ── Boss ── Exit
/// ```
pub fn demo_graph() -> Result<NodeGraph> {
    let mut graph = NodeGraph::new();
    let entrance = graph.add_node(NodeType::Entrance, None);

    let hall = graph.add_child(entrance, NodeType::Room)?;
    graph.add_child(hall, NodeType::Key)?;
    let lock = graph.add_child(hall, NodeType::Lock)?;
    let vault = graph.add_child(lock, NodeType::RoomSecret)?;
    graph.add_child(vault, NodeType::Secret)?;
    graph.add_child(vault, NodeType::Item)?;
    let cellar = graph.add_child(hall, NodeType::RoomDown)?;
    graph.add_child(cellar, NodeType::Item)?;

    let gallery = graph.add_child(entrance, NodeType::RoomHorizontal)?;
    let first = graph.add_child(gallery, NodeType::LockOrdered)?;
    let second = graph.add_child(first, NodeType::LockOrdered)?;
    graph.add_child(gallery, NodeType::KeyOrdered)?;

    let divider = graph.add_child(entrance, NodeType::AreaDivider)?;
    let antechamber = graph.add_child(divider, NodeType::Room)?;
    // the boss waits for both ordered locks
    let boss = graph.add_child(antechamber, NodeType::Boss)?;
    graph.add_edge(second, boss)?;
    graph.add_child(boss, NodeType::Exit)?;

    Ok(graph)
}
