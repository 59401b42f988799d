//! Grid-based reference layout
//!
//! A child room is placed flush against one side of its parent, aligned to
//! the parent's lower-left corner along that side. Placement succeeds when:
//! 1. the side is allowed, free on the parent, and the prefab has a socket facing back
//! 2. the prefab can hold the batch's door nodes
//! 3. the rectangle does not overlap any placed room
//!
//! An ordered lock moved out of a room by [`RoomLayout::set_nodes`] keeps its
//! sequence number and gets it back when it is placed again.

use hashbrown::HashMap;

use super::room::{Directions, Room, RoomId};
use super::RoomLayout;
use crate::config::Prefab;
use crate::error::{GenerationError, Result};
use crate::graph::{NodeGraph, NodeId, NodeType};

/// Arena of rooms laid out on an integer grid
#[derive(Debug, Clone, Default)]
pub struct GridLayout {
    rooms: Vec<Room>,
    /// Ordered locks dropped by `set_nodes`, with their sequence numbers
    released_locks: HashMap<NodeId, u32>,
}

impl GridLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn into_rooms(self) -> Vec<Room> {
        self.rooms
    }

    fn next_id(&self) -> RoomId {
        RoomId(self.rooms.len() as u32)
    }

    fn fits(&self, candidate: &Room) -> bool {
        !self.rooms.iter().any(|r| r.overlaps(candidate, 0))
    }

    /// Rectangle for a prefab hung off `side` of `parent`
    fn adjacent(parent: &Room, side: Directions, prefab: &Prefab, id: RoomId) -> Room {
        let (x, y) = if side == Directions::UP {
            (parent.x, parent.y + parent.height)
        } else if side == Directions::DOWN {
            (parent.x, parent.y - prefab.height)
        } else if side == Directions::LEFT {
            (parent.x - prefab.width, parent.y)
        } else {
            (parent.x + parent.width, parent.y)
        };
        Room::new(id, x, y, prefab.width, prefab.height)
    }

    fn build_room(
        &mut self,
        mut room: Room,
        prefab: &Prefab,
        graph: &NodeGraph,
        nodes: &[NodeId],
        ordered_lock_index: &mut u32,
    ) -> Room {
        room.prefab = prefab.name.clone();
        room.exits = prefab.exits;
        room.nodes = nodes.to_vec();
        for &node in nodes {
            if graph.node_type(node) != NodeType::LockOrdered {
                continue;
            }
            let number = self.released_locks.remove(&node).unwrap_or_else(|| {
                let next = *ordered_lock_index;
                *ordered_lock_index += 1;
                next
            });
            room.ordered_locks.push((node, number));
        }
        room
    }
}

fn door_count(graph: &NodeGraph, nodes: &[NodeId]) -> usize {
    nodes
        .iter()
        .filter(|&&n| graph.node_type(n).is_door())
        .count()
}

impl RoomLayout for GridLayout {
    fn spawn_entry(
        &mut self,
        prefab: &Prefab,
        graph: &NodeGraph,
        nodes: &[NodeId],
        ordered_lock_index: &mut u32,
    ) -> RoomId {
        let id = self.next_id();
        // extra roots line up to the right of everything placed so far
        let x = self
            .rooms
            .iter()
            .map(|r| r.x + r.width + 1)
            .max()
            .unwrap_or(0);
        let room = Room::new(id, x, 0, prefab.width, prefab.height);
        let room = self.build_room(room, prefab, graph, nodes, ordered_lock_index);
        self.rooms.push(room);
        id
    }

    fn spawn_child(
        &mut self,
        parent: RoomId,
        prefab: &Prefab,
        graph: &NodeGraph,
        nodes: &[NodeId],
        allowed: Option<Directions>,
        ordered_lock_index: &mut u32,
    ) -> Option<RoomId> {
        if door_count(graph, nodes) > prefab.max_doors as usize {
            return None;
        }

        let parent_room = self.rooms.get(parent.index())?;
        let allowed = allowed.unwrap_or(Directions::ANY);
        let sides = allowed.sides() & parent_room.free_exits();
        let connection = allowed.connection();
        let id = self.next_id();

        let placed = Directions::SIDES
            .into_iter()
            .filter(|&side| sides.contains(side) && prefab.exits.contains(side.opposite()))
            .map(|side| (side, Self::adjacent(parent_room, side, prefab, id)))
            .find(|(_, candidate)| self.fits(candidate));

        let (side, mut room) = placed?;
        room.parent = Some(parent);
        room.attached_via = Some(side);
        room.connection = connection;
        room.used_exits = side.opposite();
        let room = self.build_room(room, prefab, graph, nodes, ordered_lock_index);

        self.rooms[parent.index()].used_exits |= side;
        self.rooms.push(room);
        Some(id)
    }

    fn set_nodes(&mut self, room: RoomId, nodes: Vec<NodeId>) -> Result<()> {
        let entry = self
            .rooms
            .get_mut(room.index())
            .ok_or(GenerationError::UnknownRoom(room))?;
        for &(node, number) in &entry.ordered_locks {
            if !nodes.contains(&node) {
                self.released_locks.insert(node, number);
            }
        }
        entry.ordered_locks.retain(|(n, _)| nodes.contains(n));
        entry.nodes = nodes;
        Ok(())
    }

    fn layout_nodes(&self, room: RoomId) -> &[NodeId] {
        self.rooms
            .get(room.index())
            .map(|r| r.nodes.as_slice())
            .unwrap_or(&[])
    }

    fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.index())
    }

    fn len(&self) -> usize {
        self.rooms.len()
    }
}
