//! Graph node types
//!
//! A node is one level-design requirement: a room, a lock, a key, a gate.
//! Node types fall into three families that the batcher cares about:
//! - room-defining nodes (Entrance, Room and its placement variants)
//! - door nodes (Lock, LockOrdered, GateBreakable, Secret) which cost door budget
//! - content nodes (everything else) which ride along in whatever room they land in

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::layout::{Directions, RoomId};

/// Stable identity of a node inside its [`NodeGraph`](super::NodeGraph)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node types
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum NodeType {
    /// Level start; always the first root room
    Entrance,
    /// Generic room with no placement constraint
    #[default]
    Room,
    /// Room attached above or below its spawn room
    RoomVertical,
    /// Room attached below its spawn room
    RoomDown,
    /// Room attached above its spawn room
    RoomUp,
    /// Room attached left or right of its spawn room
    RoomHorizontal,
    /// Room reached through a secret connection
    RoomSecret,
    /// Room in an indefinite (looping) chain
    RoomIndefinite,
    /// The one correct exit of an indefinite chain
    RoomIndefiniteCorrect,
    /// Locked door opened by a key
    Lock,
    /// Locked door that must be opened in sequence
    LockOrdered,
    /// Gate that must be broken to pass
    GateBreakable,
    /// Hidden passage
    Secret,
    /// Boss encounter; selects the boss prefab set
    Boss,
    /// Structural marker forcing children to extend from its room
    TightCoupling,
    /// Structural marker separating level areas
    AreaDivider,
    /// Key for a Lock
    Key,
    /// Key for a LockOrdered
    KeyOrdered,
    /// Pickup placed in a room
    Item,
    /// Level exit
    Exit,
}

impl NodeType {
    /// Door-type nodes, which are capped by the door budget
    pub fn is_door(self) -> bool {
        matches!(
            self,
            NodeType::Lock | NodeType::LockOrdered | NodeType::GateBreakable | NodeType::Secret
        )
    }

    /// Lock nodes, which the corrective insertion moves into the new room
    pub fn is_lock(self) -> bool {
        matches!(self, NodeType::Lock | NodeType::LockOrdered)
    }

    /// Placement variants of Room (directional, secret, indefinite)
    pub fn is_room_variant(self) -> bool {
        matches!(
            self,
            NodeType::RoomVertical
                | NodeType::RoomDown
                | NodeType::RoomUp
                | NodeType::RoomHorizontal
                | NodeType::RoomSecret
                | NodeType::RoomIndefinite
                | NodeType::RoomIndefiniteCorrect
        )
    }

    /// Nodes that define a room of their own; at most one per batch
    pub fn is_room_defining(self) -> bool {
        matches!(self, NodeType::Entrance | NodeType::Room) || self.is_room_variant()
    }

    /// Placement constraint this node puts on its room, if any
    pub fn placement(self) -> Option<Directions> {
        match self {
            NodeType::RoomVertical => Some(Directions::VERTICAL),
            NodeType::RoomDown => Some(Directions::DOWN),
            NodeType::RoomUp => Some(Directions::UP),
            NodeType::RoomHorizontal => Some(Directions::HORIZONTAL),
            NodeType::RoomSecret => Some(Directions::ANY | Directions::SECRET),
            NodeType::RoomIndefinite | NodeType::RoomIndefiniteCorrect => {
                Some(Directions::ANY | Directions::INDEFINITE)
            }
            _ => None,
        }
    }
}

/// A vertex of the level dependency graph
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Node whose room this node should extend from
    pub tight_couple_parent: Option<NodeId>,
    /// Nodes that must be represented before this one can attach
    pub direct_parents: Vec<NodeId>,
    /// Inverse of `direct_parents`
    pub children: Vec<NodeId>,
    /// Room representing this node, once materialized
    pub room: Option<RoomId>,
}

impl Node {
    pub fn new(id: NodeId, node_type: NodeType) -> Self {
        Self {
            id,
            node_type,
            ..Default::default()
        }
    }

    pub fn is_materialized(&self) -> bool {
        self.room.is_some()
    }
}
