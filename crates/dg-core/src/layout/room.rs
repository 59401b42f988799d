//! Materialized rooms
//!
//! A room is an axis-aligned rectangle on the layout grid, carrying the
//! graph nodes it represents.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::graph::NodeId;

/// Index of a room in its layout's arena
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct RoomId(pub u32);

impl RoomId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Placement directions plus connection modifiers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Directions: u8 {
        const UP = 0x01;
        const DOWN = 0x02;
        const LEFT = 0x04;
        const RIGHT = 0x08;
        /// Connection must be hidden
        const SECRET = 0x10;
        /// Connection belongs to an indefinite chain
        const INDEFINITE = 0x20;

        const VERTICAL = Self::UP.bits() | Self::DOWN.bits();
        const HORIZONTAL = Self::LEFT.bits() | Self::RIGHT.bits();
        const ANY = Self::VERTICAL.bits() | Self::HORIZONTAL.bits();
    }
}

impl Directions {
    /// Single sides in the order placement tries them
    pub const SIDES: [Directions; 4] = [
        Directions::UP,
        Directions::RIGHT,
        Directions::DOWN,
        Directions::LEFT,
    ];

    /// Only the side bits
    pub fn sides(self) -> Directions {
        self & Directions::ANY
    }

    /// Opposite side(s); modifiers are dropped
    pub fn opposite(self) -> Directions {
        let mut out = Directions::empty();
        if self.contains(Directions::UP) {
            out |= Directions::DOWN;
        }
        if self.contains(Directions::DOWN) {
            out |= Directions::UP;
        }
        if self.contains(Directions::LEFT) {
            out |= Directions::RIGHT;
        }
        if self.contains(Directions::RIGHT) {
            out |= Directions::LEFT;
        }
        out
    }

    /// Connection kind implied by the modifier bits
    pub fn connection(self) -> Connection {
        if self.contains(Directions::SECRET) {
            Connection::Secret
        } else if self.contains(Directions::INDEFINITE) {
            Connection::Indefinite
        } else {
            Connection::Open
        }
    }
}

/// How a room is joined to its parent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Connection {
    #[default]
    Open,
    Secret,
    Indefinite,
}

/// A placed room
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Grid x of the left edge
    pub x: i32,
    /// Grid y of the bottom edge (y grows upward)
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Prefab this room was built from
    pub prefab: String,
    /// Room this one was spawned from; None for roots
    pub parent: Option<RoomId>,
    /// Side of the parent this room hangs off
    pub attached_via: Option<Directions>,
    pub connection: Connection,
    /// Door sockets offered by the prefab
    pub exits: Directions,
    /// Sockets already joined to a neighbour
    pub used_exits: Directions,
    /// Graph nodes resident in this room
    pub nodes: Vec<NodeId>,
    /// Sequence number of each ordered lock in this room
    pub ordered_locks: Vec<(NodeId, u32)>,
}

impl Room {
    /// Create a detached room at the given grid position
    pub fn new(id: RoomId, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            ..Default::default()
        }
    }

    /// Sockets still free for a new neighbour
    pub fn free_exits(&self) -> Directions {
        self.exits.sides() - self.used_exits
    }

    /// Footprints intersect once this room is grown by `buffer` on every side
    pub fn overlaps(&self, other: &Room, buffer: i32) -> bool {
        let x1 = self.x - buffer;
        let y1 = self.y - buffer;
        let x2 = self.x + self.width + buffer;
        let y2 = self.y + self.height + buffer;

        !(x2 <= other.x || x1 >= other.x + other.width || y2 <= other.y || y1 >= other.y + other.height)
    }
}
