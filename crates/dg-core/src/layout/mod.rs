//! Spatial room layout
//!
//! The materializer never places rooms itself; it asks a [`RoomLayout`] to
//! try. [`GridLayout`] is the reference implementation: rooms are rectangles
//! on an integer grid joined through door sockets on their sides.

mod grid;
mod room;

pub use grid::GridLayout;
pub use room::{Connection, Directions, Room, RoomId};

use crate::config::Prefab;
use crate::error::Result;
use crate::graph::{NodeGraph, NodeId};

/// The spatial room subsystem as seen by the materializer
pub trait RoomLayout {
    /// Instantiate a root room; entry prefabs always fit
    fn spawn_entry(
        &mut self,
        prefab: &Prefab,
        graph: &NodeGraph,
        nodes: &[NodeId],
        ordered_lock_index: &mut u32,
    ) -> RoomId;

    /// Try to attach a room for `nodes` to `parent`
    ///
    /// `allowed` restricts the sides of `parent` the new room may hang off
    /// (None means any side). Ordered locks placed in the new room take
    /// consecutive numbers from `ordered_lock_index`, except locks moved out
    /// of another room by [`set_nodes`](Self::set_nodes), which keep the
    /// number they had. Returns None when the prefab does not fit.
    fn spawn_child(
        &mut self,
        parent: RoomId,
        prefab: &Prefab,
        graph: &NodeGraph,
        nodes: &[NodeId],
        allowed: Option<Directions>,
        ordered_lock_index: &mut u32,
    ) -> Option<RoomId>;

    /// Replace the nodes resident in a room
    fn set_nodes(&mut self, room: RoomId, nodes: Vec<NodeId>) -> Result<()>;

    /// Nodes currently resident in a room; empty for unknown rooms
    fn layout_nodes(&self, room: RoomId) -> &[NodeId];

    fn room(&self, id: RoomId) -> Option<&Room>;

    /// Number of rooms placed so far
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
