//! Room materialization
//!
//! Turns queued [`Batch`]es into rooms. Each batch either becomes the level's
//! entrance room, is attached to the room of an already materialized node,
//! or waits at the back of the queue until such a room exists.
//!
//! A batch with a placement constraint that cannot be met from its spawn
//! room gets one corrective insertion (see [`insertion`]); any other
//! placement failure abandons the pass with a retryable
//! [`GenerationError::PlacementFailed`].

pub mod batcher;
mod insertion;
pub mod reservoir;

pub use batcher::{batch_nodes, door_budget, Batch, BASE_DOOR_BUDGET};

use std::collections::VecDeque;

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use crate::config::{GenerationConfig, Prefab};
use crate::error::{GenerationError, Result};
use crate::graph::{NodeGraph, NodeId, NodeType};
use crate::layout::{Directions, RoomId, RoomLayout};
use crate::rng::RandomSource;

/// Counters and bookkeeping carried from one batch to the next
#[derive(Debug, Clone, Default)]
pub struct MaterializationState {
    /// Rooms placed so far in this pass
    pub room_count: u32,
    /// Next ordered-lock sequence number
    pub ordered_lock_index: u32,
    /// Spawn room of the last corrective insertion, until its room is placed
    pub inserted_room_parent: Option<RoomId>,
    pub roots: Vec<RoomId>,
    /// Rooms registered with the overview camera
    pub overview_targets: Vec<RoomId>,
    /// Special-room reservoir; empty until the entrance allocates it
    pub special_rooms: Vec<Option<RoomId>>,
    /// Failing batch lead -> spawn room it was corrected from
    pub corrections: HashMap<NodeId, RoomId>,
}

impl MaterializationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insertion_count(&self) -> usize {
        self.corrections.len()
    }
}

/// Drains batch queues into a [`RoomLayout`]
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    config: &'a GenerationConfig,
}

impl<'a> Materializer<'a> {
    pub fn new(config: &'a GenerationConfig) -> Self {
        Self { config }
    }

    /// Materialize every batch in `queue`
    ///
    /// Returns the running room count. A batch is corrected at most once,
    /// whichever spawn room it failed from, so a constraint that can never
    /// be met ends in `PlacementFailed` instead of an endless chain of
    /// inserted rooms.
    pub fn materialize<L: RoomLayout, R: RandomSource>(
        &self,
        graph: &mut NodeGraph,
        layout: &mut L,
        queue: VecDeque<Batch>,
        state: &mut MaterializationState,
        rng: &mut R,
    ) -> Result<u32> {
        let mut queue = queue;
        // consecutive requeues since the last placed room
        let mut stalled = 0;

        while let Some(batch) = queue.pop_front() {
            let Some(lead) = batch.lead() else {
                continue;
            };

            if batch.contains_type(graph, NodeType::Entrance) {
                self.place_entrance(graph, layout, &batch, state, rng)?;
                stalled = 0;
                continue;
            }

            let Some(spawn) = resolve_spawn(graph, &batch, state) else {
                stalled += 1;
                if stalled > queue.len() {
                    warn!(node = %lead, queued = queue.len(), "batch can never be attached");
                    return Err(GenerationError::UnresolvedDependency {
                        node: lead,
                        queued: queue.len(),
                    });
                }
                debug!(node = %lead, "spawn point not materialized yet, requeueing");
                queue.push_back(batch);
                continue;
            };

            let prefabs = self.candidates(graph, &batch)?;
            let allowed = allowed_directions(graph, &batch);
            let weights: Vec<u32> = prefabs.iter().map(|p| p.weight).collect();
            let order = rng.weighted_order(&weights);

            let placed = order.iter().find_map(|&idx| {
                layout.spawn_child(
                    spawn,
                    &prefabs[idx],
                    graph,
                    batch.nodes(),
                    allowed,
                    &mut state.ordered_lock_index,
                )
            });

            if let Some(room) = placed {
                self.register(graph, room, &batch, state, rng)?;
                state.inserted_room_parent = None;
                stalled = 0;
                debug!(node = %lead, room = %room, spawn = %spawn, "placed room");
                continue;
            }

            if allowed.is_some() && !state.corrections.contains_key(&lead) {
                debug!(node = %lead, spawn = %spawn, "constrained placement failed");
                queue = insertion::insert_room(graph, layout, spawn, batch, queue, state)?;
                stalled = 0;
                continue;
            }

            warn!(
                node = %lead,
                spawn = %spawn,
                prefabs = order.len(),
                "no prefab fits, abandoning pass"
            );
            return Err(GenerationError::PlacementFailed {
                node: lead,
                attempts: order.len(),
            });
        }

        Ok(state.room_count)
    }

    fn place_entrance<L: RoomLayout, R: RandomSource>(
        &self,
        graph: &mut NodeGraph,
        layout: &mut L,
        batch: &Batch,
        state: &mut MaterializationState,
        rng: &mut R,
    ) -> Result<()> {
        let lead = batch.lead().unwrap_or_default();
        if !state.roots.is_empty() {
            return Err(GenerationError::DuplicateEntrance { node: lead });
        }

        let entries = &self.config.prefabs.entry;
        let weights: Vec<u32> = entries.iter().map(|p| p.weight).collect();
        let prefab = rng
            .choose_weighted(&weights)
            .and_then(|idx| entries.get(idx))
            .ok_or(GenerationError::NoPrefabs { set: "entry" })?;

        let room = layout.spawn_entry(prefab, graph, batch.nodes(), &mut state.ordered_lock_index);
        state.roots.push(room);
        if self.config.level.above_ground {
            state.overview_targets.push(room);
        }
        if self.config.level.special_room_count > 0 {
            state.special_rooms = vec![None; self.config.level.special_room_count];
        }
        for &node in batch.nodes() {
            graph.set_room(node, room)?;
        }
        state.room_count += 1;

        info!(room = %room, prefab = %prefab.name, "placed entrance");
        Ok(())
    }

    /// Prefab set a batch draws from
    fn candidates(&self, graph: &NodeGraph, batch: &Batch) -> Result<&'a [Prefab]> {
        let config = self.config;
        let (set, prefabs) = if batch.contains_type(graph, NodeType::Boss) {
            ("boss", config.prefabs.boss.as_slice())
        } else {
            ("rooms", config.prefabs.rooms.as_slice())
        };
        if prefabs.is_empty() {
            return Err(GenerationError::NoPrefabs { set });
        }
        Ok(prefabs)
    }

    fn register<R: RandomSource>(
        &self,
        graph: &mut NodeGraph,
        room: RoomId,
        batch: &Batch,
        state: &mut MaterializationState,
        rng: &mut R,
    ) -> Result<()> {
        for &node in batch.nodes() {
            graph.set_room(node, room)?;
        }
        state.room_count += 1;
        if self.config.level.above_ground {
            state.overview_targets.push(room);
        }
        if !state.special_rooms.is_empty()
            && let Some(slot) =
                reservoir::offer(&mut state.special_rooms, room, state.room_count, rng)
        {
            debug!(room = %room, slot, "special room slot taken");
        }
        Ok(())
    }
}

/// Room a batch should be attached to, if one is materialized yet
fn resolve_spawn(graph: &NodeGraph, batch: &Batch, state: &MaterializationState) -> Option<RoomId> {
    state.inserted_room_parent.or_else(|| {
        batch.nodes().iter().find_map(|&node| {
            graph
                .get(node)
                .ok()
                .and_then(|n| n.tight_couple_parent)
                .and_then(|parent| graph.room_of(parent))
        })
    })
}

/// Union of the placement constraints in a batch; None when unconstrained
fn allowed_directions(graph: &NodeGraph, batch: &Batch) -> Option<Directions> {
    batch
        .nodes()
        .iter()
        .filter_map(|&n| graph.node_type(n).placement())
        .reduce(|a, b| a | b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GridLayout;
    use crate::rng::GameRng;

    fn config() -> GenerationConfig {
        let mut config = GenerationConfig::default();
        config.prefabs.entry = vec![Prefab::new("entry", 1, 4, 4, Directions::HORIZONTAL)];
        config.prefabs.rooms = vec![Prefab::new("cell", 1, 3, 3, Directions::ANY)];
        config
    }

    fn single(nodes: &[NodeId]) -> VecDeque<Batch> {
        VecDeque::from(vec![Batch::new(nodes.to_vec())])
    }

    #[test]
    fn test_entrance_only() {
        let config = config();
        let mut graph = NodeGraph::new();
        let entrance = graph.add_node(NodeType::Entrance, None);
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(1);

        let count = Materializer::new(&config)
            .materialize(&mut graph, &mut layout, single(&[entrance]), &mut state, &mut rng)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(state.roots.len(), 1);
        assert_eq!(graph.room_of(entrance), Some(state.roots[0]));
        assert!(state.special_rooms.is_empty());
        assert_eq!(state.overview_targets, state.roots);
    }

    #[test]
    fn test_second_entrance_rejected() {
        let config = config();
        let mut graph = NodeGraph::new();
        let a = graph.add_node(NodeType::Entrance, None);
        let b = graph.add_node(NodeType::Entrance, None);
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(1);
        let queue = VecDeque::from(vec![Batch::new(vec![a]), Batch::new(vec![b])]);

        let err = Materializer::new(&config)
            .materialize(&mut graph, &mut layout, queue, &mut state, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GenerationError::DuplicateEntrance { node } if node == b));
    }

    #[test]
    fn test_requeue_until_parent_placed() {
        let config = config();
        let mut graph = NodeGraph::new();
        let entrance = graph.add_node(NodeType::Entrance, None);
        let room = graph.add_child(entrance, NodeType::Room).unwrap();
        let key = graph.add_child(room, NodeType::Key).unwrap();
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(5);
        // the key's batch comes before the room it extends from
        let queue = VecDeque::from(vec![
            Batch::new(vec![entrance]),
            Batch::new(vec![key]),
            Batch::new(vec![room]),
        ]);

        let count = Materializer::new(&config)
            .materialize(&mut graph, &mut layout, queue, &mut state, &mut rng)
            .unwrap();
        assert_eq!(count, 3);
        assert!(graph.rooms_assigned(&[entrance, room, key]));
        assert_eq!(
            layout.room(graph.room_of(key).unwrap()).unwrap().parent,
            graph.room_of(room)
        );
    }

    #[test]
    fn test_unresolvable_batch_is_structural() {
        let config = config();
        let mut graph = NodeGraph::new();
        graph.add_node(NodeType::Entrance, None);
        let orphan = graph.add_node(NodeType::Room, None);
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(5);

        let err = Materializer::new(&config)
            .materialize(&mut graph, &mut layout, single(&[orphan]), &mut state, &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::UnresolvedDependency { node, queued: 0 } if node == orphan
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_boss_uses_boss_prefabs() {
        let mut config = config();
        config.prefabs.boss = vec![Prefab::new("arena", 1, 7, 7, Directions::ANY)];
        let mut graph = NodeGraph::new();
        let entrance = graph.add_node(NodeType::Entrance, None);
        let boss = graph.add_child(entrance, NodeType::Boss).unwrap();
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(2);
        let queue = VecDeque::from(vec![Batch::new(vec![entrance]), Batch::new(vec![boss])]);

        Materializer::new(&config)
            .materialize(&mut graph, &mut layout, queue, &mut state, &mut rng)
            .unwrap();
        let room = graph.room_of(boss).unwrap();
        assert_eq!(layout.room(room).unwrap().prefab, "arena");
    }

    #[test]
    fn test_boss_without_prefabs() {
        let mut config = config();
        config.prefabs.boss.clear();
        let mut graph = NodeGraph::new();
        let entrance = graph.add_node(NodeType::Entrance, None);
        let boss = graph.add_child(entrance, NodeType::Boss).unwrap();
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(2);
        let queue = VecDeque::from(vec![Batch::new(vec![entrance]), Batch::new(vec![boss])]);

        let err = Materializer::new(&config)
            .materialize(&mut graph, &mut layout, queue, &mut state, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoPrefabs { set: "boss" }));
    }

    #[test]
    fn test_room_down_gets_one_insertion() {
        // the entry room has no down socket
        let config = config();
        let mut graph = NodeGraph::new();
        let entrance = graph.add_node(NodeType::Entrance, None);
        let down = graph.add_child(entrance, NodeType::RoomDown).unwrap();
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(11);
        let queue = VecDeque::from(vec![Batch::new(vec![entrance]), Batch::new(vec![down])]);

        let count = Materializer::new(&config)
            .materialize(&mut graph, &mut layout, queue, &mut state, &mut rng)
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(state.insertion_count(), 1);
        assert_eq!(state.inserted_room_parent, None);

        let down_room = layout.room(graph.room_of(down).unwrap()).unwrap();
        assert_eq!(down_room.attached_via, Some(Directions::DOWN));
        // hangs off the inserted room, not the entry
        assert_ne!(down_room.parent, Some(state.roots[0]));
    }

    #[test]
    fn test_unsatisfiable_constraint_fails_after_one_insertion() {
        let mut config = config();
        // nothing can ever face up, so nothing can hang below
        config.prefabs.rooms = vec![Prefab::new("gallery", 1, 6, 2, Directions::HORIZONTAL)];
        let mut graph = NodeGraph::new();
        let entrance = graph.add_node(NodeType::Entrance, None);
        let down = graph.add_child(entrance, NodeType::RoomDown).unwrap();
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(11);
        let queue = VecDeque::from(vec![Batch::new(vec![entrance]), Batch::new(vec![down])]);

        let err = Materializer::new(&config)
            .materialize(&mut graph, &mut layout, queue, &mut state, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GenerationError::PlacementFailed { node, .. } if node == down));
        assert!(err.is_retryable());
        assert_eq!(state.insertion_count(), 1);
        // entry plus the inserted room
        assert_eq!(state.room_count, 2);
    }

    #[test]
    fn test_unconstrained_failure_has_no_insertion() {
        let mut config = config();
        config.prefabs.rooms = vec![Prefab::new("closet", 1, 2, 2, Directions::ANY).with_max_doors(0)];
        let mut graph = NodeGraph::new();
        let entrance = graph.add_node(NodeType::Entrance, None);
        let lock = graph.add_child(entrance, NodeType::Lock).unwrap();
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(3);
        let queue = VecDeque::from(vec![Batch::new(vec![entrance]), Batch::new(vec![lock])]);

        let err = Materializer::new(&config)
            .materialize(&mut graph, &mut layout, queue, &mut state, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GenerationError::PlacementFailed { attempts: 1, .. }));
        assert_eq!(state.insertion_count(), 0);
    }

    #[test]
    fn test_reservoir_allocated_and_filled() {
        let mut config = config();
        config.level.special_room_count = 2;
        let mut graph = NodeGraph::new();
        let entrance = graph.add_node(NodeType::Entrance, None);
        let a = graph.add_child(entrance, NodeType::Room).unwrap();
        let b = graph.add_child(entrance, NodeType::Room).unwrap();
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(8);
        let queue = VecDeque::from(vec![
            Batch::new(vec![entrance]),
            Batch::new(vec![a]),
            Batch::new(vec![b]),
        ]);

        Materializer::new(&config)
            .materialize(&mut graph, &mut layout, queue, &mut state, &mut rng)
            .unwrap();
        let mut held: Vec<RoomId> = state.special_rooms.iter().map(|s| s.unwrap()).collect();
        held.sort();
        let mut placed = vec![graph.room_of(a).unwrap(), graph.room_of(b).unwrap()];
        placed.sort();
        assert_eq!(held, placed);
    }

    #[test]
    fn test_below_ground_skips_overview() {
        let mut config = config();
        config.level.above_ground = false;
        let mut graph = NodeGraph::new();
        let entrance = graph.add_node(NodeType::Entrance, None);
        let mut layout = GridLayout::new();
        let mut state = MaterializationState::new();
        let mut rng = GameRng::new(1);
        Materializer::new(&config)
            .materialize(&mut graph, &mut layout, single(&[entrance]), &mut state, &mut rng)
            .unwrap();
        assert!(state.overview_targets.is_empty());
    }

    #[test]
    fn test_allowed_directions() {
        let mut graph = NodeGraph::new();
        let room = graph.add_node(NodeType::RoomSecret, None);
        let lock = graph.add_node(NodeType::Lock, None);
        assert_eq!(
            allowed_directions(&graph, &Batch::new(vec![lock, room])),
            Some(Directions::ANY | Directions::SECRET)
        );
        assert_eq!(allowed_directions(&graph, &Batch::new(vec![lock])), None);
    }
}
