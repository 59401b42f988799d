//! Property-based tests for batching and level generation
//!
//! Random tree-shaped level graphs are generated from a type pool; every
//! property must hold whatever the shape, seed or prefab luck.

use proptest::prelude::*;

use dg_core::materialize::{batch_nodes, door_budget};
use dg_core::{GameRng, GenerationConfig, LevelGenerator, NodeGraph, NodeId, NodeType, RoomId};

const POOL: [NodeType; 14] = [
    NodeType::Room,
    NodeType::Room,
    NodeType::RoomVertical,
    NodeType::RoomDown,
    NodeType::RoomUp,
    NodeType::RoomHorizontal,
    NodeType::RoomSecret,
    NodeType::Lock,
    NodeType::LockOrdered,
    NodeType::GateBreakable,
    NodeType::Secret,
    NodeType::Key,
    NodeType::Item,
    NodeType::Boss,
];

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_types(max: usize) -> impl Strategy<Value = Vec<NodeType>> {
    prop::collection::vec(prop::sample::select(POOL.to_vec()), 0..max)
}

/// Entrance-rooted tree; node `i` hangs off `raw % i`
fn arb_graph() -> impl Strategy<Value = NodeGraph> {
    prop::collection::vec((any::<u32>(), prop::sample::select(POOL.to_vec())), 0..24).prop_map(
        |nodes| {
            let mut graph = NodeGraph::new();
            graph.add_node(NodeType::Entrance, None);
            for (i, (raw, node_type)) in nodes.into_iter().enumerate() {
                let parent = NodeId(raw % (i as u32 + 1));
                graph.add_child(parent, node_type).unwrap();
            }
            graph
        },
    )
}

fn config(seed: u64, special: usize) -> GenerationConfig {
    let mut config = GenerationConfig::default();
    config.general.seed = Some(seed);
    config.general.max_attempts = 8;
    config.level.special_room_count = special;
    config
}

// ---------------------------------------------------------------------------
// Property: batches respect type exclusivity and the door budget
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn batches_respect_limits(types in arb_types(40), roots in 0usize..3, seed in any::<u64>()) {
        let mut graph = NodeGraph::new();
        let ids: Vec<NodeId> = types.iter().map(|&t| graph.add_node(t, None)).collect();
        let budget = door_budget(roots);

        let batches = batch_nodes(&graph, &ids, roots, &mut GameRng::new(seed));

        let mut seen: Vec<NodeId> = Vec::new();
        for batch in &batches {
            prop_assert!(!batch.is_empty());
            prop_assert!(batch.room_defining_count(&graph) <= 1);
            prop_assert!(batch.door_count(&graph) <= budget);
            seen.extend_from_slice(batch.nodes());
        }
        seen.sort();
        prop_assert_eq!(seen, ids);
    }
}

// ---------------------------------------------------------------------------
// Property: a finished level gives every node exactly one placed room
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_levels_are_consistent(mut graph in arb_graph(), seed in any::<u64>()) {
        let original_len = graph.len();
        match LevelGenerator::new(config(seed, 0)).generate(&mut graph) {
            Ok(level) => {
                prop_assert!(graph.len() >= original_len);
                prop_assert_eq!(level.rooms.len() as u32, level.room_count);
                prop_assert_eq!(level.roots.len(), 1);
                prop_assert_eq!(level.assignments.len(), graph.len());

                for (idx, room) in level.rooms.iter().enumerate() {
                    // one arena entry per spawn call
                    prop_assert_eq!(room.id, RoomId(idx as u32));
                    prop_assert!(!room.nodes.is_empty());
                }
                for node in graph.iter() {
                    let room = node.room.unwrap();
                    prop_assert!(level.room(room).unwrap().nodes.contains(&node.id));
                }
                let resident: usize = level.rooms.iter().map(|r| r.nodes.len()).sum();
                prop_assert_eq!(resident, graph.len());
            }
            Err(e) => {
                prop_assert!(e.is_retryable(), "structural failure: {}", e);
                prop_assert_eq!(graph.len(), original_len);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property: corrective insertions never outnumber constrained rooms
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn insertions_are_bounded(mut graph in arb_graph(), seed in any::<u64>()) {
        let constrained = graph
            .iter()
            .filter(|n| n.node_type.placement().is_some())
            .count();
        if let Ok(level) = LevelGenerator::new(config(seed, 0)).generate(&mut graph) {
            prop_assert!(level.insertions <= constrained);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: a full reservoir only holds placed, non-entrance rooms
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reservoir_fills_once_enough_rooms(
        mut graph in arb_graph(),
        seed in any::<u64>(),
        slots in 1usize..4,
    ) {
        if let Ok(level) = LevelGenerator::new(config(seed, slots)).generate(&mut graph) {
            prop_assert_eq!(level.special_rooms.len(), slots);
            let placed = level.room_count as usize - 1;
            if placed >= slots {
                for slot in &level.special_rooms {
                    let room = slot.unwrap();
                    prop_assert!(level.room(room).is_some());
                    prop_assert!(!level.roots.contains(&room));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property: identical seed and graph give identical levels
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn generation_is_deterministic(graph in arb_graph(), seed in any::<u64>()) {
        let mut a = graph.clone();
        let mut b = graph;
        let ra = LevelGenerator::new(config(seed, 2)).generate(&mut a);
        let rb = LevelGenerator::new(config(seed, 2)).generate(&mut b);
        match (ra, rb) {
            (Ok(la), Ok(lb)) => {
                prop_assert_eq!(la.seed, lb.seed);
                prop_assert_eq!(la.room_count, lb.room_count);
                prop_assert_eq!(la.assignments, lb.assignments);
                prop_assert_eq!(la.special_rooms, lb.special_rooms);
            }
            (Err(ea), Err(eb)) => prop_assert_eq!(ea.to_string(), eb.to_string()),
            _ => prop_assert!(false, "runs diverged"),
        }
    }
}
