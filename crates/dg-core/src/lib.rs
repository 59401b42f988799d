//! dg-core: dungeon materialization from a level dependency graph
//!
//! A level is described as a DAG of requirements (rooms, locks, keys,
//! secrets, a boss). This crate turns that graph into concrete rooms on a
//! grid, each room carrying the graph nodes it satisfies:
//!
//! 1. [`graph`] walks the DAG into pending-parent groups
//! 2. [`materialize::batch_nodes`] cuts a group into room-sized batches
//! 3. [`Materializer`] places each batch through a [`RoomLayout`]
//! 4. [`LevelGenerator`] retries whole passes with fresh seeds
//!
//! All randomness goes through [`RandomSource`], so a level is reproducible
//! from its seed and graph.

pub mod config;
pub mod demo;
pub mod error;
pub mod generator;
pub mod graph;
pub mod layout;
pub mod materialize;
pub mod rng;

pub use config::{GenerationConfig, Prefab};
pub use error::{GenerationError, Result};
pub use generator::{GenerationPass, Level, LevelGenerator, PassStatus, TimeBudget};
pub use graph::{GraphSpec, Node, NodeGraph, NodeId, NodeType};
pub use layout::{Connection, Directions, GridLayout, Room, RoomId, RoomLayout};
pub use materialize::{Batch, MaterializationState, Materializer};
pub use rng::{GameRng, RandomSource, ScriptedRng};
