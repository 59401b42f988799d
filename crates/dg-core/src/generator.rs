//! Level generation orchestrator
//!
//! Walks the graph in pending-parent groups, batches each group and hands
//! the batches to the [`Materializer`]. Each attempt runs on its own copy of
//! the graph; a pass that fails with a retryable error is thrown away whole
//! and the next attempt starts from a fresh seed.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::error::{GenerationError, Result};
use crate::graph::{NodeGraph, NodeId};
use crate::layout::{GridLayout, Room, RoomId};
use crate::materialize::{batch_nodes, MaterializationState, Materializer};
use crate::rng::GameRng;

/// A finished level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Seed of the successful attempt
    pub seed: u64,
    /// Attempts it took, including the successful one
    pub attempts: u32,
    pub room_count: u32,
    pub rooms: Vec<Room>,
    pub roots: Vec<RoomId>,
    pub special_rooms: Vec<Option<RoomId>>,
    /// Every materialized node with its room, in node order
    pub assignments: Vec<(NodeId, RoomId)>,
    /// Corrective rooms inserted during the pass
    pub insertions: usize,
}

impl Level {
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.index())
    }
}

/// Progress of an incremental pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// Yielded with groups left to materialize
    Pending,
    Done,
}

/// One generation attempt that can be driven a group at a time
pub struct GenerationPass<'a> {
    materializer: Materializer<'a>,
    groups: Vec<Vec<NodeId>>,
    next_group: usize,
    layout: GridLayout,
    state: MaterializationState,
    rng: GameRng,
}

impl<'a> GenerationPass<'a> {
    /// Start a pass over `graph`, forgetting any earlier room assignment
    pub fn new(graph: &mut NodeGraph, config: &'a GenerationConfig, seed: u64) -> Result<Self> {
        graph.clear_rooms();
        let groups = graph.pending_groups()?;
        Ok(Self {
            materializer: Materializer::new(config),
            groups,
            next_group: 0,
            layout: GridLayout::new(),
            state: MaterializationState::new(),
            rng: GameRng::new(seed),
        })
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn is_done(&self) -> bool {
        self.next_group >= self.groups.len()
    }

    pub fn state(&self) -> &MaterializationState {
        &self.state
    }

    /// Materialize the next group; returns the running room count
    pub fn step(&mut self, graph: &mut NodeGraph) -> Result<u32> {
        let Some(group) = self.groups.get(self.next_group) else {
            return Ok(self.state.room_count);
        };
        self.next_group += 1;

        let queue = batch_nodes(graph, group, self.state.roots.len(), &mut self.rng);
        debug!(
            group = self.next_group,
            nodes = group.len(),
            batches = queue.len(),
            "materializing group"
        );
        self.materializer
            .materialize(graph, &mut self.layout, queue, &mut self.state, &mut self.rng)
    }

    /// Step until done or until `should_yield` asks for the thread back
    ///
    /// At least one group is materialized per call.
    pub fn run_until(
        &mut self,
        graph: &mut NodeGraph,
        mut should_yield: impl FnMut() -> bool,
    ) -> Result<PassStatus> {
        while !self.is_done() {
            self.step(graph)?;
            if !self.is_done() && should_yield() {
                return Ok(PassStatus::Pending);
            }
        }
        Ok(PassStatus::Done)
    }

    /// Package the finished pass
    pub fn finish(self, graph: &NodeGraph, attempts: u32) -> Level {
        let unplaced = graph.iter().filter(|n| !n.is_materialized()).count();
        if unplaced > 0 {
            // unreachable from the entrance, or waiting on a cycle
            warn!(unplaced, "nodes left without a room");
        }
        let assignments = graph
            .iter()
            .filter_map(|node| node.room.map(|room| (node.id, room)))
            .collect();
        Level {
            seed: self.rng.seed(),
            attempts,
            room_count: self.state.room_count,
            insertions: self.state.insertion_count(),
            roots: self.state.roots,
            special_rooms: self.state.special_rooms,
            rooms: self.layout.into_rooms(),
            assignments,
        }
    }
}

/// Wall-clock slice for cooperative yielding
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    started: Instant,
    budget: Duration,
}

impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn exhausted(&self) -> bool {
        self.started.elapsed() >= self.budget
    }

    /// Start a new slice
    pub fn reset(&mut self) {
        self.started = Instant::now();
    }
}

/// Retries generation passes with fresh seeds until one succeeds
#[derive(Debug, Clone)]
pub struct LevelGenerator {
    config: GenerationConfig,
}

impl LevelGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate a level, retrying placement failures
    ///
    /// Attempt `n` uses `seed + n`, where `seed` comes from the config or is
    /// drawn at random. Structural errors are returned at once.
    pub fn generate(&self, graph: &mut NodeGraph) -> Result<Level> {
        self.generate_with(graph, || false, |_| {})
    }

    /// Like [`generate`](Self::generate), yielding between groups
    ///
    /// `on_yield` runs whenever a pass gives the thread back, after which the
    /// pass resumes with a fresh time slice of `yield_budget_ms`.
    pub fn generate_incremental(
        &self,
        graph: &mut NodeGraph,
        mut on_yield: impl FnMut(&MaterializationState),
    ) -> Result<Level> {
        let mut budget = TimeBudget::from_millis(self.config.general.yield_budget_ms);
        let mut should_yield = move || {
            let spent = budget.exhausted();
            if spent {
                budget.reset();
            }
            spent
        };
        self.generate_with(graph, &mut should_yield, &mut on_yield)
    }

    fn generate_with(
        &self,
        graph: &mut NodeGraph,
        mut should_yield: impl FnMut() -> bool,
        mut on_yield: impl FnMut(&MaterializationState),
    ) -> Result<Level> {
        let base = self.config.general.seed.unwrap_or_else(rand::random);
        let max_attempts = self.config.general.max_attempts;
        let mut last_error = None;

        for attempt in 0..max_attempts {
            let seed = base.wrapping_add(u64::from(attempt));
            info!(attempt = attempt + 1, max_attempts, seed, "generation attempt");

            // corrective insertions edit the graph; a failed pass must not leak them
            let mut working = graph.clone();
            let mut pass = GenerationPass::new(&mut working, &self.config, seed)?;
            let outcome = loop {
                match pass.run_until(&mut working, &mut should_yield) {
                    Ok(PassStatus::Done) => break Ok(()),
                    Ok(PassStatus::Pending) => on_yield(pass.state()),
                    Err(e) => break Err(e),
                }
            };

            match outcome {
                Ok(()) => {
                    let level = pass.finish(&working, attempt + 1);
                    *graph = working;
                    info!(
                        seed,
                        rooms = level.room_count,
                        insertions = level.insertions,
                        "level generated"
                    );
                    return Ok(level);
                }
                Err(e) if e.is_retryable() => {
                    warn!(attempt = attempt + 1, seed, "attempt failed: {}", e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GenerationError::Config("max_attempts must be at least 1".to_string())
        }))
    }
}
