//! Error types for level generation
//!
//! Generation failures come in two flavours: placement failures, which are
//! cured by throwing the attempt away and reseeding, and structural failures,
//! which mean the incoming graph (or the caller) broke an invariant and
//! retrying would only loop.

use thiserror::Error;

use crate::graph::NodeId;
use crate::layout::RoomId;

/// Errors raised while building or materializing a level
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("No prefab could place batch led by node {node} ({attempts} prefabs tried)")]
    PlacementFailed { node: NodeId, attempts: usize },

    #[error("Batch led by node {node} never found a materialized spawn point ({queued} batches still queued)")]
    UnresolvedDependency { node: NodeId, queued: usize },

    #[error("Entrance node {node} arrived after a root room already exists")]
    DuplicateEntrance { node: NodeId },

    #[error("Graph has no entrance node")]
    MissingEntrance,

    #[error("Prefab set '{set}' is empty")]
    NoPrefabs { set: &'static str },

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Unknown room {0}")]
    UnknownRoom(RoomId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Whether a fresh attempt with a new seed may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::PlacementFailed { .. })
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, GenerationError>;
