//! JSON description of a node graph

use serde::{Deserialize, Serialize};

use super::{NodeGraph, NodeId, NodeType};
use crate::error::{GenerationError, Result};

/// One node as written in a graph file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: u32,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Defaults to the first entry of `parents`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tight_parent: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<u32>,
}

/// Serializable form of a [`NodeGraph`]
///
/// Node ids must be dense and listed in order (`0, 1, 2, ...`) so that
/// they map one to one onto arena ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    pub nodes: Vec<NodeSpec>,
}

impl GraphSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl NodeGraph {
    /// Build a graph from its serialized form
    pub fn from_spec(spec: &GraphSpec) -> Result<Self> {
        let mut graph = NodeGraph::new();
        for (idx, node) in spec.nodes.iter().enumerate() {
            if node.id as usize != idx {
                return Err(GenerationError::Graph(format!(
                    "node ids must be dense and ordered: expected {idx}, found {}",
                    node.id
                )));
            }
            let tight = node.tight_parent.or_else(|| node.parents.first().copied());
            graph.add_node(node.node_type, tight.map(NodeId));
        }

        let count = spec.nodes.len() as u32;
        for node in &spec.nodes {
            if let Some(tight) = node.tight_parent
                && tight >= count
            {
                return Err(GenerationError::UnknownNode(NodeId(tight)));
            }
            for &parent in &node.parents {
                graph.add_edge(NodeId(parent), NodeId(node.id))?;
            }
        }
        Ok(graph)
    }

    /// Serializable form of this graph
    pub fn to_spec(&self) -> GraphSpec {
        GraphSpec {
            nodes: self
                .iter()
                .map(|n| NodeSpec {
                    id: n.id.0,
                    node_type: n.node_type,
                    tight_parent: n.tight_couple_parent.map(|p| p.0),
                    parents: n.direct_parents.iter().map(|p| p.0).collect(),
                })
                .collect(),
        }
    }
}
