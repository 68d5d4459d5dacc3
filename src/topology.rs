//! Topology loading: turns a topology description into an edge list for the bank.
//!
//! The JSON document format is a root object whose `number_of_nodes` key carries the node
//! count and whose every other key holds a list of links:
//!
//! ```json
//! {
//!   "number_of_nodes": 3,
//!   "links": [
//!     { "nodes": [0, 1], "length": 1 },
//!     { "nodes": [1, 2], "length": 1 }
//!   ]
//! }
//! ```
//!
//! Link lists are read in key order and edge ids run 1, 2, 3... across the whole document.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::instrument;

use crate::error::{LaError, Result};
use crate::types::{Edge, EdgeId, NodeId};

/// Root key holding the node count.
pub const NODE_COUNT_KEY: &str = "number_of_nodes";

/// Anything that can produce a topology.
pub trait TopologySource {
  fn load(&self) -> Result<Topology>;
}

/// Edge list with loader-assigned ids plus the declared node count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
  pub node_count: Option<usize>,
  pub edges: Vec<Edge>,
}

impl Topology {
  /// Builds a topology from `(start, end, weight)` triples, numbering edges from 1.
  pub fn from_triples(triples: impl IntoIterator<Item = (NodeId, NodeId, f64)>) -> Self {
    let edges = triples
      .into_iter()
      .zip(1..)
      .map(|((start, end, weight), id)| Edge::new(id, start, end, weight))
      .collect();
    Self {
      node_count: None,
      edges,
    }
  }
}

impl TopologySource for Topology {
  fn load(&self) -> Result<Topology> {
    Ok(self.clone())
  }
}

enum JsonInput {
  File(PathBuf),
  Text(String),
}

/// JSON topology document, read from a file or held in memory.
pub struct JsonTopology {
  input: JsonInput,
}

impl JsonTopology {
  pub fn from_path(path: impl Into<PathBuf>) -> Self {
    Self {
      input: JsonInput::File(path.into()),
    }
  }

  pub fn from_json_str(json: impl Into<String>) -> Self {
    Self {
      input: JsonInput::Text(json.into()),
    }
  }
}

impl TopologySource for JsonTopology {
  fn load(&self) -> Result<Topology> {
    match &self.input {
      JsonInput::File(path) => load_topology_file(path),
      JsonInput::Text(text) => parse_topology(text),
    }
  }
}

/// Reads and parses the JSON topology at `path`.
#[instrument(level = "trace")]
pub fn load_topology_file(path: &Path) -> Result<Topology> {
  let text = std::fs::read_to_string(path)
    .map_err(|e| LaError::Loader(format!("reading {}: {}", path.display(), e)))?;
  parse_topology(&text)
}

/// One entry of a link list.
#[derive(Debug, Deserialize)]
struct RawLink {
  nodes: Vec<NodeId>,
  length: f64,
}

impl RawLink {
  fn into_edge(self, id: EdgeId) -> std::result::Result<Edge, String> {
    let (start, end) = match self.nodes.as_slice() {
      [start, end, ..] => (*start, *end),
      _ => return Err(format!("expected two nodes, got {}", self.nodes.len())),
    };
    if !(self.length.is_finite() && self.length >= 0.0) {
      return Err(format!("invalid length {}", self.length));
    }
    Ok(Edge::new(id, start, end, self.length))
  }
}

/// Parses a JSON topology document.
#[instrument(level = "trace", skip(text))]
pub fn parse_topology(text: &str) -> Result<Topology> {
  let root: serde_json::Value = serde_json::from_str(text)?;
  let serde_json::Value::Object(map) = root else {
    return Err(LaError::Loader("topology root must be a JSON object".to_string()));
  };

  let mut topology = Topology::default();
  let mut next_id: EdgeId = 1;
  for (key, value) in map {
    if key == NODE_COUNT_KEY {
      let count = value
        .as_u64()
        .ok_or_else(|| LaError::Loader(format!("`{NODE_COUNT_KEY}` must be a non-negative integer")))?;
      topology.node_count = Some(count as usize);
      continue;
    }
    let links: Vec<RawLink> = serde_json::from_value(value)
      .map_err(|e| LaError::Loader(format!("link list `{key}`: {e}")))?;
    for (index, link) in links.into_iter().enumerate() {
      let edge = link
        .into_edge(next_id)
        .map_err(|e| LaError::Loader(format!("link list `{key}`, entry {index}: {e}")))?;
      topology.edges.push(edge);
      next_id += 1;
    }
  }
  Ok(topology)
}
