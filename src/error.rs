//! Error type shared by the automata, the bank and the topology loader.

use crate::types::NodeId;
use thiserror::Error;

/// Result type alias using [LaError].
pub type Result<T> = std::result::Result<T, LaError>;

/// Errors raised while building or driving the automata network.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LaError {
  /// An update or time-record call referenced a neighbor the automaton does not know.
  #[error("automaton {node}: unknown neighbor {neighbor}")]
  UnknownNeighbor { node: NodeId, neighbor: NodeId },

  /// A trial path is too short or longer than the automata network.
  #[error("no suitable path: {nodes} nodes against {automata} automata")]
  NoSuitablePath { nodes: usize, automata: usize },

  /// The topology description could not be read or is malformed.
  #[error("topology loader failure: {0}")]
  Loader(String),

  /// A configuration file could not be read or parsed.
  #[error("configuration error: {0}")]
  Config(String),

  /// Edge weights must be finite and non-negative.
  #[error("invalid edge weight: {weight}")]
  InvalidWeight { weight: f64 },

  /// Every edge id up to `u64::MAX` is taken.
  #[error("edge ids exhausted")]
  EdgeIdsExhausted,
}

impl From<std::io::Error> for LaError {
  fn from(e: std::io::Error) -> Self {
    LaError::Loader(e.to_string())
  }
}

impl From<serde_json::Error> for LaError {
  fn from(e: serde_json::Error) -> Self {
    LaError::Loader(e.to_string())
  }
}
