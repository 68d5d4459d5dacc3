//! A weighted directed edge of the topology.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use super::{EdgeId, NodeId};

/// A weighted directed edge. Identity (equality, ordering, hashing) is the edge id alone,
/// so parallel edges between the same pair of nodes stay distinct.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
  pub id: EdgeId,
  pub start: NodeId,
  pub end: NodeId,
  pub weight: f64,
}

impl Edge {
  pub fn new(id: EdgeId, start: NodeId, end: NodeId, weight: f64) -> Self {
    Self {
      id,
      start,
      end,
      weight,
    }
  }

  /// True if this edge leads from `start` to `end`.
  pub fn connects(&self, start: NodeId, end: NodeId) -> bool {
    self.start == start && self.end == end
  }
}

impl PartialEq for Edge {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for Edge {}

impl PartialOrd for Edge {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Edge {
  fn cmp(&self, other: &Self) -> Ordering {
    self.id.cmp(&other.id)
  }
}

impl Hash for Edge {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}
