//! Node sequence produced by one traversal attempt.

use std::collections::HashSet;

use super::NodeId;

/// Ordered node sequence backed by a visited set, so cycle checks are O(1) per step.
#[derive(Debug, Clone, Default)]
pub struct TrialPath {
  nodes: Vec<NodeId>,
  visited: HashSet<NodeId>,
  cyclic: bool,
}

impl TrialPath {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends `node`. Returns false if the node was already visited; the path is then
  /// marked cyclic and must not grow further.
  pub fn push(&mut self, node: NodeId) -> bool {
    self.nodes.push(node);
    if self.visited.insert(node) {
      true
    } else {
      self.cyclic = true;
      false
    }
  }

  pub fn is_cyclic(&self) -> bool {
    self.cyclic
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Number of hops (consecutive pairs).
  pub fn hops(&self) -> usize {
    self.nodes.len().saturating_sub(1)
  }

  pub fn first(&self) -> Option<NodeId> {
    self.nodes.first().copied()
  }

  pub fn last(&self) -> Option<NodeId> {
    self.nodes.last().copied()
  }

  /// True if the path starts at `src` and ends at `dest`.
  pub fn spans(&self, src: NodeId, dest: NodeId) -> bool {
    self.first() == Some(src) && self.last() == Some(dest)
  }

  /// Consecutive `(from, to)` pairs along the path.
  pub fn hop_pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
    self.nodes.windows(2).map(|w| (w[0], w[1]))
  }

  pub fn as_slice(&self) -> &[NodeId] {
    &self.nodes
  }

  pub fn into_nodes(self) -> Vec<NodeId> {
    self.nodes
  }
}
