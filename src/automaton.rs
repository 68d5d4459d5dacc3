//! Per-node learning automaton.
//!
//! Each automaton keeps one action per known successor node: a selection probability,
//! the virtual time it was last selected and the size class of the edge leading to it.
//! Probabilities are adapted with a linear reward-inaction rule and actions are picked by
//! a cost that trades learned preference against staleness and edge size.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{instrument, trace};

use crate::error::{LaError, Result};
use crate::types::NodeId;

/// Lower bound the reward rule never pushes a probability below.
pub const PROBABILITY_FLOOR: f64 = 0.0001;

/// Step size of the reward-inaction rule.
pub const LEARNING_RATE: f64 = 0.15;

/// Size class of a neighbor inserted without one.
pub const DEFAULT_SIZE_CLASS: u32 = 1;

/// State kept for one successor.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Action {
  probability: f64,
  last_selected: f64,
  size_class: u32,
}

impl Action {
  /// Selection cost at `time`: staleness squared, scaled by preference, discounted by size.
  fn cost(&self, time: f64) -> f64 {
    let elapsed = time - self.last_selected;
    elapsed * elapsed * self.probability / f64::from(self.size_class)
  }
}

/// Stochastic decision unit attached to one node.
#[derive(Debug, Clone)]
pub struct Automaton {
  node: NodeId,
  actions: BTreeMap<NodeId, Action>,
  rng: StdRng,
}

impl Automaton {
  /// Creates an automaton with no neighbors and an entropy-seeded tie-break source.
  pub fn new(node: NodeId) -> Self {
    Self::with_rng(node, StdRng::from_entropy())
  }

  /// Creates an automaton with no neighbors using `rng` for tie-breaks.
  pub fn with_rng(node: NodeId, rng: StdRng) -> Self {
    Self {
      node,
      actions: BTreeMap::new(),
      rng,
    }
  }

  /// Creates an automaton over `neighbors`, each with the default size class and equal probability.
  pub fn with_neighbors(node: NodeId, neighbors: impl IntoIterator<Item = NodeId>) -> Self {
    let mut automaton = Self::new(node);
    for neighbor in neighbors {
      automaton.insert_neighbor(neighbor, DEFAULT_SIZE_CLASS);
    }
    automaton
  }

  /// Node this automaton decides for.
  pub fn node(&self) -> NodeId {
    self.node
  }

  /// Adds `neighbor` unless already known. A new neighbor resets every probability to
  /// `1 / count`.
  pub fn insert_neighbor(&mut self, neighbor: NodeId, size_class: u32) {
    if self.actions.contains_key(&neighbor) {
      return;
    }
    self.actions.insert(
      neighbor,
      Action {
        probability: 0.0,
        last_selected: 0.0,
        size_class: size_class.max(1),
      },
    );
    let uniform = 1.0 / self.actions.len() as f64;
    for action in self.actions.values_mut() {
      action.probability = uniform;
    }
  }

  /// Rewards `neighbor` with `feedback` (clamped to `[0, 1]`) and stamps it as selected at `time`.
  ///
  /// Every other action gives up `LEARNING_RATE * feedback` of its excess above
  /// [PROBABILITY_FLOOR]; the rewarded action receives the sum of what was given up.
  #[instrument(level = "trace", skip(self), fields(node = self.node))]
  pub fn update_probability(&mut self, neighbor: NodeId, time: f64, feedback: f64) -> Result<()> {
    if !self.actions.contains_key(&neighbor) {
      return Err(self.unknown(neighbor));
    }
    let feedback = feedback.clamp(0.0, 1.0);
    let step = LEARNING_RATE * feedback;

    let mut released = 0.0;
    for (_, action) in self.actions.iter_mut().filter(|(id, _)| **id != neighbor) {
      let excess = action.probability - PROBABILITY_FLOOR;
      released += excess;
      action.probability -= step * excess;
    }

    if let Some(rewarded) = self.actions.get_mut(&neighbor) {
      rewarded.probability += step * released;
      rewarded.last_selected = time;
      trace!(probability = rewarded.probability, "action rewarded");
    }
    Ok(())
  }

  /// Stamps `neighbor` as selected at `time` without touching probabilities.
  pub fn record_time_only(&mut self, neighbor: NodeId, time: f64) -> Result<()> {
    let node = self.node;
    let Some(action) = self.actions.get_mut(&neighbor) else {
      return Err(LaError::UnknownNeighbor { node, neighbor });
    };
    action.last_selected = time;
    Ok(())
  }

  /// Picks the neighbor with the highest selection cost at `time`, breaking ties uniformly at
  /// random. `None` if the automaton has no neighbors.
  pub fn choose_next(&mut self, time: f64) -> Option<NodeId> {
    let costs: Vec<(NodeId, f64)> = self
      .actions
      .iter()
      .map(|(&id, action)| (id, action.cost(time)))
      .collect();
    let best = costs
      .iter()
      .map(|&(_, cost)| cost)
      .fold(f64::NEG_INFINITY, f64::max);
    let ties: Vec<NodeId> = costs
      .iter()
      .filter(|&&(_, cost)| cost == best)
      .map(|&(id, _)| id)
      .collect();
    ties.choose(&mut self.rng).copied()
  }

  /// Known neighbor ids in ascending order.
  pub fn neighbors(&self) -> Vec<NodeId> {
    self.actions.keys().copied().collect()
  }

  pub fn neighbor_count(&self) -> usize {
    self.actions.len()
  }

  pub fn has_neighbor(&self, neighbor: NodeId) -> bool {
    self.actions.contains_key(&neighbor)
  }

  pub fn probability(&self, neighbor: NodeId) -> Option<f64> {
    self.actions.get(&neighbor).map(|a| a.probability)
  }

  pub fn last_selected(&self, neighbor: NodeId) -> Option<f64> {
    self.actions.get(&neighbor).map(|a| a.last_selected)
  }

  pub fn size_class(&self, neighbor: NodeId) -> Option<u32> {
    self.actions.get(&neighbor).map(|a| a.size_class)
  }

  /// Snapshot of neighbor probabilities.
  pub fn probabilities(&self) -> BTreeMap<NodeId, f64> {
    self
      .actions
      .iter()
      .map(|(&id, action)| (id, action.probability))
      .collect()
  }

  fn unknown(&self, neighbor: NodeId) -> LaError {
    LaError::UnknownNeighbor {
      node: self.node,
      neighbor,
    }
  }
}
