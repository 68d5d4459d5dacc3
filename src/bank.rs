//! Owner of every automaton and every edge of the topology.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

use crate::automaton::Automaton;
use crate::config::{DEFAULT_SIZE_CLASSES, LaConfig};
use crate::error::{LaError, Result};
use crate::topology::Topology;
use crate::types::{Edge, EdgeId, NodeId};

/// First id handed out by a fresh bank.
const FIRST_EDGE_ID: EdgeId = 1;

/// Spreads per-node seeds apart when a bank-wide seed is configured.
const SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Automata keyed by node id plus the edge set keyed by edge id.
///
/// Invariant: for every edge `(s, e, w)`, the automaton of `s` knows `e` as a neighbor and an
/// automaton for `e` exists.
#[derive(Debug, Clone)]
pub struct Bank {
  automata: HashMap<NodeId, Automaton>,
  edges: BTreeMap<EdgeId, Edge>,
  /// Summed weight of all parallel edges per `(start, end)` pair.
  pair_weights: HashMap<(NodeId, NodeId), f64>,
  next_edge_id: EdgeId,
  max_weight: f64,
  size_classes: u32,
  seed: Option<u64>,
}

impl Default for Bank {
  fn default() -> Self {
    Self::new(DEFAULT_SIZE_CLASSES, None)
  }
}

impl Bank {
  /// Creates an empty bank binning weights into `size_classes` buckets. With a `seed`, every
  /// automaton gets a deterministic tie-break source derived from it and its node id.
  pub fn new(size_classes: u32, seed: Option<u64>) -> Self {
    Self {
      automata: HashMap::new(),
      edges: BTreeMap::new(),
      pair_weights: HashMap::new(),
      next_edge_id: FIRST_EDGE_ID,
      max_weight: 0.0,
      size_classes: size_classes.max(1),
      seed,
    }
  }

  pub fn from_config(config: &LaConfig) -> Self {
    Self::new(config.size_classes, config.seed)
  }

  /// Inserts every edge of `topology`. Size classes are relative to the heaviest edge of the
  /// whole topology. Every edge is checked first, so a failing load leaves the bank untouched.
  #[instrument(level = "trace", skip(self, topology), fields(edges = topology.edges.len()))]
  pub fn load(&mut self, topology: &Topology) -> Result<()> {
    let mut seen = HashSet::with_capacity(topology.edges.len());
    for edge in &topology.edges {
      check_weight(edge.weight)?;
      if self.edges.contains_key(&edge.id) || !seen.insert(edge.id) {
        return Err(duplicate_id(edge.id));
      }
    }
    self.max_weight = topology
      .edges
      .iter()
      .map(|e| e.weight)
      .fold(self.max_weight, f64::max);
    for edge in &topology.edges {
      self.insert_loaded(*edge)?;
    }
    debug!(
      automata = self.automata.len(),
      edges = self.edges.len(),
      max_weight = self.max_weight,
      "topology loaded into bank"
    );
    Ok(())
  }

  /// Records a new edge and returns the id assigned to it.
  pub fn insert_edge(&mut self, start: NodeId, end: NodeId, weight: f64) -> Result<EdgeId> {
    check_weight(weight)?;
    let id = self.next_edge_id;
    if self.edges.contains_key(&id) {
      return Err(LaError::EdgeIdsExhausted);
    }
    self.next_edge_id = id.saturating_add(1);
    self.max_weight = self.max_weight.max(weight);
    self.record(Edge::new(id, start, end, weight));
    Ok(id)
  }

  /// Records an edge whose id was assigned by a loader.
  pub fn insert_loaded(&mut self, edge: Edge) -> Result<()> {
    check_weight(edge.weight)?;
    if self.edges.contains_key(&edge.id) {
      return Err(duplicate_id(edge.id));
    }
    self.next_edge_id = self.next_edge_id.max(edge.id.saturating_add(1));
    self.max_weight = self.max_weight.max(edge.weight);
    self.record(edge);
    Ok(())
  }

  fn record(&mut self, edge: Edge) {
    let size_class = self.size_classify(edge.weight);
    *self
      .pair_weights
      .entry((edge.start, edge.end))
      .or_insert(0.0) += edge.weight;
    self.edges.insert(edge.id, edge);
    self
      .automaton_entry(edge.start)
      .insert_neighbor(edge.end, size_class);
    self.automaton_entry(edge.end);
  }

  fn automaton_entry(&mut self, node: NodeId) -> &mut Automaton {
    let seed = self.seed;
    self
      .automata
      .entry(node)
      .or_insert_with(|| spawn_automaton(node, seed))
  }

  /// Buckets `weight` into `1..=K` by linear binning against the heaviest observed edge.
  pub fn size_classify(&self, weight: f64) -> u32 {
    let classes = self.size_classes;
    if weight <= 0.0 {
      return 1;
    }
    if weight >= self.max_weight {
      return classes;
    }
    let bucket = (f64::from(classes) * weight / self.max_weight).floor() as u32 + 1;
    bucket.clamp(1, classes)
  }

  /// Summed edge weight along `path`.
  ///
  /// Fails with [LaError::NoSuitablePath] when the path has fewer than two nodes or more hops
  /// than there are automata.
  pub fn path_weight(&self, path: &[NodeId]) -> Result<f64> {
    let automata = self.automata.len();
    if path.len() < 2 || path.len() - 1 > automata {
      return Err(LaError::NoSuitablePath {
        nodes: path.len(),
        automata,
      });
    }
    Ok(
      path
        .windows(2)
        .map(|hop| self.pair_weight(hop[0], hop[1]))
        .sum(),
    )
  }

  /// Summed weight of every edge from `start` to `end` (0 when there is none).
  pub fn pair_weight(&self, start: NodeId, end: NodeId) -> f64 {
    self
      .pair_weights
      .get(&(start, end))
      .copied()
      .unwrap_or(0.0)
  }

  /// Discards all edges, automata and learned state.
  pub fn reset(&mut self) {
    self.automata.clear();
    self.edges.clear();
    self.pair_weights.clear();
    self.next_edge_id = FIRST_EDGE_ID;
    self.max_weight = 0.0;
  }

  pub fn automaton(&self, node: NodeId) -> Option<&Automaton> {
    self.automata.get(&node)
  }

  pub fn automaton_mut(&mut self, node: NodeId) -> Option<&mut Automaton> {
    self.automata.get_mut(&node)
  }

  pub fn automaton_count(&self) -> usize {
    self.automata.len()
  }

  pub fn contains_node(&self, node: NodeId) -> bool {
    self.automata.contains_key(&node)
  }

  /// Edges in ascending id order.
  pub fn edges(&self) -> impl Iterator<Item = &Edge> {
    self.edges.values()
  }

  pub fn edge_count(&self) -> usize {
    self.edges.len()
  }

  pub fn max_weight(&self) -> f64 {
    self.max_weight
  }

  pub fn size_classes(&self) -> u32 {
    self.size_classes
  }

  /// Learned probabilities of every automaton, keyed by node then neighbor.
  pub fn probabilities(&self) -> BTreeMap<NodeId, BTreeMap<NodeId, f64>> {
    self
      .automata
      .iter()
      .map(|(&node, automaton)| (node, automaton.probabilities()))
      .collect()
  }
}

fn check_weight(weight: f64) -> Result<()> {
  if weight.is_finite() && weight >= 0.0 {
    Ok(())
  } else {
    Err(LaError::InvalidWeight { weight })
  }
}

fn duplicate_id(id: EdgeId) -> LaError {
  LaError::Loader(format!("duplicate edge id {id}"))
}

fn spawn_automaton(node: NodeId, seed: Option<u64>) -> Automaton {
  match seed {
    Some(seed) => {
      let node_seed = seed.wrapping_add(u64::from(node).wrapping_mul(SEED_STRIDE));
      Automaton::with_rng(node, StdRng::seed_from_u64(node_seed))
    }
    None => Automaton::new(node),
  }
}
