//! Summary of one path-finding call.

use serde::Serialize;

use super::NodeId;

/// Outcome of one convergence run between two nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathReport {
  /// Best path found, inclusive of both ends; empty if no trial was evaluated.
  pub path: Vec<NodeId>,
  /// Summed edge weight of `path`, or `None` when `path` is empty.
  pub length: Option<f64>,
  /// Trials that reached the destination and were evaluated and rewarded.
  pub evaluated_trials: usize,
  /// Trials that were abandoned (dead end, cycle, or rejected evaluation).
  pub failed_trials: usize,
}

impl PathReport {
  pub fn found(&self) -> bool {
    !self.path.is_empty()
  }
}
