//! Convergence engine: repeated stochastic traversals that train the automata and keep the
//! lightest path seen.

use tracing::{debug, error, info, instrument, trace, warn};

use crate::bank::Bank;
use crate::config::LaConfig;
use crate::error::{LaError, Result};
use crate::topology::TopologySource;
use crate::types::{EdgeId, NodeId, PathReport, TrialPath};

/// Narrow path-finding capability.
pub trait PathFinder {
  /// Best path from `src` to `dest`, inclusive of both ends, or empty if none converged.
  fn path(&mut self, src: NodeId, dest: NodeId) -> Vec<NodeId>;

  /// Discards the topology and all learned state.
  fn reset(&mut self);
}

/// Learning-automata path finder over a [Bank].
#[derive(Debug, Clone)]
pub struct LaSystem {
  bank: Bank,
  config: LaConfig,
  load_error: Option<LaError>,
}

impl LaSystem {
  /// Builds the system from `source`. A loader failure is logged and kept in
  /// [LaSystem::load_error]; the system stays usable with whatever was loaded.
  #[instrument(level = "trace", skip(source))]
  pub fn new<S: TopologySource + ?Sized>(source: &S, config: LaConfig) -> Self {
    let config = config.normalized();
    let mut bank = Bank::from_config(&config);
    let load_error = match source.load().and_then(|topology| bank.load(&topology)) {
      Ok(()) => {
        info!(
          automata = bank.automaton_count(),
          edges = bank.edge_count(),
          "topology loaded"
        );
        None
      }
      Err(e) => {
        error!(error = %e, "failed to load topology");
        Some(e)
      }
    };
    Self {
      bank,
      config,
      load_error,
    }
  }

  /// A system without any topology; edges can be added with [LaSystem::insert_edge].
  pub fn empty(config: LaConfig) -> Self {
    let config = config.normalized();
    Self {
      bank: Bank::from_config(&config),
      config,
      load_error: None,
    }
  }

  pub fn insert_edge(&mut self, start: NodeId, end: NodeId, weight: f64) -> Result<EdgeId> {
    self.bank.insert_edge(start, end, weight)
  }

  /// Failure raised while loading the topology at construction, if any.
  pub fn load_error(&self) -> Option<&LaError> {
    self.load_error.as_ref()
  }

  pub fn bank(&self) -> &Bank {
    &self.bank
  }

  pub fn config(&self) -> &LaConfig {
    &self.config
  }

  pub fn iterations(&self) -> usize {
    self.config.iterations
  }

  /// Runs the convergence loop from `src` to `dest` and reports the best path with trial
  /// counters.
  #[instrument(level = "trace", skip(self))]
  pub fn path_report(&mut self, src: NodeId, dest: NodeId) -> PathReport {
    let slot = self.config.time_slot;
    let mut time = slot;
    let mut best: Option<(f64, TrialPath)> = None;
    let mut report = PathReport::default();

    for _ in 0..self.config.iterations {
      let trial = traverse(&mut self.bank, src, dest, time);
      if !trial.spans(src, dest) {
        trace!(path = ?trial.as_slice(), "trial did not reach destination");
        record_time_only(&mut self.bank, &trial, time);
        report.failed_trials += 1;
        time += slot;
        continue;
      }

      let length = match self.bank.path_weight(trial.as_slice()) {
        Ok(length) => length,
        Err(e) => {
          trace!(error = %e, "trial rejected");
          record_time_only(&mut self.bank, &trial, time);
          report.failed_trials += 1;
          time += slot;
          continue;
        }
      };

      let improves = best.as_ref().is_none_or(|(current, _)| length < *current);
      if improves {
        best = Some((length, trial.clone()));
      }

      let fb = feedback(trial.hops(), self.bank.automaton_count());
      apply_feedback(&mut self.bank, &trial, time, fb);
      report.evaluated_trials += 1;
      time += slot;
    }

    if let Some((length, path)) = best {
      report.length = Some(length);
      report.path = path.into_nodes();
    }
    debug!(
      src,
      dest,
      path = ?report.path,
      length = ?report.length,
      evaluated = report.evaluated_trials,
      failed = report.failed_trials,
      "convergence run complete"
    );
    report
  }
}

impl PathFinder for LaSystem {
  fn path(&mut self, src: NodeId, dest: NodeId) -> Vec<NodeId> {
    self.path_report(src, dest).path
  }

  fn reset(&mut self) {
    self.bank.reset();
  }
}

/// Walks from `src` by asking each automaton for its next hop until `dest` is reached, an
/// automaton has no choice, or a node repeats.
pub(crate) fn traverse(bank: &mut Bank, src: NodeId, dest: NodeId, time: f64) -> TrialPath {
  let mut trial = TrialPath::new();
  let mut node = src;
  loop {
    if !trial.push(node) || node == dest {
      break;
    }
    let Some(next) = bank
      .automaton_mut(node)
      .and_then(|automaton| automaton.choose_next(time))
    else {
      break;
    };
    node = next;
  }
  trial
}

/// Reward for a path of `hops` hops in a network of `automata` automata: fewer hops relative to
/// the network size earn more.
pub(crate) fn feedback(hops: usize, automata: usize) -> f64 {
  if automata == 0 {
    return 0.0;
  }
  (1.0 - hops as f64 / automata as f64).clamp(0.0, 1.0)
}

fn apply_feedback(bank: &mut Bank, trial: &TrialPath, time: f64, feedback: f64) {
  for (from, to) in trial.hop_pairs() {
    let outcome = match bank.automaton_mut(from) {
      Some(automaton) => automaton.update_probability(to, time, feedback),
      None => continue,
    };
    if let Err(e) = outcome {
      warn!(error = %e, "reward skipped");
    }
  }
}

fn record_time_only(bank: &mut Bank, trial: &TrialPath, time: f64) {
  for (from, to) in trial.hop_pairs() {
    let outcome = match bank.automaton_mut(from) {
      Some(automaton) => automaton.record_time_only(to, time),
      None => continue,
    };
    if let Err(e) = outcome {
      warn!(error = %e, "time update skipped");
    }
  }
}

/// Among `paths`, the first with the fewest nodes; empty if there are none.
pub fn fewer_hops(paths: &[Vec<NodeId>]) -> Vec<NodeId> {
  paths
    .iter()
    .min_by_key(|path| path.len())
    .cloned()
    .unwrap_or_default()
}

/// Calls `finder.path(src, dest)` `rounds` times, letting learned state carry over, and returns
/// the last result.
pub fn converge<P: PathFinder + ?Sized>(
  finder: &mut P,
  src: NodeId,
  dest: NodeId,
  rounds: usize,
) -> Vec<NodeId> {
  let mut last = Vec::new();
  for round in 1..=rounds {
    last = finder.path(src, dest);
    debug!(round, path = ?last, "path round finished");
  }
  last
}
