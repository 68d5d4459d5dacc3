//! Tests for the convergence engine.

use crate::bank::Bank;
use crate::config::LaConfig;
use crate::engine::{LaSystem, PathFinder, converge, feedback, fewer_hops, traverse};
use crate::error::LaError;
use crate::topology::{JsonTopology, Topology};
use crate::types::NodeId;

fn config() -> LaConfig {
  LaConfig::default().with_seed(7)
}

fn triangle() -> Topology {
  Topology::from_triples([(0, 1, 1.0), (1, 2, 1.0), (0, 2, 5.0)])
}

#[test]
fn feedback_rewards_fewer_hops() {
  assert!((feedback(1, 3) - 2.0 / 3.0).abs() < 1e-12);
  assert!((feedback(2, 3) - 1.0 / 3.0).abs() < 1e-12);
  assert_eq!(feedback(5, 3), 0.0);
  assert_eq!(feedback(1, 0), 0.0);
}

#[test]
fn fewer_hops_picks_first_shortest() {
  let paths = vec![vec![0, 1, 2], vec![0, 2], vec![0, 3]];
  assert_eq!(fewer_hops(&paths), vec![0, 2]);
  assert!(fewer_hops(&[]).is_empty());
}

#[test]
fn traverse_reaches_destination_on_a_line() {
  let mut bank = Bank::new(8, Some(1));
  bank.insert_edge(0, 1, 1.0).unwrap();
  bank.insert_edge(1, 2, 1.0).unwrap();
  let trial = traverse(&mut bank, 0, 2, 0.001);
  assert_eq!(trial.as_slice(), &[0, 1, 2]);
  assert!(!trial.is_cyclic());
}

#[test]
fn traverse_stops_at_dead_end() {
  let mut bank = Bank::new(8, Some(1));
  bank.insert_edge(0, 1, 1.0).unwrap();
  let trial = traverse(&mut bank, 0, 5, 0.001);
  assert_eq!(trial.as_slice(), &[0, 1]);
}

#[test]
fn traverse_from_unknown_node_yields_single_node() {
  let mut bank = Bank::new(8, Some(1));
  bank.insert_edge(0, 1, 1.0).unwrap();
  let trial = traverse(&mut bank, 9, 1, 0.001);
  assert_eq!(trial.as_slice(), &[9]);
  assert!(!bank.contains_node(9));
}

#[test]
fn traverse_halts_on_cycle_within_node_count_plus_one() {
  let mut bank = Bank::new(8, Some(1));
  bank.insert_edge(0, 1, 1.0).unwrap();
  bank.insert_edge(1, 2, 1.0).unwrap();
  bank.insert_edge(2, 0, 1.0).unwrap();
  bank.insert_edge(3, 0, 1.0).unwrap();
  for step in 1..20 {
    let trial = traverse(&mut bank, 0, 3, f64::from(step) * 0.001);
    assert!(trial.is_cyclic());
    assert!(trial.len() <= bank.automaton_count() + 1);
    assert_eq!(trial.last(), Some(0));
  }
}

#[test]
fn path_finds_only_route() {
  let topology = Topology::from_triples([(0, 1, 2.0), (1, 2, 3.0), (2, 3, 1.0)]);
  let mut system = LaSystem::new(&topology, config().with_iterations(50));
  let report = system.path_report(0, 3);
  assert_eq!(report.path, vec![0, 1, 2, 3]);
  assert_eq!(report.length, Some(6.0));
  assert_eq!(report.evaluated_trials, 50);
  assert_eq!(report.failed_trials, 0);
}

#[test]
fn path_prefers_lighter_route_within_one_call() {
  let mut system = LaSystem::new(&triangle(), config());
  let report = system.path_report(0, 2);
  assert_eq!(report.path, vec![0, 1, 2]);
  assert_eq!(report.length, Some(2.0));
}

#[test]
fn lighter_route_dominates_across_persisted_calls() {
  let mut system = LaSystem::new(&triangle(), config());
  let two_hop: Vec<NodeId> = vec![0, 1, 2];
  let hits: Vec<bool> = (0..50).map(|_| system.path(0, 2) == two_hop).collect();
  let first_half = hits[..25].iter().filter(|&&hit| hit).count();
  let second_half = hits[25..].iter().filter(|&&hit| hit).count();
  assert!(second_half >= first_half, "{first_half} then {second_half}");
  assert!(first_half + second_half >= 40, "{hits:?}");
  assert_eq!(hits.last(), Some(&true));
}

#[test]
fn learned_probabilities_persist_between_calls() {
  let mut system = LaSystem::new(&triangle(), config().with_iterations(100));
  system.path(0, 2);
  let learned = system.bank().automaton(0).unwrap().probabilities();
  assert!((learned.values().sum::<f64>() - 1.0).abs() < 1e-9);
  assert_ne!(learned[&1], 0.5);
  system.path_report(0, 2);
  let relearned = system.bank().automaton(0).unwrap().probabilities();
  assert_ne!(relearned, learned);
  assert!((relearned.values().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn disconnected_pair_returns_empty() {
  let topology = Topology::from_triples([(0, 1, 1.0), (2, 3, 1.0)]);
  let mut system = LaSystem::new(&topology, config().with_iterations(200));
  let report = system.path_report(0, 3);
  assert!(report.path.is_empty());
  assert_eq!(report.length, None);
  assert_eq!(report.failed_trials, 200);
  assert!(!report.found());
}

#[test]
fn failed_trial_records_time_without_learning() {
  let topology = Topology::from_triples([(0, 1, 1.0), (0, 4, 1.0), (2, 3, 1.0)]);
  let mut system = LaSystem::new(&topology, config().with_iterations(1));
  let before = system.bank().automaton(0).unwrap().probabilities();
  let report = system.path_report(0, 3);
  assert_eq!(report.failed_trials, 1);

  let a0 = system.bank().automaton(0).unwrap();
  assert_eq!(a0.probabilities(), before);
  let stamped: Vec<_> = [1, 4]
    .into_iter()
    .filter(|&n| a0.last_selected(n) == Some(0.001))
    .collect();
  assert_eq!(stamped.len(), 1, "{a0:?}");
}

#[test]
fn cyclic_trial_records_time_on_every_hop() {
  let topology = Topology::from_triples([(0, 1, 1.0), (1, 0, 1.0), (2, 3, 1.0)]);
  let mut system = LaSystem::new(&topology, config().with_iterations(3));
  let report = system.path_report(0, 3);
  assert_eq!(report.failed_trials, 3);

  let bank = system.bank();
  for (from, to) in [(0, 1), (1, 0)] {
    let automaton = bank.automaton(from).unwrap();
    assert!((automaton.last_selected(to).unwrap() - 0.003).abs() < 1e-12);
    assert_eq!(automaton.probability(to), Some(1.0));
  }
}

#[test]
fn equal_weight_route_does_not_replace_first_best() {
  let square = Topology::from_triples([(0, 1, 1.0), (1, 3, 1.0), (0, 2, 1.0), (2, 3, 1.0)]);
  let first = LaSystem::new(&square, config().with_iterations(1)).path_report(0, 3);
  assert_eq!(first.length, Some(2.0));
  assert!(first.path == vec![0, 1, 3] || first.path == vec![0, 2, 3]);

  // The stale branch wins the second trial, so both routes get evaluated.
  let mut system = LaSystem::new(&square, config().with_iterations(2));
  let report = system.path_report(0, 3);
  let a0 = system.bank().automaton(0).unwrap();
  assert!(a0.last_selected(1).unwrap() > 0.0);
  assert!(a0.last_selected(2).unwrap() > 0.0);
  assert_eq!(report.evaluated_trials, 2);
  assert_eq!(report.length, Some(2.0));
  assert_eq!(report.path, first.path);
}

#[test]
fn reverse_direction_is_unreachable() {
  let mut system = LaSystem::new(&triangle(), config().with_iterations(100));
  assert!(system.path(2, 0).is_empty());
}

#[test]
fn self_path_returns_empty() {
  let mut system = LaSystem::new(&triangle(), config().with_iterations(100));
  assert!(system.path(1, 1).is_empty());
}

#[test]
fn unknown_nodes_return_empty_without_growing_the_bank() {
  let mut system = LaSystem::new(&triangle(), config().with_iterations(20));
  assert!(system.path(40, 41).is_empty());
  assert_eq!(system.bank().automaton_count(), 3);
}

#[test]
fn zero_iterations_fall_back_to_default() {
  let system = LaSystem::empty(LaConfig::default().with_iterations(0));
  assert_eq!(system.iterations(), 3000);
}

#[test]
fn insert_edge_then_path() {
  let mut system = LaSystem::empty(config().with_iterations(30));
  assert_eq!(system.insert_edge(5, 6, 2.0).unwrap(), 1);
  assert_eq!(system.insert_edge(6, 7, 2.0).unwrap(), 2);
  assert_eq!(system.path(5, 7), vec![5, 6, 7]);
}

#[test]
fn reset_discards_topology() {
  let mut system = LaSystem::new(&triangle(), config().with_iterations(20));
  system.reset();
  assert_eq!(system.bank().automaton_count(), 0);
  assert_eq!(system.bank().edge_count(), 0);
  assert!(system.path(0, 2).is_empty());
}

#[test]
fn loader_failure_leaves_usable_empty_system() {
  let source = JsonTopology::from_json_str("{ broken");
  let mut system = LaSystem::new(&source, config().with_iterations(10));
  assert!(matches!(system.load_error(), Some(LaError::Loader(_))));
  assert_eq!(system.bank().automaton_count(), 0);
  assert!(system.path(0, 1).is_empty());
  system.insert_edge(0, 1, 1.0).unwrap();
  assert_eq!(system.path(0, 1), vec![0, 1]);
}

/// Deterministic stand-in used to exercise callers of the trait.
struct ScriptedFinder {
  answers: Vec<Vec<NodeId>>,
  calls: usize,
  resets: usize,
}

impl PathFinder for ScriptedFinder {
  fn path(&mut self, _src: NodeId, _dest: NodeId) -> Vec<NodeId> {
    let answer = self.answers.get(self.calls).cloned().unwrap_or_default();
    self.calls += 1;
    answer
  }

  fn reset(&mut self) {
    self.resets += 1;
  }
}

#[test]
fn converge_returns_last_round() {
  let mut finder = ScriptedFinder {
    answers: vec![vec![0, 2], vec![0, 1, 2], vec![0, 1, 2]],
    calls: 0,
    resets: 0,
  };
  assert_eq!(converge(&mut finder, 0, 2, 3), vec![0, 1, 2]);
  assert_eq!(finder.calls, 3);
  finder.reset();
  assert_eq!(finder.resets, 1);
}

#[test]
fn converge_with_zero_rounds_is_empty() {
  let mut finder = ScriptedFinder {
    answers: vec![vec![0, 1]],
    calls: 0,
    resets: 0,
  };
  assert!(converge(&mut finder, 0, 1, 0).is_empty());
  assert_eq!(finder.calls, 0);
}
