//! # lapath
//!
//! Approximate shortest paths on weighted directed graphs with a network of learning
//! automata.
//!
//! ## Architecture
//!
//! - [Automaton]: one per node; a probability per successor, adapted by a linear
//!   reward-inaction rule, and a staleness-aware choice of the next hop.
//! - [Bank]: owns the automata and the edge set, and bins edge weights into size classes.
//! - [LaSystem]: the convergence loop. Each call to [PathFinder::path] runs repeated
//!   stochastic traversals, rewards the automata along every complete trial and returns the
//!   lightest path seen. Learned probabilities persist between calls.
//! - [topology]: loaders producing the edge list the bank is built from.

pub mod automaton;
pub mod bank;
pub mod config;
pub mod engine;
#[cfg(test)]
mod engine_test;
pub mod error;
pub mod topology;
pub mod types;

pub use automaton::Automaton;
pub use bank::Bank;
pub use config::LaConfig;
pub use engine::{LaSystem, PathFinder, converge, fewer_hops};
pub use error::{LaError, Result};
pub use topology::{JsonTopology, Topology, TopologySource};
pub use types::{Edge, EdgeId, NodeId, PathReport, TrialPath};
