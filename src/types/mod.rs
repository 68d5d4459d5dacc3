//! Core value types for the automata network.

mod edge;
mod path_report;
mod trial_path;

pub use edge::Edge;
pub use path_report::PathReport;
pub use trial_path::TrialPath;

/// Identifier of a topology node.
pub type NodeId = u32;

/// Identifier of an edge, assigned monotonically by its owner.
pub type EdgeId = u64;
