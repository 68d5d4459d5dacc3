//! Tuning parameters for the convergence loop and the bank.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracing::{instrument, warn};

use crate::error::{LaError, Result};

/// Trials per path-finding call when none (or zero) is configured.
pub const DEFAULT_ITERATIONS: usize = 3000;

/// Virtual clock increment between trials.
pub const DEFAULT_TIME_SLOT: f64 = 0.001;

/// Number of buckets edge weights are binned into.
pub const DEFAULT_SIZE_CLASSES: u32 = 8;

pub const ENV_ITERATIONS: &str = "LAPATH_ITERATIONS";
pub const ENV_TIME_SLOT: &str = "LAPATH_TIME_SLOT";
pub const ENV_SIZE_CLASSES: &str = "LAPATH_SIZE_CLASSES";
pub const ENV_SEED: &str = "LAPATH_SEED";

/// Configuration of an [LaSystem](crate::LaSystem).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LaConfig {
  /// Trials run by each path-finding call.
  pub iterations: usize,
  /// Virtual time advanced after every trial.
  pub time_slot: f64,
  /// Size classes `K` used to bin edge weights.
  pub size_classes: u32,
  /// Seed for the automata tie-break sources; entropy-seeded when `None`.
  pub seed: Option<u64>,
}

impl Default for LaConfig {
  fn default() -> Self {
    Self {
      iterations: DEFAULT_ITERATIONS,
      time_slot: DEFAULT_TIME_SLOT,
      size_classes: DEFAULT_SIZE_CLASSES,
      seed: None,
    }
  }
}

impl LaConfig {
  /// Defaults overridden by the `LAPATH_*` environment variables.
  pub fn from_env() -> Self {
    Self::default().with_env()
  }

  /// Defaults overridden by whatever `lookup` returns for the `LAPATH_*` keys.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    Self::default().with_lookup(lookup)
  }

  /// Reads a JSON configuration file. Missing fields keep their defaults.
  #[instrument(level = "trace", skip(path), fields(path = %path.display()))]
  pub fn from_json_file(path: &Path) -> Result<Self> {
    let text = fs::read_to_string(path)
      .map_err(|e| LaError::Config(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text).map_err(|e| LaError::Config(format!("{}: {e}", path.display())))
  }

  /// `self` overridden by the `LAPATH_*` environment variables.
  pub fn with_env(self) -> Self {
    self.with_lookup(|key| std::env::var(key).ok())
  }

  /// `self` overridden by whatever `lookup` returns for the `LAPATH_*` keys.
  /// Values that do not parse are ignored.
  pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    override_from(&lookup, ENV_ITERATIONS, &mut self.iterations);
    override_from(&lookup, ENV_TIME_SLOT, &mut self.time_slot);
    override_from(&lookup, ENV_SIZE_CLASSES, &mut self.size_classes);
    let mut seed = 0u64;
    if override_from(&lookup, ENV_SEED, &mut seed) {
      self.seed = Some(seed);
    }
    self
  }

  /// Builder-style iteration override.
  pub fn with_iterations(mut self, iterations: usize) -> Self {
    self.iterations = iterations;
    self
  }

  /// Builder-style seed override.
  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = Some(seed);
    self
  }

  /// Replaces unusable values (zero iterations or size classes, a non-positive time slot) with
  /// the defaults.
  pub fn normalized(mut self) -> Self {
    if self.iterations == 0 {
      self.iterations = DEFAULT_ITERATIONS;
    }
    if !(self.time_slot.is_finite() && self.time_slot > 0.0) {
      self.time_slot = DEFAULT_TIME_SLOT;
    }
    if self.size_classes == 0 {
      self.size_classes = DEFAULT_SIZE_CLASSES;
    }
    self
  }
}

/// Parses `key` into `field` when present. Returns true if the field was overridden.
fn override_from<T: FromStr>(
  lookup: &impl Fn(&str) -> Option<String>,
  key: &str,
  field: &mut T,
) -> bool {
  let Some(raw) = lookup(key) else {
    return false;
  };
  match raw.trim().parse() {
    Ok(value) => {
      *field = value;
      true
    }
    Err(_) => {
      warn!(key, value = %raw, "ignoring unparsable configuration value");
      false
    }
  }
}
