//! Solver models

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, HarnessConfig, StorageConfig};
use crate::constants::{EXACT_PREFIX, HEURISTIC_PREFIX};
use crate::error::{AppError, AppResult};

/// Solver category, derived from the program name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverCategory {
    /// The exact solver every ratio is computed against
    ExactBaseline,
    Exact,
    Heuristic,
}

impl SolverCategory {
    /// Categorize a solver by its name
    pub fn for_name(name: &str, baseline: &str) -> Self {
        if name == baseline {
            SolverCategory::ExactBaseline
        } else if name.starts_with(EXACT_PREFIX) {
            SolverCategory::Exact
        } else if name.starts_with(HEURISTIC_PREFIX) {
            SolverCategory::Heuristic
        } else {
            tracing::debug!(solver = %name, "Unprefixed solver name, treating as heuristic");
            SolverCategory::Heuristic
        }
    }
}

/// An external solver program
#[derive(Debug, Clone)]
pub struct Solver {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub category: SolverCategory,
}

impl Solver {
    /// Create a solver invoked as `program` with no arguments
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>, category: SolverCategory) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            category,
        }
    }

    /// Append arguments passed on every invocation
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn is_baseline(&self) -> bool {
        self.category == SolverCategory::ExactBaseline
    }
}

/// The fixed, ordered list of solvers evaluated by a run
#[derive(Debug, Clone)]
pub struct SolverRoster {
    solvers: Vec<Solver>,
}

impl SolverRoster {
    /// Build a roster whose first solver is the baseline
    pub fn new(solvers: Vec<Solver>) -> AppResult<Self> {
        match solvers.first() {
            Some(first) if first.is_baseline() => {}
            Some(first) => {
                return Err(AppError::Configuration(ConfigError::BaselineNotFirst(
                    first.name.clone(),
                )));
            }
            None => {
                return Err(AppError::Configuration(ConfigError::InvalidValue(
                    "SOLVERS".to_string(),
                )));
            }
        }
        if solvers.iter().filter(|s| s.is_baseline()).count() != 1 {
            return Err(AppError::Configuration(ConfigError::InvalidValue(
                "BASELINE_SOLVER".to_string(),
            )));
        }
        Ok(Self { solvers })
    }

    /// Roster of compiled programs in `bin_dir`
    pub fn from_config(harness: &HarnessConfig, storage: &StorageConfig) -> AppResult<Self> {
        let solvers = harness
            .solvers
            .iter()
            .map(|name| {
                Solver::new(
                    name.clone(),
                    program_path(&storage.bin_dir, name),
                    SolverCategory::for_name(name, &harness.baseline),
                )
            })
            .collect();
        Self::new(solvers)
    }

    pub fn baseline(&self) -> &Solver {
        &self.solvers[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Solver> {
        self.solvers.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.solvers.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.solvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solvers.is_empty()
    }

    /// Width of the longest solver name, for aligned console output
    pub fn name_width(&self) -> usize {
        self.names().map(str::len).max().unwrap_or(0)
    }
}

/// Path of a compiled program
pub fn program_path(bin_dir: &Path, name: &str) -> PathBuf {
    bin_dir.join(name)
}
