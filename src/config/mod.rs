//! Configuration for the refiner.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RefinerError, Result};

/// How records contribute to the cells of a seed table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedWeighting {
    /// Every record counts once
    #[default]
    Count,
    /// Every record counts with its sampling weight
    SamplingWeight,
}

/// Stopping rule of the raking solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Largest accepted relative deviation between an achieved marginal and its target
    pub tolerance: f64,
    /// Maximum number of full sweeps over all dimensions
    pub max_sweeps: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_sweeps: 1000,
        }
    }
}

/// Configuration for a refiner run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerConfig {
    /// Solver stopping rule
    pub solver: SolverConfig,
    /// Seed cell contribution of each record
    pub seed_weighting: SeedWeighting,
    /// Rake (state, year) units in parallel
    pub parallel: bool,
    /// Worker threads for parallel runs (defaults to the number of CPUs)
    pub threads: Option<usize>,
    /// Draw a progress bar while units are processed
    pub show_progress: bool,
    /// Batch size used when reading Parquet input
    pub batch_size: usize,
    /// Also write one output file per stratum
    pub partition_output: bool,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            seed_weighting: SeedWeighting::Count,
            parallel: true,
            threads: None,
            show_progress: true,
            batch_size: 16384,
            partition_output: false,
        }
    }
}

impl RefinerConfig {
    /// Load a configuration from a JSON file; absent fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = crate::error::util::safe_open_file(path, "refiner configuration")?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the solver or the reader cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.solver.tolerance.is_finite() && self.solver.tolerance > 0.0) {
            return Err(RefinerError::Config(format!(
                "solver tolerance must be a positive number, got {}",
                self.solver.tolerance
            )));
        }
        if self.solver.max_sweeps == 0 {
            return Err(RefinerError::Config(
                "solver max_sweeps must be at least 1".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(RefinerError::Config("threads must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(RefinerError::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Worker threads to use for parallel runs
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

impl fmt::Display for RefinerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Refiner Configuration:")?;
        writeln!(f, "  Tolerance: {:e}", self.solver.tolerance)?;
        writeln!(f, "  Max Sweeps: {}", self.solver.max_sweeps)?;
        writeln!(f, "  Seed Weighting: {:?}", self.seed_weighting)?;
        if self.parallel {
            writeln!(f, "  Parallel: yes ({} threads)", self.worker_threads())?;
        } else {
            writeln!(f, "  Parallel: no")?;
        }
        writeln!(f, "  Batch Size: {}", self.batch_size)?;
        writeln!(f, "  Partitioned Output: {}", self.partition_output)?;
        Ok(())
    }
}
