//! Raking of American Community Survey person records
//!
//! PUMS person records of each (state, year) unit are raked with iterative
//! proportional fitting against the published ACS marginal totals of that
//! state, first over race x sex x age and then, for the retained adult
//! population, over education as well. The results are written as population
//! cross-tabs together with weighted income summaries.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use algorithm::pipeline::{Pipeline, PumsUnit, RefinerOutput, UnitFailure};
pub use algorithm::raking::{IpfSolver, MarginalSet, RakingDiagnostic, RakingReport, SeedMatrix};
pub use config::{RefinerConfig, SeedWeighting, SolverConfig};
pub use error::{RefinerError, Result};
pub use models::{MarginalTable, PublishedTotals, UnitKey};
pub use utils::io::{OutputWriter, RunInputs, RunManifest, RunSummary};
