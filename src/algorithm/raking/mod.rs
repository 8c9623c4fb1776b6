//! Raking (iterative proportional fitting) of survey seed tables
//!
//! - [`seed`]: dense contingency tables built from person records
//! - [`marginals`]: published targets per dimension
//! - [`solver`]: the IPF loop
//! - [`orchestrator`]: the two nested passes of one (state, year) unit
//! - [`reconcile`]: zero-filling of the reported category spaces

pub mod marginals;
pub mod orchestrator;
pub mod reconcile;
pub mod seed;
pub mod solver;

use std::fmt;

use serde::Serialize;

use crate::models::unit::UnitKey;

pub use marginals::{Marginal, MarginalExtractor, MarginalSet};
pub use orchestrator::{Orchestrator, PassAOutcome, RakedUnit};
pub use seed::{Axis, SeedMatrix};
pub use solver::{ConvergedTable, IpfSolver, RakingReport, UnsatisfiableConstraint};

/// The two nested raking passes of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RakingPass {
    /// Race x sex x age
    ThreeWay,
    /// Race x sex x adult age x education
    FourWay,
}

impl fmt::Display for RakingPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreeWay => f.write_str("pass A (race x sex x age)"),
            Self::FourWay => f.write_str("pass B (race x sex x age x education)"),
        }
    }
}

/// A numerical condition met while raking; never fatal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RakingDiagnostic {
    /// A positive target whose category holds no seed mass
    Unsatisfiable {
        unit: UnitKey,
        pass: RakingPass,
        constraint: UnsatisfiableConstraint,
    },
    /// The sweep cap was reached before the tolerance
    NonConvergence {
        unit: UnitKey,
        pass: RakingPass,
        sweeps: u32,
        max_deviation: f64,
    },
}

impl RakingDiagnostic {
    /// Diagnostics carried by one pass report
    #[must_use]
    pub fn from_report(unit: UnitKey, pass: RakingPass, report: &RakingReport) -> Vec<Self> {
        let mut diagnostics: Vec<Self> = report
            .unsatisfiable
            .iter()
            .map(|constraint| Self::Unsatisfiable {
                unit,
                pass,
                constraint: *constraint,
            })
            .collect();
        if !report.converged {
            diagnostics.push(Self::NonConvergence {
                unit,
                pass,
                sweeps: report.sweeps,
                max_deviation: report.max_deviation,
            });
        }
        diagnostics
    }
}

impl fmt::Display for RakingDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsatisfiable {
                unit,
                pass,
                constraint,
            } => write!(
                f,
                "{unit} {pass}: {} '{}' has target {} but no seed mass",
                constraint.dimension, constraint.category, constraint.target
            ),
            Self::NonConvergence {
                unit,
                pass,
                sweeps,
                max_deviation,
            } => write!(
                f,
                "{unit} {pass}: no convergence after {sweeps} sweeps (deviation {max_deviation:e})"
            ),
        }
    }
}
