//! Iterative proportional fitting
//!
//! The solver rescales a [`SeedMatrix`] in place until each of its
//! marginals matches the targets of a [`MarginalSet`]. A sweep visits the
//! marginals in the order they were supplied, so the result depends only on
//! the seed, the targets and the [`SolverConfig`].

use serde::Serialize;

use crate::algorithm::raking::marginals::MarginalSet;
use crate::algorithm::raking::seed::SeedMatrix;
use crate::config::SolverConfig;
use crate::error::{RefinerError, Result};
use crate::models::categories::{CategoryValue, Dimension};

/// A target the table cannot reach: no mass in the category but a positive total
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnsatisfiableConstraint {
    pub dimension: Dimension,
    pub category: CategoryValue,
    pub target: f64,
}

/// Outcome of a raking run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RakingReport {
    /// Whether the deviation fell below the tolerance
    pub converged: bool,
    /// Number of full sweeps performed
    pub sweeps: u32,
    /// Largest deviation over the satisfiable constraints after the last sweep
    pub max_deviation: f64,
    /// Constraints recorded as unreachable
    pub unsatisfiable: Vec<UnsatisfiableConstraint>,
}

/// A raked table and how it got there
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergedTable {
    pub table: SeedMatrix,
    pub report: RakingReport,
}

/// A marginal resolved against the axes of a table
struct AxisPlan {
    axis: usize,
    targets: Vec<Option<f64>>,
}

/// IPF solver
#[derive(Debug, Clone, Copy, Default)]
pub struct IpfSolver {
    config: SolverConfig,
}

impl IpfSolver {
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Rake a seed table and hand it back with its report
    pub fn solve(&self, mut seed: SeedMatrix, marginals: &MarginalSet) -> Result<ConvergedTable> {
        let report = self.rake(&mut seed, marginals)?;
        Ok(ConvergedTable {
            table: seed,
            report,
        })
    }

    /// Rake `table` in place.
    ///
    /// Every marginal must constrain one of the table's dimensions and list
    /// only categories present on that axis. Categories of the axis without
    /// a target are left unconstrained.
    pub fn rake(&self, table: &mut SeedMatrix, marginals: &MarginalSet) -> Result<RakingReport> {
        let plans = Self::plan(table, marginals)?;

        if plans.is_empty() {
            return Ok(RakingReport {
                converged: true,
                sweeps: 0,
                max_deviation: 0.0,
                unsatisfiable: Vec::new(),
            });
        }

        let mut sweeps = 0;
        let mut max_deviation = f64::INFINITY;
        while sweeps < self.config.max_sweeps {
            for plan in &plans {
                let sums = table.axis_sums(plan.axis);
                let factors: Vec<f64> = plan
                    .targets
                    .iter()
                    .zip(&sums)
                    .map(|(target, &current)| match target {
                        Some(target) if current > 0.0 => target / current,
                        _ => 1.0,
                    })
                    .collect();
                table.scale_axis(plan.axis, &factors);
            }
            sweeps += 1;

            max_deviation = Self::max_deviation(table, &plans);
            if max_deviation <= self.config.tolerance {
                break;
            }
        }

        let converged = max_deviation <= self.config.tolerance;
        let unsatisfiable = Self::unsatisfiable(table, &plans, marginals);
        for constraint in &unsatisfiable {
            log::debug!(
                "No seed mass for {} '{}' (target {})",
                constraint.dimension,
                constraint.category,
                constraint.target
            );
        }
        if !converged {
            log::debug!(
                "Raking over {:?} stopped after {sweeps} sweeps with deviation {max_deviation:e}",
                table.dimensions()
            );
        }

        Ok(RakingReport {
            converged,
            sweeps,
            max_deviation,
            unsatisfiable,
        })
    }

    /// Resolve each marginal to an axis and a per-position target list
    fn plan(table: &SeedMatrix, marginals: &MarginalSet) -> Result<Vec<AxisPlan>> {
        marginals
            .iter()
            .map(|marginal| {
                let axis = table.axis_index(marginal.dimension()).ok_or_else(|| {
                    RefinerError::InvalidMarginal {
                        column: marginal.dimension().column_name().to_string(),
                        reason: format!(
                            "the table has no {} axis (axes: {:?})",
                            marginal.dimension(),
                            table.dimensions()
                        ),
                    }
                })?;
                let categories = &table.axes()[axis];
                let mut targets = vec![None; categories.len()];
                for (&category, &target) in marginal.targets() {
                    let position = categories.position(category).ok_or_else(|| {
                        RefinerError::UnknownCategory {
                            dimension: marginal.dimension().to_string(),
                            category: category.label().to_string(),
                        }
                    })?;
                    targets[position] = Some(target);
                }
                Ok(AxisPlan { axis, targets })
            })
            .collect()
    }

    /// Positive targets whose category holds no mass
    fn unsatisfiable(
        table: &SeedMatrix,
        plans: &[AxisPlan],
        marginals: &MarginalSet,
    ) -> Vec<UnsatisfiableConstraint> {
        let mut found = Vec::new();
        for (plan, marginal) in plans.iter().zip(marginals) {
            let sums = table.axis_sums(plan.axis);
            let categories = table.axes()[plan.axis].categories();
            for ((category, target), achieved) in categories.iter().zip(&plan.targets).zip(sums) {
                match *target {
                    Some(target) if achieved == 0.0 && target > 0.0 => {
                        found.push(UnsatisfiableConstraint {
                            dimension: marginal.dimension(),
                            category: *category,
                            target,
                        });
                    }
                    _ => {}
                }
            }
        }
        found
    }

    /// Relative deviation (absolute for zero targets) over reachable constraints
    fn max_deviation(table: &SeedMatrix, plans: &[AxisPlan]) -> f64 {
        let mut worst: f64 = 0.0;
        for plan in plans {
            let sums = table.axis_sums(plan.axis);
            for (target, &achieved) in plan.targets.iter().zip(&sums) {
                let Some(target) = *target else { continue };
                if achieved == 0.0 && target > 0.0 {
                    continue;
                }
                let deviation = if target == 0.0 {
                    achieved.abs()
                } else {
                    (achieved - target).abs() / target
                };
                worst = worst.max(deviation);
            }
        }
        worst
    }
}
