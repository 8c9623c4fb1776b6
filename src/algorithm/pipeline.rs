//! Refinement pipeline over (state, year) units
//!
//! Each unit is raked independently, optionally on a rayon pool. Results are
//! merged in unit-key order, so a parallel run produces exactly the output of
//! a sequential one.

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::algorithm::raking::{Orchestrator, RakedUnit, RakingDiagnostic};
use crate::config::RefinerConfig;
use crate::error::{RefinerError, Result};
use crate::models::output::{
    AgeCrossTabRow, DetailCrossTabRow, EducationCrossTabRow, IncomeRow,
};
use crate::models::record::{DerivedPersons, RawRecord};
use crate::models::totals::MarginalTable;
use crate::models::unit::UnitKey;
use crate::utils::logging::{
    create_unit_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
};

/// Raw person records of one (state, year) unit
#[derive(Debug, Clone)]
pub struct PumsUnit {
    pub key: UnitKey,
    pub records: Vec<RawRecord>,
}

impl PumsUnit {
    #[must_use]
    pub fn new(key: UnitKey, records: Vec<RawRecord>) -> Self {
        Self { key, records }
    }
}

/// A unit that was skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFailure {
    pub unit: UnitKey,
    pub message: String,
}

/// Accumulated result of a pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefinerOutput {
    pub age_rows: Vec<AgeCrossTabRow>,
    pub education_rows: Vec<EducationCrossTabRow>,
    pub detail_rows: Vec<DetailCrossTabRow>,
    pub income_rows: Vec<IncomeRow>,
    pub diagnostics: Vec<RakingDiagnostic>,
    pub failures: Vec<UnitFailure>,
    /// Units raked to completion
    pub units_completed: usize,
    /// Records dropped for invalid codes, over all completed units
    pub records_rejected: usize,
}

impl RefinerOutput {
    /// Append the rows of one completed unit
    pub fn absorb(&mut self, unit: RakedUnit, rejected: usize) {
        self.age_rows.extend(unit.age_rows);
        self.education_rows.extend(unit.education_rows);
        self.detail_rows.extend(unit.detail_rows);
        self.income_rows.extend(unit.income_rows);
        self.diagnostics.extend(unit.diagnostics);
        self.units_completed += 1;
        self.records_rejected += rejected;
    }

    /// Append another accumulated output
    pub fn merge(&mut self, other: Self) {
        self.age_rows.extend(other.age_rows);
        self.education_rows.extend(other.education_rows);
        self.detail_rows.extend(other.detail_rows);
        self.income_rows.extend(other.income_rows);
        self.diagnostics.extend(other.diagnostics);
        self.failures.extend(other.failures);
        self.units_completed += other.units_completed;
        self.records_rejected += other.records_rejected;
    }

    /// Whether nothing was produced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units_completed == 0 && self.failures.is_empty()
    }
}

type UnitOutcome = Result<(RakedUnit, usize)>;

/// Drives the orchestrator over many units
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: RefinerConfig,
    orchestrator: Orchestrator,
}

impl Pipeline {
    /// Create a pipeline after validating the configuration
    pub fn new(config: RefinerConfig) -> Result<Self> {
        config.validate()?;
        let orchestrator = Orchestrator::new(&config);
        Ok(Self {
            config,
            orchestrator,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RefinerConfig {
        &self.config
    }

    /// Rake every unit against its published totals
    ///
    /// Units with no marginals for their year or state, or with input that
    /// lacks a needed column, are recorded as failures and skipped. Any other
    /// error aborts the run.
    ///
    /// # Errors
    /// Returns an error if `marginals` is empty, the thread pool cannot be
    /// built, or a unit fails with an error that is not scoped to that unit
    pub fn run(&self, mut units: Vec<PumsUnit>, marginals: &MarginalTable) -> Result<RefinerOutput> {
        if marginals.is_empty() {
            return Err(RefinerError::Config(
                "no published marginals were loaded".to_string(),
            ));
        }

        let start = Instant::now();
        log_operation_start("Raking units", format!("{} units", units.len()));

        units.sort_by_key(|unit| unit.key);
        if let Some(pair) = units.windows(2).find(|pair| pair[0].key == pair[1].key) {
            return Err(RefinerError::InvalidKey(format!(
                "unit {} appears more than once",
                pair[0].key
            )));
        }

        let pb = create_unit_progress_bar(units.len() as u64, self.config.show_progress);

        let outcomes: Vec<UnitOutcome> = if self.config.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.worker_threads())
                .build()
                .map_err(|e| RefinerError::Config(format!("failed to build thread pool: {e}")))?;
            pool.install(|| {
                units
                    .par_iter()
                    .map(|unit| {
                        let outcome = self.run_unit(unit, marginals);
                        pb.inc(1);
                        outcome
                    })
                    .collect()
            })
        } else {
            units
                .iter()
                .map(|unit| {
                    let outcome = self.run_unit(unit, marginals);
                    pb.inc(1);
                    outcome
                })
                .collect()
        };

        let mut output = RefinerOutput::default();
        for (unit, outcome) in units.iter().zip(outcomes) {
            match outcome {
                Ok((raked, rejected)) => output.absorb(raked, rejected),
                Err(e) if e.is_unit_scoped() => {
                    log::warn!("Skipping unit {}: {e}", unit.key);
                    output.failures.push(UnitFailure {
                        unit: unit.key,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        for diagnostic in &output.diagnostics {
            log::warn!("{diagnostic}");
        }

        finish_progress_bar(
            &pb,
            Some(&format!(
                "{} raked, {} skipped",
                output.units_completed,
                output.failures.len()
            )),
        );
        log_operation_complete(
            "raked",
            format!("{} units", output.units_completed),
            output.age_rows.len() + output.education_rows.len() + output.detail_rows.len(),
            Some(start.elapsed()),
        );
        Ok(output)
    }

    /// Rake one unit, returning its rows and the number of rejected records
    pub fn run_unit(&self, unit: &PumsUnit, marginals: &MarginalTable) -> UnitOutcome {
        let totals = marginals.lookup(&unit.key)?;

        let derived = DerivedPersons::from_records(&unit.records, unit.key.year.schooling_codes());
        let rejected = derived.rejected_count();
        if rejected > 0 {
            log::info!(
                "{}: rejected {rejected} of {} records {:?}",
                unit.key,
                unit.records.len(),
                derived.rejected
            );
        }

        let raked = self
            .orchestrator
            .run_unit(unit.key, totals, &derived.persons)?;
        log::debug!(
            "{}: {} diagnostics from {} persons",
            unit.key,
            raked.diagnostics.len(),
            derived.persons.len()
        );
        Ok((raked, rejected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::totals::PublishedTotals;
    use crate::models::unit::{StateCode, SurveyYear};

    fn config() -> RefinerConfig {
        RefinerConfig {
            show_progress: false,
            ..RefinerConfig::default()
        }
    }

    #[test]
    fn test_empty_marginals_are_rejected() {
        let pipeline = Pipeline::new(config()).unwrap();
        assert!(matches!(
            pipeline.run(Vec::new(), &MarginalTable::new()),
            Err(RefinerError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_year_and_state_become_failures() {
        let mut marginals = MarginalTable::new();
        marginals.insert(
            SurveyYear::new(2010).unwrap(),
            PublishedTotals::new(StateCode::new("TX").unwrap(), 48),
        );
        let units = vec![
            PumsUnit::new(UnitKey::parse("NY", 2011).unwrap(), Vec::new()),
            PumsUnit::new(UnitKey::parse("NY", 2010).unwrap(), Vec::new()),
        ];

        let output = Pipeline::new(config()).unwrap().run(units, &marginals).unwrap();
        assert_eq!(output.units_completed, 0);
        assert_eq!(output.failures.len(), 2);
        assert_eq!(output.failures[0].unit, UnitKey::parse("NY", 2010).unwrap());
        assert!(output.failures[0].message.contains("NY"));
        assert!(output.failures[1].message.contains("2011"));
    }

    #[test]
    fn test_duplicate_units_are_rejected() {
        let mut marginals = MarginalTable::new();
        marginals.insert(
            SurveyYear::new(2010).unwrap(),
            PublishedTotals::new(StateCode::new("NY").unwrap(), 36),
        );
        let key = UnitKey::parse("NY", 2010).unwrap();
        let units = vec![PumsUnit::new(key, Vec::new()), PumsUnit::new(key, Vec::new())];
        assert!(matches!(
            Pipeline::new(config()).unwrap().run(units, &marginals),
            Err(RefinerError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = config();
        config.solver.max_sweeps = 0;
        assert!(Pipeline::new(config).is_err());
    }
}
