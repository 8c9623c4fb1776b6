//! The two nested raking passes of one (state, year) unit
//!
//! Pass A rakes race x sex x age over the whole population. Its converged
//! table, restricted to the retained races and the adult age bands, supplies
//! the targets of pass B, which adds education. Both results are collapsed
//! to the reported categories and zero-filled.

use crate::algorithm::income::IncomeRefiner;
use crate::algorithm::raking::marginals::{
    Marginal, MarginalExtractor, MarginalSet, population_25_plus,
};
use crate::algorithm::raking::reconcile::{
    AgeKey, DetailKey, EducationKey, age_space, detail_space, education_space, reconcile,
};
use crate::algorithm::raking::seed::{Axis, SeedMatrix};
use crate::algorithm::raking::solver::{ConvergedTable, IpfSolver};
use crate::algorithm::raking::{RakingDiagnostic, RakingPass};
use crate::config::{RefinerConfig, SeedWeighting};
use crate::error::{RefinerError, Result};
use crate::models::categories::{
    AgeBand, Category, CategoryValue, Dimension, Education, RaceEthnicity, Sex,
};
use crate::models::output::{AgeCrossTabRow, DetailCrossTabRow, EducationCrossTabRow, IncomeRow};
use crate::models::record::Person;
use crate::models::totals::PublishedTotals;
use crate::models::unit::UnitKey;

/// Result of the three-way pass
#[derive(Debug, Clone)]
pub struct PassAOutcome {
    /// The raked race x sex x age table
    pub converged: ConvergedTable,
    /// The raked table restricted to retained races and adult bands
    pub restricted: SeedMatrix,
    /// Race sums of the restricted table
    pub race: Marginal,
    /// Sex sums of the restricted table
    pub sex: Marginal,
    /// Age sums of the restricted table
    pub age: Marginal,
}

/// Everything one unit contributes to the output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RakedUnit {
    pub age_rows: Vec<AgeCrossTabRow>,
    pub education_rows: Vec<EducationCrossTabRow>,
    pub detail_rows: Vec<DetailCrossTabRow>,
    pub income_rows: Vec<IncomeRow>,
    pub diagnostics: Vec<RakingDiagnostic>,
}

/// Runs both passes with one solver configuration
#[derive(Debug, Clone, Copy)]
pub struct Orchestrator {
    solver: IpfSolver,
    weighting: SeedWeighting,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: &RefinerConfig) -> Self {
        Self {
            solver: IpfSolver::new(config.solver),
            weighting: config.seed_weighting,
        }
    }

    /// Rake race x sex x age against the published counts
    pub fn pass_a(&self, totals: &PublishedTotals, persons: &[Person]) -> Result<PassAOutcome> {
        let marginals = MarginalSet::new()
            .with(MarginalExtractor::counts(totals, RaceEthnicity::all())?)?
            .with(MarginalExtractor::counts(totals, Sex::all())?)?
            .with(MarginalExtractor::counts(totals, AgeBand::all())?)?;

        let seed = SeedMatrix::from_persons(
            persons,
            vec![
                Axis::all::<RaceEthnicity>(),
                Axis::all::<Sex>(),
                Axis::all::<AgeBand>(),
            ],
            self.weighting,
        )?;
        let converged = self.solver.solve(seed, &marginals)?;

        let restricted = converged.table.restrict(&[
            (Dimension::RaceEthnicity, values(&RaceEthnicity::RETAINED)),
            (Dimension::AgeBand, values(&AgeBand::ADULT)),
        ])?;

        Ok(PassAOutcome {
            race: restricted_marginal(&restricted, Dimension::RaceEthnicity)?,
            sex: restricted_marginal(&restricted, Dimension::Sex)?,
            age: restricted_marginal(&restricted, Dimension::AgeBand)?,
            converged,
            restricted,
        })
    }

    /// Rake race x sex x adult age x education against the pass A sums and
    /// the published education shares
    pub fn pass_b(
        &self,
        pass_a: &PassAOutcome,
        totals: &PublishedTotals,
        persons: &[Person],
    ) -> Result<ConvergedTable> {
        let population = population_25_plus(&pass_a.age);
        let education = MarginalExtractor::education_shares(totals, population)?;

        let marginals = MarginalSet::new()
            .with(pass_a.race.clone())?
            .with(pass_a.sex.clone())?
            .with(pass_a.age.clone())?
            .with(education)?;

        let seed = SeedMatrix::from_persons(
            persons,
            vec![
                Axis::of(&RaceEthnicity::RETAINED),
                Axis::all::<Sex>(),
                Axis::of(&AgeBand::ADULT),
                Axis::all::<Education>(),
            ],
            self.weighting,
        )?;
        let converged = self.solver.solve(seed, &marginals)?;

        // The 25-34 band never reaches the pass B axes; keep the result on the adult bands only
        let table = converged
            .table
            .restrict(&[(Dimension::AgeBand, values(&AgeBand::ADULT))])?;
        Ok(ConvergedTable {
            table,
            report: converged.report,
        })
    }

    /// Run both passes for one unit and build its output rows
    pub fn run_unit(
        &self,
        key: UnitKey,
        totals: &PublishedTotals,
        persons: &[Person],
    ) -> Result<RakedUnit> {
        let pass_a = self.pass_a(totals, persons)?;
        let pass_b = self.pass_b(&pass_a, totals, persons)?;

        let mut diagnostics =
            RakingDiagnostic::from_report(key, RakingPass::ThreeWay, &pass_a.converged.report);
        diagnostics.extend(RakingDiagnostic::from_report(
            key,
            RakingPass::FourWay,
            &pass_b.report,
        ));

        let fips = totals.fips;
        let year = key.year.get();

        let age_sums = pass_a.restricted.collapse(age_key);
        let age_rows = reconcile(&age_space(), &age_sums)
            .into_iter()
            .map(|((race, sex, age), total)| AgeCrossTabRow {
                fips,
                year,
                race: race.label().to_string(),
                sex: sex.label().to_string(),
                age: age.label().to_string(),
                total,
            })
            .collect();

        let education_sums = pass_b.table.collapse(education_key);
        let education_rows = reconcile(&education_space(), &education_sums)
            .into_iter()
            .map(|((race, sex, education), total)| EducationCrossTabRow {
                fips,
                year,
                race: race.label().to_string(),
                sex: sex.label().to_string(),
                education: education.label().to_string(),
                total,
            })
            .collect();

        let detail_sums = pass_b.table.collapse(detail_key);
        let detail_rows = reconcile(&detail_space(), &detail_sums)
            .into_iter()
            .map(|((race, sex, age, education), total)| DetailCrossTabRow {
                fips,
                year,
                race: race.label().to_string(),
                sex: sex.label().to_string(),
                age: age.label().to_string(),
                education: education.label().to_string(),
                total,
            })
            .collect();

        Ok(RakedUnit {
            age_rows,
            education_rows,
            detail_rows,
            income_rows: IncomeRefiner::summarise(fips, key.year, persons),
            diagnostics,
        })
    }
}

fn values<C>(categories: &[C]) -> Vec<CategoryValue>
where
    C: Category + Into<CategoryValue>,
{
    categories.iter().map(|&c| c.into()).collect()
}

fn restricted_marginal(table: &SeedMatrix, dimension: Dimension) -> Result<Marginal> {
    let sums = table.marginal(dimension).ok_or_else(|| RefinerError::InvalidMarginal {
        column: dimension.column_name().to_string(),
        reason: format!("the raked table has no {dimension} axis"),
    })?;
    Marginal::new(dimension, sums)
}

/// Cells are keyed race, sex, age in pass A
fn age_key(cell: &[CategoryValue]) -> Option<AgeKey> {
    match cell {
        [CategoryValue::Race(race), CategoryValue::Sex(sex), CategoryValue::Age(age)] => {
            Some((*race, *sex, age.reporting()?))
        }
        _ => None,
    }
}

/// Cells are keyed race, sex, age, education in pass B
fn education_key(cell: &[CategoryValue]) -> Option<EducationKey> {
    match cell {
        [
            CategoryValue::Race(race),
            CategoryValue::Sex(sex),
            CategoryValue::Age(_),
            CategoryValue::Education(education),
        ] => Some((*race, *sex, education.bucket())),
        _ => None,
    }
}

fn detail_key(cell: &[CategoryValue]) -> Option<DetailKey> {
    match cell {
        [
            CategoryValue::Race(race),
            CategoryValue::Sex(sex),
            CategoryValue::Age(age),
            CategoryValue::Education(education),
        ] => Some((*race, *sex, age.reporting()?, education.bucket())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::categories::EducationBucket;
    use crate::models::unit::StateCode;

    fn person(race: RaceEthnicity, sex: Sex, age_band: AgeBand, education: Education) -> Person {
        Person {
            weight: 20.0,
            age_band,
            race,
            sex,
            education: Some(education),
            income: Some(30_000.0),
        }
    }

    fn population() -> Vec<Person> {
        let mut persons = Vec::new();
        for &race in RaceEthnicity::all() {
            for &sex in Sex::all() {
                for &age in AgeBand::all() {
                    for &education in Education::all() {
                        persons.push(person(race, sex, age, education));
                    }
                }
            }
        }
        persons
    }

    fn totals() -> PublishedTotals {
        let mut totals = PublishedTotals::new(StateCode::new("NY").unwrap(), 36)
            .with_value("POP_WNH", 4_000.0)
            .with_value("POP_BNH", 2_000.0)
            .with_value("POP_ONH", 1_000.0)
            .with_value("POP_HISP", 1_000.0)
            .with_value("POP_M", 3_800.0)
            .with_value("POP_F", 4_200.0);
        for &age in AgeBand::all() {
            if let Some(column) = age.column() {
                totals = totals.with_value(column, 8_000.0 / 13.0);
            }
        }
        for &education in Education::all() {
            if let Some(column) = education.column() {
                totals = totals.with_value(column, 100.0 / 7.0);
            }
        }
        totals
    }

    #[test]
    fn test_pass_a_restricts_to_retained_adults() {
        let orchestrator = Orchestrator::new(&RefinerConfig::default());
        let outcome = orchestrator.pass_a(&totals(), &population()).unwrap();
        assert!(outcome.converged.report.converged);
        assert_eq!(outcome.restricted.len(), 2 * 2 * 7);
        assert_eq!(outcome.race.targets().len(), 2);
        assert_eq!(outcome.age.targets().len(), 7);
        assert!((outcome.race.total() - outcome.restricted.total()).abs() < 1e-6);
    }

    #[test]
    fn test_education_targets_sum_to_adult_population() {
        let orchestrator = Orchestrator::new(&RefinerConfig::default());
        let persons = population();
        let pass_a = orchestrator.pass_a(&totals(), &persons).unwrap();
        let pass_b = orchestrator.pass_b(&pass_a, &totals(), &persons).unwrap();

        let p = population_25_plus(&pass_a.age);
        let education = pass_b.table.marginal(Dimension::Education).unwrap();
        let achieved: f64 = education.values().sum();
        assert!((achieved - p).abs() / p < 1e-6);
    }

    #[test]
    fn test_run_unit_reports_full_category_spaces() {
        let orchestrator = Orchestrator::new(&RefinerConfig::default());
        let key = UnitKey::parse("NY", 2010).unwrap();
        let unit = orchestrator.run_unit(key, &totals(), &population()).unwrap();

        assert_eq!(unit.age_rows.len(), 24);
        assert_eq!(unit.education_rows.len(), 8);
        assert_eq!(unit.detail_rows.len(), 48);
        assert_eq!(unit.income_rows.len(), 2);
        assert!(unit.diagnostics.is_empty());
        assert!(
            unit.education_rows
                .iter()
                .all(|row| row.race == "WhiteNH" || row.race == "BlackNH")
        );
        assert!(unit.age_rows.iter().all(|row| row.age != "25-34"));

        let hs_or_less = EducationBucket::HsOrLess.label();
        assert!(unit.education_rows.iter().any(|row| row.education == hs_or_less));
    }

    #[test]
    fn test_missing_column_fails_the_unit() {
        let orchestrator = Orchestrator::new(&RefinerConfig::default());
        let mut totals = totals();
        totals.values.remove("POP_GD");
        let key = UnitKey::parse("NY", 2010).unwrap();
        let result = orchestrator.run_unit(key, &totals, &population());
        assert!(matches!(result, Err(RefinerError::MissingColumn { .. })));
    }
}
