//! Tests for the raking solver and the two-pass orchestrator

use std::collections::BTreeMap;

use acs_refiner::algorithm::raking::{
    Axis, IpfSolver, Marginal, MarginalSet, Orchestrator, SeedMatrix,
};
use acs_refiner::config::{RefinerConfig, SolverConfig};
use acs_refiner::models::categories::{
    AgeBand, Category, CategoryValue, Dimension, RaceEthnicity, SchoolingCodes, Sex,
};
use acs_refiner::models::record::DerivedPersons;
use acs_refiner::utils::test::{synthetic_records, synthetic_totals};
use acs_refiner::{Result, UnitKey};

fn race_sex_seed(value: f64) -> Result<SeedMatrix> {
    let mut table = SeedMatrix::zeros(vec![
        Axis::of(&RaceEthnicity::RETAINED),
        Axis::all::<Sex>(),
    ])?;
    for &race in &RaceEthnicity::RETAINED {
        for &sex in Sex::all() {
            table.set(&[race.into(), sex.into()], value)?;
        }
    }
    Ok(table)
}

fn marginal<C: Category + Into<CategoryValue>>(pairs: &[(C, f64)]) -> Result<Marginal> {
    let targets: BTreeMap<CategoryValue, f64> =
        pairs.iter().map(|&(c, v)| (c.into(), v)).collect();
    Marginal::new(C::DIMENSION, targets)
}

fn race_sex_marginals() -> Result<MarginalSet> {
    MarginalSet::new()
        .with(marginal(&[
            (RaceEthnicity::WhiteNH, 30.0),
            (RaceEthnicity::BlackNH, 10.0),
        ])?)?
        .with(marginal(&[(Sex::Male, 25.0), (Sex::Female, 15.0)])?)
}

#[test]
fn test_uniform_seed_gives_independence_table() -> Result<()> {
    let solver = IpfSolver::new(SolverConfig::default());
    let raked = solver.solve(race_sex_seed(10.0)?, &race_sex_marginals()?)?;

    assert!(raked.report.converged);
    let cell = |race: RaceEthnicity, sex: Sex| raked.table.get(&[race.into(), sex.into()]);
    assert!((cell(RaceEthnicity::WhiteNH, Sex::Male)? - 18.75).abs() < 1e-9);
    assert!((cell(RaceEthnicity::WhiteNH, Sex::Female)? - 11.25).abs() < 1e-9);
    assert!((cell(RaceEthnicity::BlackNH, Sex::Male)? - 6.25).abs() < 1e-9);
    assert!((cell(RaceEthnicity::BlackNH, Sex::Female)? - 3.75).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_seed_scale_does_not_change_the_result() -> Result<()> {
    let solver = IpfSolver::new(SolverConfig::default());
    let small = solver.solve(race_sex_seed(1.0)?, &race_sex_marginals()?)?;
    let large = solver.solve(race_sex_seed(1_000.0)?, &race_sex_marginals()?)?;

    for (a, b) in small.table.values().iter().zip(large.table.values()) {
        assert!((a - b).abs() < 1e-9);
    }
    Ok(())
}

#[test]
fn test_zero_cells_stay_zero() -> Result<()> {
    let mut seed = race_sex_seed(10.0)?;
    seed.set(&[RaceEthnicity::BlackNH.into(), Sex::Female.into()], 0.0)?;

    let raked = IpfSolver::new(SolverConfig::default()).solve(seed, &race_sex_marginals()?)?;
    assert_eq!(
        raked
            .table
            .get(&[RaceEthnicity::BlackNH.into(), Sex::Female.into()])?,
        0.0
    );
    assert!(raked.report.converged);
    let race = raked.table.marginal(Dimension::RaceEthnicity).unwrap_or_default();
    assert!((race[&CategoryValue::from(RaceEthnicity::BlackNH)] - 10.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_synthetic_unit_rakes_without_diagnostics() -> Result<()> {
    let codes = SchoolingCodes::From2008;
    let derived = DerivedPersons::from_records(&synthetic_records(11, 2_000, codes), codes);
    let totals = synthetic_totals("NY", 36, 19_000_000.0);
    let orchestrator = Orchestrator::new(&RefinerConfig::default());

    let pass_a = orchestrator.pass_a(&totals, &derived.persons)?;
    assert!(pass_a.converged.report.converged);

    // Pass A matches every published age band on the full table
    let ages = pass_a
        .converged
        .table
        .marginal(Dimension::AgeBand)
        .unwrap_or_default();
    for &band in AgeBand::all() {
        let target = totals.value(band.column().unwrap_or_default())?;
        assert!((ages[&CategoryValue::from(band)] - target).abs() / target < 1e-6);
    }

    let unit = orchestrator.run_unit(
        UnitKey::parse("NY", 2010)?,
        &totals,
        &derived.persons,
    )?;
    assert!(unit.diagnostics.is_empty());
    assert_eq!(unit.age_rows.len(), 24);
    assert_eq!(unit.education_rows.len(), 8);
    assert_eq!(unit.detail_rows.len(), 48);

    // Age and detail cross-tabs describe the same adult population
    let age_total: f64 = unit.age_rows.iter().map(|r| r.total).sum();
    let detail_total: f64 = unit.detail_rows.iter().map(|r| r.total).sum();
    let education_total: f64 = unit.education_rows.iter().map(|r| r.total).sum();
    assert!(age_total > 0.0);
    assert!((detail_total - education_total).abs() / education_total < 1e-9);
    Ok(())
}
