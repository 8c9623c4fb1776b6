//! Tests for the unit pipeline

use acs_refiner::algorithm::pipeline::{Pipeline, PumsUnit};
use acs_refiner::config::RefinerConfig;
use acs_refiner::models::categories::{Category, RaceEthnicity};
use acs_refiner::utils::test::{marginal_table, synthetic_unit};
use acs_refiner::{Result, UnitKey};

fn config(parallel: bool) -> RefinerConfig {
    RefinerConfig {
        parallel,
        threads: Some(3),
        show_progress: false,
        ..RefinerConfig::default()
    }
}

fn units() -> Vec<PumsUnit> {
    vec![
        synthetic_unit("TX", 2010, 3, 800),
        synthetic_unit("NY", 2010, 1, 800),
        synthetic_unit("CA", 2010, 2, 800),
    ]
}

#[test]
fn test_parallel_run_equals_sequential_run() -> Result<()> {
    let marginals = marginal_table(2010, &[("NY", 36), ("CA", 6), ("TX", 48)]);

    let sequential = Pipeline::new(config(false))?.run(units(), &marginals)?;
    let parallel = Pipeline::new(config(true))?.run(units(), &marginals)?;

    assert_eq!(sequential.units_completed, 3);
    assert_eq!(sequential, parallel);
    Ok(())
}

#[test]
fn test_rows_are_ordered_by_unit_and_complete() -> Result<()> {
    let marginals = marginal_table(2010, &[("NY", 36), ("CA", 6), ("TX", 48)]);
    let output = Pipeline::new(config(true))?.run(units(), &marginals)?;

    assert_eq!(output.age_rows.len(), 3 * 24);
    assert_eq!(output.education_rows.len(), 3 * 8);
    assert_eq!(output.detail_rows.len(), 3 * 48);
    assert_eq!(output.income_rows.len(), 3 * 2);

    // Units are merged in key order: CA, NY, TX
    let fips: Vec<u32> = output.income_rows.iter().map(|r| r.fips).collect();
    assert_eq!(fips, vec![6, 6, 36, 36, 48, 48]);
    Ok(())
}

#[test]
fn test_dropped_race_groups_never_reach_the_output() -> Result<()> {
    let marginals = marginal_table(2010, &[("NY", 36)]);
    let output =
        Pipeline::new(config(false))?.run(vec![synthetic_unit("NY", 2010, 9, 500)], &marginals)?;

    let dropped = [
        RaceEthnicity::OtherNH.label(),
        RaceEthnicity::Hispanic.label(),
    ];
    assert!(output.age_rows.iter().all(|r| !dropped.contains(&r.race.as_str())));
    assert!(output.education_rows.iter().all(|r| !dropped.contains(&r.race.as_str())));
    assert!(output.detail_rows.iter().all(|r| !dropped.contains(&r.race.as_str())));
    assert!(output.income_rows.iter().all(|r| !dropped.contains(&r.race.as_str())));
    assert!(output.detail_rows.iter().all(|r| r.total.is_finite() && r.total >= 0.0));
    Ok(())
}

#[test]
fn test_unit_without_marginals_is_skipped_and_recorded() -> Result<()> {
    let marginals = marginal_table(2010, &[("NY", 36)]);
    let units = vec![
        synthetic_unit("NY", 2010, 1, 200),
        synthetic_unit("NY", 2011, 1, 200),
        synthetic_unit("TX", 2010, 1, 200),
    ];

    let output = Pipeline::new(config(true))?.run(units, &marginals)?;
    assert_eq!(output.units_completed, 1);
    assert_eq!(output.failures.len(), 2);

    let failed: Vec<UnitKey> = output.failures.iter().map(|f| f.unit).collect();
    assert_eq!(
        failed,
        vec![UnitKey::parse("TX", 2010)?, UnitKey::parse("NY", 2011)?]
    );
    assert!(output.age_rows.iter().all(|r| r.fips == 36));
    Ok(())
}

#[test]
fn test_rejected_records_are_counted() -> Result<()> {
    let marginals = marginal_table(2010, &[("NY", 36)]);
    let mut unit = synthetic_unit("NY", 2010, 4, 100);
    unit.records[0].sex = 9.0;
    unit.records[1].weight = 0.0;

    let output = Pipeline::new(config(false))?.run(vec![unit], &marginals)?;
    assert_eq!(output.units_completed, 1);
    assert_eq!(output.records_rejected, 2);
    Ok(())
}
