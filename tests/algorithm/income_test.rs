//! Tests for weighted income summaries

use acs_refiner::algorithm::income::{IncomeRefiner, weighted_median_mean};
use acs_refiner::models::categories::{AgeBand, Education, RaceEthnicity, Sex};
use acs_refiner::models::record::Person;
use acs_refiner::models::unit::SurveyYear;

fn person(race: RaceEthnicity, age_band: AgeBand, income: Option<f64>, weight: f64) -> Person {
    Person {
        weight,
        age_band,
        race,
        sex: Sex::Female,
        education: Some(Education::Bachelors),
        income,
    }
}

#[test]
fn test_median_is_first_income_reaching_half_the_weight() {
    let mut values = vec![(50.0, 2.0), (10.0, 1.0), (30.0, 1.0)];
    let summary = weighted_median_mean(&mut values).unwrap();
    // Cumulative weights 1, 2, 4 against a half of 2
    assert_eq!(summary.median, 30.0);
    assert_eq!(summary.mean, (10.0 + 30.0 + 100.0) / 4.0);
    assert!(weighted_median_mean(&mut []).is_none());
}

#[test]
fn test_only_retained_adults_with_income_count() {
    let persons = vec![
        person(RaceEthnicity::WhiteNH, AgeBand::Age45To54, Some(40_000.0), 10.0),
        person(RaceEthnicity::WhiteNH, AgeBand::Age65To74, Some(20_000.0), 30.0),
        person(RaceEthnicity::WhiteNH, AgeBand::Age25To34, Some(1_000_000.0), 100.0),
        person(RaceEthnicity::WhiteNH, AgeBand::Age35To44, None, 100.0),
        person(RaceEthnicity::Hispanic, AgeBand::Age45To54, Some(55_000.0), 10.0),
        person(RaceEthnicity::BlackNH, AgeBand::Age85Plus, Some(15_000.0), 5.0),
    ];

    let rows = IncomeRefiner::summarise(36, SurveyYear::new(2012).unwrap(), &persons);
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].race, "WhiteNH");
    assert_eq!(rows[0].fips, 36);
    assert_eq!(rows[0].year, 2012);
    assert_eq!(rows[0].median, 20_000.0);
    assert_eq!(rows[0].mean, (40_000.0 * 10.0 + 20_000.0 * 30.0) / 40.0);

    assert_eq!(rows[1].race, "BlackNH");
    assert_eq!(rows[1].median, 15_000.0);
}

#[test]
fn test_group_without_weight_is_skipped() {
    let persons = vec![
        person(RaceEthnicity::WhiteNH, AgeBand::Age45To54, Some(40_000.0), 0.0),
        person(RaceEthnicity::BlackNH, AgeBand::Age45To54, Some(30_000.0), 2.0),
    ];
    let rows = IncomeRefiner::summarise(6, SurveyYear::new(2010).unwrap(), &persons);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].race, "BlackNH");
}
