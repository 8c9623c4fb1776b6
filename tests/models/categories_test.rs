//! Tests for category derivation from PUMS codes

use acs_refiner::models::categories::{
    AgeBand, Category, CategoryValue, Dimension, Education, EducationBucket, RaceEthnicity,
    ReportingAgeBand, SchoolingCodes, Sex,
};
use acs_refiner::models::unit::SurveyYear;

#[test]
fn test_age_band_boundaries() {
    assert_eq!(AgeBand::from_age(0.0).unwrap(), AgeBand::Under5);
    assert_eq!(AgeBand::from_age(4.0).unwrap(), AgeBand::Under5);
    assert_eq!(AgeBand::from_age(5.0).unwrap(), AgeBand::Age5To9);
    assert_eq!(AgeBand::from_age(34.0).unwrap(), AgeBand::Age25To34);
    assert_eq!(AgeBand::from_age(35.0).unwrap(), AgeBand::Age35To44);
    assert_eq!(AgeBand::from_age(99.0).unwrap(), AgeBand::Age85Plus);
    assert!(AgeBand::from_age(-1.0).is_err());
    assert!(AgeBand::from_age(f64::NAN).is_err());

    assert!(!AgeBand::Age25To34.is_adult());
    assert!(AgeBand::Age35To44.is_adult());
    assert_eq!(AgeBand::ADULT.len(), 7);
}

#[test]
fn test_reporting_bands_merge_55_to_64() {
    assert_eq!(
        AgeBand::Age55To59.reporting(),
        Some(ReportingAgeBand::Age55To64)
    );
    assert_eq!(
        AgeBand::Age60To64.reporting(),
        Some(ReportingAgeBand::Age55To64)
    );
    assert_eq!(AgeBand::Age25To34.reporting(), None);
    assert_eq!(ReportingAgeBand::all().len(), 6);
}

#[test]
fn test_race_and_sex_codes() {
    assert_eq!(RaceEthnicity::from_codes(1.0, 1.0).unwrap(), RaceEthnicity::WhiteNH);
    assert_eq!(RaceEthnicity::from_codes(2.0, 1.0).unwrap(), RaceEthnicity::BlackNH);
    assert_eq!(RaceEthnicity::from_codes(5.0, 1.0).unwrap(), RaceEthnicity::OtherNH);
    assert_eq!(RaceEthnicity::from_codes(1.0, 3.0).unwrap(), RaceEthnicity::Hispanic);
    assert!(RaceEthnicity::from_codes(1.0, f64::NAN).is_err());

    assert_eq!(Sex::from_code(1.0).unwrap(), Sex::Male);
    assert_eq!(Sex::from_code(2.0).unwrap(), Sex::Female);
    assert!(Sex::from_code(3.0).is_err());
}

#[test]
fn test_schooling_codes_change_in_2008() {
    let early = SurveyYear::new(2007).unwrap().schooling_codes();
    let late = SurveyYear::new(2008).unwrap().schooling_codes();
    assert_eq!(early, SchoolingCodes::Pre2008);
    assert_eq!(late, SchoolingCodes::From2008);

    assert_eq!(
        Education::from_schooling_code(9.0, early).unwrap(),
        Education::HighSchool
    );
    assert_eq!(
        Education::from_schooling_code(9.0, late).unwrap(),
        Education::LessThan9thGrade
    );
    assert_eq!(
        Education::from_schooling_code(24.0, late).unwrap(),
        Education::Graduate
    );
    assert!(Education::from_schooling_code(17.0, early).is_err());

    assert_eq!(Education::HighSchool.bucket(), EducationBucket::HsOrLess);
    assert_eq!(Education::SomeCollege.bucket(), EducationBucket::SomeCollegeOrMore);
}

#[test]
fn test_category_values_carry_their_dimension() {
    let value = CategoryValue::from(Education::Bachelors);
    assert_eq!(value.dimension(), Dimension::Education);
    assert_eq!(value.column(), Some("POP_BD"));
    assert_eq!(CategoryValue::all_of(Dimension::AgeBand).len(), 13);
    assert_eq!(Dimension::Sex.column_name(), "SEX_");
    assert_eq!(Sex::Female.label(), "Female");
}
