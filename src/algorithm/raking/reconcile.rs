//! Zero-filling of reported strata
//!
//! Collapsed tables only hold the combinations that occurred. The reported
//! tables list every combination of their category space, inserting the
//! missing ones with a total of zero.

use std::collections::BTreeMap;

use itertools::iproduct;

use crate::models::categories::{
    Category, EducationBucket, RaceEthnicity, ReportingAgeBand, Sex,
};

/// Race x sex x reporting age band
pub type AgeKey = (RaceEthnicity, Sex, ReportingAgeBand);
/// Race x sex x education bucket
pub type EducationKey = (RaceEthnicity, Sex, EducationBucket);
/// Race x sex x reporting age band x education bucket
pub type DetailKey = (RaceEthnicity, Sex, ReportingAgeBand, EducationBucket);

/// Every combination of the age cross-tab, in output order
#[must_use]
pub fn age_space() -> Vec<AgeKey> {
    iproduct!(RaceEthnicity::RETAINED, Sex::all(), ReportingAgeBand::all())
        .map(|(race, &sex, &age)| (race, sex, age))
        .collect()
}

/// Every combination of the education cross-tab, in output order
#[must_use]
pub fn education_space() -> Vec<EducationKey> {
    iproduct!(RaceEthnicity::RETAINED, Sex::all(), EducationBucket::all())
        .map(|(race, &sex, &education)| (race, sex, education))
        .collect()
}

/// Every combination of the detail cross-tab, in output order
#[must_use]
pub fn detail_space() -> Vec<DetailKey> {
    iproduct!(
        RaceEthnicity::RETAINED,
        Sex::all(),
        ReportingAgeBand::all(),
        EducationBucket::all()
    )
    .map(|(race, &sex, &age, &education)| (race, sex, age, education))
    .collect()
}

/// Pair each key of `space` with its sum, zero when absent.
///
/// Sums outside `space` are dropped with a warning.
pub fn reconcile<K>(space: &[K], sums: &BTreeMap<K, f64>) -> Vec<(K, f64)>
where
    K: Ord + Copy + std::fmt::Debug,
{
    let filled = space.iter().filter(|key| !sums.contains_key(key)).count();
    if filled > 0 {
        log::debug!("Reconciliation inserted {filled} empty strata");
    }
    for key in sums.keys().filter(|key| !space.contains(key)) {
        log::warn!("Dropping stratum {key:?} outside the reported categories");
    }

    space
        .iter()
        .map(|key| (*key, sums.get(key).copied().unwrap_or(0.0)))
        .collect()
}
