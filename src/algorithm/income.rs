//! Weighted income statistics by race/ethnicity

use std::collections::BTreeMap;

use crate::models::categories::{Category, RaceEthnicity};
use crate::models::output::IncomeRow;
use crate::models::record::Person;
use crate::models::unit::SurveyYear;

/// Weighted median and mean of one group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedIncome {
    pub median: f64,
    pub mean: f64,
}

/// Weighted median and mean of `(income, weight)` pairs.
///
/// The pairs are stably sorted by income. The median is the first income at
/// which the cumulative weight reaches half of the total weight. Returns
/// `None` when the total weight is not positive.
pub fn weighted_median_mean(values: &mut [(f64, f64)]) -> Option<WeightedIncome> {
    let total: f64 = values.iter().map(|(_, weight)| weight).sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }

    values.sort_by(|a, b| a.0.total_cmp(&b.0));

    let half = total / 2.0;
    let mut cumulative = 0.0;
    let mut median = values.last()?.0;
    for &(income, weight) in values.iter() {
        cumulative += weight;
        if cumulative >= half {
            median = income;
            break;
        }
    }

    let weighted_sum: f64 = values.iter().map(|(income, weight)| income * weight).sum();
    Some(WeightedIncome {
        median,
        mean: weighted_sum / total,
    })
}

/// Summarises personal income of the retained adult population
pub struct IncomeRefiner;

impl IncomeRefiner {
    /// One row per retained race with income data, in race order.
    ///
    /// Only adults (35 and over) with a reported income take part; each person
    /// counts with its sampling weight.
    #[must_use]
    pub fn summarise(fips: u32, year: SurveyYear, persons: &[Person]) -> Vec<IncomeRow> {
        let mut groups: BTreeMap<RaceEthnicity, Vec<(f64, f64)>> = BTreeMap::new();
        for person in persons.iter().filter(|p| p.is_retained_adult()) {
            if let Some(income) = person.income {
                groups
                    .entry(person.race)
                    .or_default()
                    .push((income, person.weight));
            }
        }

        RaceEthnicity::RETAINED
            .iter()
            .filter_map(|race| {
                let values = groups.get_mut(race)?;
                match weighted_median_mean(values) {
                    Some(summary) => Some(IncomeRow {
                        fips,
                        year: year.get(),
                        race: race.label().to_string(),
                        median: summary.median,
                        mean: summary.mean,
                    }),
                    None => {
                        log::warn!(
                            "Skipping income of {} in FIPS {fips}, {year}: zero total weight",
                            race.label()
                        );
                        None
                    }
                }
            })
            .collect()
    }
}
