//! Absolute population counts from ACS sex percentages
//!
//! The ACS tables publish a total per age group and the male and female
//! shares of it as percentages. This module turns the shares into counts and
//! pivots the WhiteNH and BlackNH rows into one wide row per (FIPS, year).

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt16Array, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{RefinerError, Result};
use crate::models::acs::{AcsExtract, AcsPopulationRow, AcsRow, YEAR_COLUMN};
use crate::models::categories::{Category, RaceEthnicity};
use crate::models::totals::FIPS_COLUMN;

/// An age group: its total column and the male/female percentage columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeGroup {
    pub name: &'static str,
    pub total: &'static str,
    pub male: &'static str,
    pub female: &'static str,
}

impl AgeGroup {
    #[must_use]
    pub const fn columns(&self) -> [&'static str; 3] {
        [self.total, self.male, self.female]
    }
}

/// Age groups of the ACS sex-by-age tables
pub const AGE_GROUPS: [AgeGroup; 4] = [
    AgeGroup {
        name: "G1",
        total: "POP_18_OVER",
        male: "POP_18_M",
        female: "POP_18_F",
    },
    AgeGroup {
        name: "G2",
        total: "POP_18_34",
        male: "POP_18_34_M",
        female: "POP_18_34_F",
    },
    AgeGroup {
        name: "G3",
        total: "POP_35_64",
        male: "POP_35_64_M",
        female: "POP_35_64_F",
    },
    AgeGroup {
        name: "G4",
        total: "POP_65_OVER",
        male: "POP_65_M",
        female: "POP_65_F",
    },
];

/// Rename columns of an extract; names absent from the extract are ignored
pub fn rename_columns(extract: &mut AcsExtract, renames: &BTreeMap<String, String>) {
    for (from, to) in renames {
        if !extract.columns.remove(from) {
            continue;
        }
        extract.columns.insert(to.clone());
        for row in &mut extract.rows {
            if let Some(value) = row.values.remove(from) {
                row.values.insert(to.clone(), value);
            }
        }
    }
}

/// Count of a percentage share of a total, rounded half to even
fn share_count(total: f64, percent: f64) -> f64 {
    (total * (percent / 100.0)).round_ties_even()
}

/// Replace male/female percentages by counts for every complete age group.
///
/// Returns the groups that were converted; an extract without any complete
/// group is rejected.
pub fn apply_sex_counts(extract: &mut AcsExtract) -> Result<Vec<&'static str>> {
    let groups: Vec<AgeGroup> = AGE_GROUPS
        .iter()
        .filter(|group| extract.has_columns(&group.columns()))
        .copied()
        .collect();

    if groups.is_empty() {
        let expected = AGE_GROUPS
            .iter()
            .map(|group| group.total)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(RefinerError::missing_column(
            expected,
            "ACS extract (no complete age group)",
        ));
    }

    for row in &mut extract.rows {
        for group in &groups {
            let Some(&total) = row.values.get(group.total) else {
                continue;
            };
            for column in [group.male, group.female] {
                if let Some(percent) = row.values.get_mut(column) {
                    *percent = share_count(total, *percent);
                }
            }
        }
    }

    extract
        .rows
        .sort_by(|a, b| (&a.pop_group, a.fips, a.year).cmp(&(&b.pop_group, b.fips, b.year)));

    Ok(groups.iter().map(|group| group.name).collect())
}

/// Outer-join the WhiteNH and BlackNH rows on (year, FIPS).
///
/// Columns get a `_W` or `_B` suffix; values missing on either side are 0.
/// Rows of other population groups are dropped.
#[must_use]
pub fn pivot_population_groups(extract: &AcsExtract) -> Vec<AcsPopulationRow> {
    let suffixes = [(RaceEthnicity::WhiteNH, "_W"), (RaceEthnicity::BlackNH, "_B")];

    let mut joined: BTreeMap<(u16, u32), BTreeMap<String, f64>> = BTreeMap::new();
    for row in &extract.rows {
        let Some(race) = RaceEthnicity::from_acs_group(&row.pop_group) else {
            continue;
        };
        let Some((_, suffix)) = suffixes.iter().find(|(r, _)| *r == race) else {
            continue;
        };
        let wide = joined.entry((row.year, row.fips)).or_default();
        for (column, value) in &row.values {
            wide.insert(format!("{column}{suffix}"), *value);
        }
    }

    let present: Vec<&str> = suffixes
        .iter()
        .filter(|(race, _)| {
            extract
                .rows
                .iter()
                .any(|row| row.pop_group == race.acs_group().unwrap_or_default())
        })
        .map(|(_, suffix)| *suffix)
        .collect();
    for (race, _) in suffixes.iter().filter(|(_, s)| !present.contains(s)) {
        log::warn!("ACS extract has no {} rows", race.label());
    }

    joined
        .into_iter()
        .map(|((year, fips), mut values)| {
            for column in &extract.columns {
                for suffix in &present {
                    values.entry(format!("{column}{suffix}")).or_insert(0.0);
                }
            }
            AcsPopulationRow { fips, year, values }
        })
        .collect()
}

/// The wide WhiteNH/BlackNH population table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcsPopulationTable {
    /// Value columns, sorted
    pub columns: Vec<String>,
    pub rows: Vec<AcsPopulationRow>,
}

impl AcsPopulationTable {
    /// Convert, rename, count and pivot an extract
    pub fn build(mut extract: AcsExtract, renames: &BTreeMap<String, String>) -> Result<Self> {
        rename_columns(&mut extract, renames);
        let groups = apply_sex_counts(&mut extract)?;
        log::info!("ACS sex counts computed for age groups {}", groups.join(", "));

        let rows = pivot_population_groups(&extract);
        let mut columns: Vec<String> = rows
            .iter()
            .flat_map(|row| row.values.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        Ok(Self { columns, rows })
    }

    /// Arrow batch with `YEAR`, `ID2` and one Float64 column per value column
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = vec![
            Field::new(YEAR_COLUMN, DataType::UInt16, false),
            Field::new(FIPS_COLUMN, DataType::UInt32, false),
        ];
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(UInt16Array::from_iter_values(self.rows.iter().map(|r| r.year))),
            Arc::new(UInt32Array::from_iter_values(self.rows.iter().map(|r| r.fips))),
        ];
        for column in &self.columns {
            fields.push(Field::new(column, DataType::Float64, false));
            arrays.push(Arc::new(Float64Array::from_iter_values(
                self.rows
                    .iter()
                    .map(|r| r.values.get(column).copied().unwrap_or(0.0)),
            )));
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

/// Rows of one group, mostly for tests and fixtures
#[must_use]
pub fn acs_row(race: RaceEthnicity, fips: u32, year: u16, values: &[(&str, f64)]) -> AcsRow {
    AcsRow {
        pop_group: race.acs_group().unwrap_or(race.label()).to_string(),
        fips,
        year,
        values: values
            .iter()
            .map(|(column, value)| ((*column).to_string(), *value))
            .collect(),
    }
}
