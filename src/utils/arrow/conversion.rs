//! Conversion of Arrow record batches into typed input rows
//!
//! PUMS person batches become [`RawRecord`]s, marginal batches become
//! [`PublishedTotals`], ACS batches become an [`AcsExtract`]. Numeric columns
//! may use any Arrow numeric type.

use std::collections::{BTreeMap, BTreeSet};

use arrow::record_batch::RecordBatch;

use crate::error::util::require_columns;
use crate::error::{RefinerError, Result};
use crate::models::acs::{AcsExtract, AcsRow, POP_GROUP_COLUMN, YEAR_COLUMN};
use crate::models::record::{
    AGE_COLUMN, HISPANIC_COLUMN, INCOME_COLUMN, RACE_COLUMN, RawRecord, SCHOOLING_COLUMN,
    SEX_COLUMN, WEIGHT_COLUMN,
};
use crate::models::totals::{FIPS_COLUMN, GEOGRAPHY_COLUMN, PublishedTotals};
use crate::models::unit::StateCode;
use crate::utils::arrow::extractors::{extract_float64, extract_string, extract_uint32};
use crate::utils::logging::log_warning;

/// Required numeric column; nulls become NaN so the record is rejected later
fn required_numbers(batch: &RecordBatch, column: &str, source_name: &str) -> Result<Vec<f64>> {
    Ok(extract_float64(batch, column, true, source_name)?
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Optional numeric column; an absent column is all nulls
fn optional_numbers(
    batch: &RecordBatch,
    column: &str,
    source_name: &str,
) -> Result<Vec<Option<f64>>> {
    Ok(extract_float64(batch, column, false, source_name)?
        .unwrap_or_else(|| vec![None; batch.num_rows()]))
}

/// Numeric columns of a batch other than `exclude`
fn numeric_columns(batch: &RecordBatch, exclude: &[&str]) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .filter(|field| field.data_type().is_numeric())
        .map(|field| field.name().clone())
        .filter(|name| !exclude.contains(&name.as_str()))
        .collect()
}

/// Convert a PUMS person batch to raw records
///
/// `SCHL` and `PINCP` may be absent; every other person column is required.
pub fn records_from_batch(batch: &RecordBatch, source_name: &str) -> Result<Vec<RawRecord>> {
    require_columns(
        batch,
        &[WEIGHT_COLUMN, AGE_COLUMN, SEX_COLUMN, RACE_COLUMN, HISPANIC_COLUMN],
        source_name,
    )?;
    let weight = required_numbers(batch, WEIGHT_COLUMN, source_name)?;
    let age = required_numbers(batch, AGE_COLUMN, source_name)?;
    let sex = required_numbers(batch, SEX_COLUMN, source_name)?;
    let race = required_numbers(batch, RACE_COLUMN, source_name)?;
    let hispanic = required_numbers(batch, HISPANIC_COLUMN, source_name)?;
    let schooling = optional_numbers(batch, SCHOOLING_COLUMN, source_name)?;
    let income = optional_numbers(batch, INCOME_COLUMN, source_name)?;

    Ok((0..batch.num_rows())
        .map(|i| RawRecord {
            weight: weight[i],
            age: age[i],
            sex: sex[i],
            race: race[i],
            hispanic: hispanic[i],
            schooling: schooling[i],
            income: income[i],
        })
        .collect())
}

/// Convert a marginal batch to one published row per state
///
/// Rows without a valid state code or FIPS are skipped with a warning.
/// Null numeric cells are kept as NaN and rejected when used as a target.
pub fn totals_from_batch(batch: &RecordBatch, source_name: &str) -> Result<Vec<PublishedTotals>> {
    let states = extract_string(batch, GEOGRAPHY_COLUMN, source_name)?;
    let fips = extract_uint32(batch, FIPS_COLUMN, source_name)?;

    let value_columns = numeric_columns(batch, &[FIPS_COLUMN, GEOGRAPHY_COLUMN]);
    let values = value_columns
        .iter()
        .map(|column| required_numbers(batch, column, source_name))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let state = states[i].as_deref().map(StateCode::new);
        let (Some(Ok(state)), Some(fips)) = (state, fips[i]) else {
            log_warning(
                &format!("Skipping marginal row {i} of {source_name}: invalid {GEOGRAPHY_COLUMN} or {FIPS_COLUMN}"),
                None,
            );
            continue;
        };

        let mut totals = PublishedTotals::new(state, fips);
        for (column, column_values) in value_columns.iter().zip(&values) {
            totals.values.insert(column.clone(), column_values[i]);
        }
        rows.push(totals);
    }
    Ok(rows)
}

/// Convert an ACS population batch to an extract
pub fn acs_from_batch(batch: &RecordBatch, source_name: &str) -> Result<AcsExtract> {
    let groups = extract_string(batch, POP_GROUP_COLUMN, source_name)?;
    let fips = extract_uint32(batch, FIPS_COLUMN, source_name)?;
    let years = extract_uint32(batch, YEAR_COLUMN, source_name)?;

    let value_columns = numeric_columns(batch, &[FIPS_COLUMN, YEAR_COLUMN]);
    let values = value_columns
        .iter()
        .map(|column| {
            Ok(extract_float64(batch, column, true, source_name)?.unwrap_or_default())
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let (Some(pop_group), Some(fips), Some(year)) = (groups[i].clone(), fips[i], years[i])
        else {
            log_warning(
                &format!("Skipping ACS row {i} of {source_name}: missing key column"),
                None,
            );
            continue;
        };
        let year = u16::try_from(year).map_err(|_| {
            RefinerError::InvalidKey(format!("year {year} in {source_name} is out of range"))
        })?;

        let mut row_values = BTreeMap::new();
        for (column, column_values) in value_columns.iter().zip(&values) {
            if let Some(value) = column_values[i] {
                row_values.insert(column.clone(), value);
            }
        }
        rows.push(AcsRow {
            pop_group,
            fips,
            year,
            values: row_values,
        });
    }

    let columns: BTreeSet<String> = value_columns.into_iter().collect();
    Ok(AcsExtract::new(columns, rows))
}
