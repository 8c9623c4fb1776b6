//! Published marginal totals
//!
//! One [`PublishedTotals`] row per (state, year), holding the named numeric
//! columns of the external population tables. [`MarginalTable`] indexes the
//! rows by year and state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RefinerError, Result};
use crate::models::unit::{StateCode, SurveyYear, UnitKey};

/// Geography (state code) column of the marginal files
pub const GEOGRAPHY_COLUMN: &str = "GEO2";
/// FIPS column of the marginal files
pub const FIPS_COLUMN: &str = "ID2";

/// Published totals for one state and year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedTotals {
    /// State the row describes
    pub state: StateCode,
    /// Numeric FIPS code used as join key in the output
    pub fips: u32,
    /// Named numeric columns
    pub values: BTreeMap<String, f64>,
}

impl PublishedTotals {
    #[must_use]
    pub fn new(state: StateCode, fips: u32) -> Self {
        Self {
            state,
            fips,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter, mostly for tests and fixtures
    #[must_use]
    pub fn with_value(mut self, column: impl Into<String>, value: f64) -> Self {
        self.values.insert(column.into(), value);
        self
    }

    /// Value of a named column
    pub fn value(&self, column: &str) -> Result<f64> {
        self.values.get(column).copied().ok_or_else(|| {
            RefinerError::missing_column(column, format!("marginal row for {}", self.state))
        })
    }
}

/// Published totals indexed by year, then state
#[derive(Debug, Clone, Default)]
pub struct MarginalTable {
    years: BTreeMap<SurveyYear, BTreeMap<StateCode, PublishedTotals>>,
}

impl MarginalTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the row of a state in a year
    pub fn insert(&mut self, year: SurveyYear, totals: PublishedTotals) {
        if let Some(previous) = self
            .years
            .entry(year)
            .or_default()
            .insert(totals.state, totals)
        {
            log::warn!(
                "Duplicate marginal row for {} in {year}; keeping the last one",
                previous.state
            );
        }
    }

    /// Add every row of one year's marginal file
    pub fn extend_year(&mut self, year: SurveyYear, rows: impl IntoIterator<Item = PublishedTotals>) {
        for row in rows {
            self.insert(year, row);
        }
    }

    /// Row for a unit, distinguishing an unknown year from an unknown state
    pub fn lookup(&self, key: &UnitKey) -> Result<&PublishedTotals> {
        let states = self.years.get(&key.year).ok_or_else(|| RefinerError::YearMismatch {
            year: key.year.get(),
            unit: key.to_string(),
        })?;
        states
            .get(&key.state)
            .ok_or_else(|| RefinerError::MissingMarginal {
                state: key.state.to_string(),
                year: key.year.get(),
            })
    }

    /// Years with at least one row
    pub fn years(&self) -> impl Iterator<Item = SurveyYear> + '_ {
        self.years.keys().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Number of rows over all years
    #[must_use]
    pub fn len(&self) -> usize {
        self.years.values().map(BTreeMap::len).sum()
    }
}
