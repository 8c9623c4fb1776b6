//! ACS published population extracts
//!
//! Rows of the ACS population tables, keyed by population group label, FIPS
//! and year, with free-form numeric columns.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Population group label column
pub const POP_GROUP_COLUMN: &str = "POP_GROUP";
/// Survey year column
pub const YEAR_COLUMN: &str = "YEAR";

/// One row of an ACS extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcsRow {
    /// Long population group label, e.g. "White alone, not Hispanic or Latino"
    pub pop_group: String,
    pub fips: u32,
    pub year: u16,
    /// Numeric columns by name
    pub values: BTreeMap<String, f64>,
}

/// An ACS extract with the set of numeric columns it carries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcsExtract {
    pub columns: BTreeSet<String>,
    pub rows: Vec<AcsRow>,
}

impl AcsExtract {
    #[must_use]
    pub fn new(columns: BTreeSet<String>, rows: Vec<AcsRow>) -> Self {
        Self { columns, rows }
    }

    /// Whether every listed column is present
    #[must_use]
    pub fn has_columns(&self, columns: &[&str]) -> bool {
        columns.iter().all(|c| self.columns.contains(*c))
    }

    /// Append the rows of another extract of the same table
    pub fn extend(&mut self, other: Self) {
        self.columns.extend(other.columns);
        self.rows.extend(other.rows);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One (FIPS, year) row of the wide WhiteNH/BlackNH population table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcsPopulationRow {
    pub fips: u32,
    pub year: u16,
    /// Suffixed columns (`_W` for WhiteNH, `_B` for BlackNH)
    pub values: BTreeMap<String, f64>,
}
