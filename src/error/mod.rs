//! Error handling for the refiner.
//!
//! Column and year problems abort only the (state, year) unit they belong to.
//! Numerical conditions met while raking (unsatisfiable constraints, sweep cap
//! reached) are not errors; they travel with the result as
//! [`RakingDiagnostic`](crate::algorithm::raking::RakingDiagnostic) values.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

pub mod util;

/// Errors produced while importing, raking or exporting survey data
#[derive(Debug, thiserror::Error)]
pub enum RefinerError {
    /// A required input or marginal column is absent
    #[error("Missing column '{column}' in {source_name}")]
    MissingColumn {
        /// Name of the absent column
        column: String,
        /// What was being read when the column was found missing
        source_name: String,
    },

    /// A PUMS unit has no marginal file for its year
    #[error("No marginal totals for year {year} (unit {unit})")]
    YearMismatch {
        /// Survey year of the PUMS unit
        year: u16,
        /// Display form of the unit key
        unit: String,
    },

    /// A marginal file for the year exists but has no row for the state
    #[error("No marginal row for state {state} in year {year}")]
    MissingMarginal {
        /// Two-letter state code
        state: String,
        /// Survey year
        year: u16,
    },

    /// A raw code could not be mapped onto a category
    #[error("Invalid {field} code {value}")]
    InvalidCode {
        /// Raw field name (e.g. `SEX`)
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// A published total is negative, non-finite or otherwise unusable
    #[error("Invalid marginal '{column}': {reason}")]
    InvalidMarginal {
        /// Column or dimension the value came from
        column: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A target names a category the seed table does not carry
    #[error("Category '{category}' is not an axis category of dimension {dimension}")]
    UnknownCategory {
        /// Dimension name
        dimension: String,
        /// Category label
        category: String,
    },

    /// A (state, year) key failed validation
    #[error("Invalid unit key: {0}")]
    InvalidKey(String),

    /// Configuration or manifest problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Row conversion error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RefinerError {
    /// Shorthand for [`RefinerError::MissingColumn`]
    pub fn missing_column(column: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            source_name: source_name.into(),
        }
    }

    /// Whether the error only concerns one (state, year) unit
    #[must_use]
    pub fn is_unit_scoped(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. }
                | Self::YearMismatch { .. }
                | Self::MissingMarginal { .. }
                | Self::InvalidMarginal { .. }
                | Self::UnknownCategory { .. }
        )
    }
}

impl From<serde_arrow::Error> for RefinerError {
    fn from(error: serde_arrow::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Result type for refiner operations
pub type Result<T> = std::result::Result<T, RefinerError>;
