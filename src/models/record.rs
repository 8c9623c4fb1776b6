//! PUMS person records
//!
//! [`RawRecord`] holds the coded fields as delivered; [`Person`] carries the
//! derived category labels, computed once and never modified.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RefinerError, Result};
use crate::models::categories::{
    AgeBand, CategoryValue, Dimension, Education, RaceEthnicity, SchoolingCodes, Sex,
};

/// Sampling weight column
pub const WEIGHT_COLUMN: &str = "PWGTP";
/// Age column
pub const AGE_COLUMN: &str = "AGEP";
/// Sex code column
pub const SEX_COLUMN: &str = "SEX";
/// Race code column
pub const RACE_COLUMN: &str = "RAC1P";
/// Hispanic-origin code column
pub const HISPANIC_COLUMN: &str = "HISP";
/// Schooling code column
pub const SCHOOLING_COLUMN: &str = "SCHL";
/// Personal income column
pub const INCOME_COLUMN: &str = "PINCP";

/// Columns read from every PUMS person file
pub const PUMS_COLUMNS: [&str; 7] = [
    WEIGHT_COLUMN,
    AGE_COLUMN,
    SEX_COLUMN,
    RACE_COLUMN,
    HISPANIC_COLUMN,
    SCHOOLING_COLUMN,
    INCOME_COLUMN,
];

/// One surveyed individual as coded in the PUMS file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Person sampling weight
    pub weight: f64,
    /// Age in years
    pub age: f64,
    /// Sex code
    pub sex: f64,
    /// Race code
    pub race: f64,
    /// Hispanic-origin code (1 = not Hispanic)
    pub hispanic: f64,
    /// Schooling code, absent for young children
    pub schooling: Option<f64>,
    /// Personal income, absent for young children
    pub income: Option<f64>,
}

/// A record with its derived strata
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Person {
    pub weight: f64,
    pub age_band: AgeBand,
    pub race: RaceEthnicity,
    pub sex: Sex,
    pub education: Option<Education>,
    pub income: Option<f64>,
}

impl Person {
    /// Derive every category of a raw record.
    ///
    /// Weights must be positive and finite. A missing schooling code yields
    /// no education; an unmapped one is an error.
    pub fn derive(raw: &RawRecord, codes: SchoolingCodes) -> Result<Self> {
        if !raw.weight.is_finite() || raw.weight <= 0.0 {
            return Err(RefinerError::InvalidCode {
                field: WEIGHT_COLUMN,
                value: raw.weight,
            });
        }

        let education = raw
            .schooling
            .map(|code| Education::from_schooling_code(code, codes))
            .transpose()?;

        Ok(Self {
            weight: raw.weight,
            age_band: AgeBand::from_age(raw.age)?,
            race: RaceEthnicity::from_codes(raw.race, raw.hispanic)?,
            sex: Sex::from_code(raw.sex)?,
            education,
            income: raw.income.filter(|v| v.is_finite()),
        })
    }

    /// Category of this person in `dimension`, if known
    #[must_use]
    pub fn category(&self, dimension: Dimension) -> Option<CategoryValue> {
        match dimension {
            Dimension::RaceEthnicity => Some(self.race.into()),
            Dimension::Sex => Some(self.sex.into()),
            Dimension::AgeBand => Some(self.age_band.into()),
            Dimension::Education => self.education.map(Into::into),
        }
    }

    /// Adult (35+) WhiteNH/BlackNH person, the population of the second pass
    #[must_use]
    pub fn is_retained_adult(&self) -> bool {
        self.race.is_retained() && self.age_band.is_adult()
    }
}

/// Persons derived from one unit's raw records
#[derive(Debug, Clone, Default)]
pub struct DerivedPersons {
    /// Records that mapped cleanly
    pub persons: Vec<Person>,
    /// Rejected record count keyed by the offending field
    pub rejected: BTreeMap<&'static str, usize>,
}

impl DerivedPersons {
    /// Derive all records, collecting rejections instead of failing
    #[must_use]
    pub fn from_records(records: &[RawRecord], codes: SchoolingCodes) -> Self {
        let mut derived = Self {
            persons: Vec::with_capacity(records.len()),
            rejected: BTreeMap::new(),
        };

        for raw in records {
            match Person::derive(raw, codes) {
                Ok(person) => derived.persons.push(person),
                Err(RefinerError::InvalidCode { field, .. }) => {
                    *derived.rejected.entry(field).or_insert(0) += 1;
                }
                Err(e) => {
                    log::debug!("Unexpected derivation failure: {e}");
                    *derived.rejected.entry("other").or_insert(0) += 1;
                }
            }
        }

        derived
    }

    /// Total number of rejected records
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected.values().sum()
    }
}
