//! (state, year) unit keys
//!
//! Every raking run is scoped to one state and one survey year. The key is
//! validated once, so nothing downstream parses file names to recover it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RefinerError, Result};
use crate::models::categories::SchoolingCodes;

/// Two-letter upper-case state postal code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateCode([u8; 2]);

impl StateCode {
    /// Parse a state code; lower-case input is accepted and normalised
    pub fn new(code: &str) -> Result<Self> {
        let bytes = code.trim().as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(RefinerError::InvalidKey(format!(
                "state code must be two letters, got '{code}'"
            )));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }

    /// The code as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Both bytes are ASCII letters by construction
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateCode {
    type Err = RefinerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for StateCode {
    type Error = RefinerError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<StateCode> for String {
    fn from(value: StateCode) -> Self {
        value.as_str().to_string()
    }
}

/// Four-digit survey year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct SurveyYear(u16);

impl SurveyYear {
    /// First year with PUMS person files in the supported layout
    pub const FIRST: u16 = 2000;
    /// Last accepted year
    pub const LAST: u16 = 2099;

    /// Validate a four-digit year
    pub fn new(year: u16) -> Result<Self> {
        if (Self::FIRST..=Self::LAST).contains(&year) {
            Ok(Self(year))
        } else {
            Err(RefinerError::InvalidKey(format!(
                "survey year {year} outside {}..={}",
                Self::FIRST,
                Self::LAST
            )))
        }
    }

    /// Build from the two-digit form used in file names ("08" -> 2008)
    pub fn from_short(short: &str) -> Result<Self> {
        let digits: u16 = short.trim().parse().map_err(|_| {
            RefinerError::InvalidKey(format!("'{short}' is not a two-digit year"))
        })?;
        if short.trim().len() != 2 {
            return Err(RefinerError::InvalidKey(format!(
                "'{short}' is not a two-digit year"
            )));
        }
        Self::new(2000 + digits)
    }

    /// The four-digit year
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Two-digit form ("2008" -> 8)
    #[must_use]
    pub const fn short(self) -> u16 {
        self.0 % 100
    }

    /// `SCHL` code table in force for this year
    #[must_use]
    pub const fn schooling_codes(self) -> SchoolingCodes {
        if self.short() >= 8 {
            SchoolingCodes::From2008
        } else {
            SchoolingCodes::Pre2008
        }
    }
}

impl fmt::Display for SurveyYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for SurveyYear {
    type Error = RefinerError;

    fn try_from(value: u16) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SurveyYear> for u16 {
    fn from(value: SurveyYear) -> Self {
        value.0
    }
}

/// Key of one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    /// Survey year (sorts first so units are processed year by year)
    pub year: SurveyYear,
    /// State
    pub state: StateCode,
}

impl UnitKey {
    /// Create a key from already validated parts
    #[must_use]
    pub const fn new(state: StateCode, year: SurveyYear) -> Self {
        Self { year, state }
    }

    /// Parse and validate both parts
    pub fn parse(state: &str, year: u16) -> Result<Self> {
        Ok(Self::new(StateCode::new(state)?, SurveyYear::new(year)?))
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.state, self.year)
    }
}
