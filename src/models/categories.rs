//! Closed category sets for every raking dimension
//!
//! Each dimension is a plain enum with an exhaustive mapping from the raw
//! PUMS code, so an unmapped code is a checked [`RefinerError::InvalidCode`]
//! rather than a missing dictionary key. Labels and published column names
//! are the ones used by the Census extracts.

use std::fmt;

use serde::Serialize;

use crate::error::{RefinerError, Result};

/// Behaviour shared by all category enums
pub trait Category: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    /// The dimension this category set belongs to
    const DIMENSION: Dimension;

    /// Every category in output order
    fn all() -> &'static [Self];

    /// Label used in output tables
    fn label(self) -> &'static str;

    /// Column holding the published total for this category, if any
    fn column(self) -> Option<&'static str>;
}

/// A stratification dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Dimension {
    /// Race/ethnicity
    RaceEthnicity,
    /// Sex
    Sex,
    /// Age band
    AgeBand,
    /// Educational attainment
    Education,
}

impl Dimension {
    /// Column name of the dimension in output tables
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::RaceEthnicity => "RACE_ETH",
            Self::Sex => "SEX_",
            Self::AgeBand => "AGE_CAT",
            Self::Education => "EDU",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RaceEthnicity => "race/ethnicity",
            Self::Sex => "sex",
            Self::AgeBand => "age band",
            Self::Education => "education",
        };
        f.write_str(name)
    }
}

/// Age bands of the published population tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgeBand {
    Under5,
    Age5To9,
    Age10To14,
    Age15To19,
    Age20To24,
    Age25To34,
    Age35To44,
    Age45To54,
    Age55To59,
    Age60To64,
    Age65To74,
    Age75To84,
    Age85Plus,
}

impl AgeBand {
    /// Bands kept after the first raking pass
    pub const ADULT: [Self; 7] = [
        Self::Age35To44,
        Self::Age45To54,
        Self::Age55To59,
        Self::Age60To64,
        Self::Age65To74,
        Self::Age75To84,
        Self::Age85Plus,
    ];

    /// Map an age in whole years onto its band.
    ///
    /// Fractional ages are truncated; negative or non-finite ages are rejected.
    pub fn from_age(age: f64) -> Result<Self> {
        if !age.is_finite() || age < 0.0 {
            return Err(RefinerError::InvalidCode { field: "AGEP", value: age });
        }
        let years = age.trunc() as u32;
        Ok(match years {
            0..=4 => Self::Under5,
            5..=9 => Self::Age5To9,
            10..=14 => Self::Age10To14,
            15..=19 => Self::Age15To19,
            20..=24 => Self::Age20To24,
            25..=34 => Self::Age25To34,
            35..=44 => Self::Age35To44,
            45..=54 => Self::Age45To54,
            55..=59 => Self::Age55To59,
            60..=64 => Self::Age60To64,
            65..=74 => Self::Age65To74,
            75..=84 => Self::Age75To84,
            _ => Self::Age85Plus,
        })
    }

    /// Whether the band survives past the first pass (35 and over)
    #[must_use]
    pub fn is_adult(self) -> bool {
        self >= Self::Age35To44
    }

    /// Band used in reconciled output, `None` for non-adult bands
    #[must_use]
    pub fn reporting(self) -> Option<ReportingAgeBand> {
        Some(match self {
            Self::Age35To44 => ReportingAgeBand::Age35To44,
            Self::Age45To54 => ReportingAgeBand::Age45To54,
            Self::Age55To59 | Self::Age60To64 => ReportingAgeBand::Age55To64,
            Self::Age65To74 => ReportingAgeBand::Age65To74,
            Self::Age75To84 => ReportingAgeBand::Age75To84,
            Self::Age85Plus => ReportingAgeBand::Age85Plus,
            _ => return None,
        })
    }
}

impl Category for AgeBand {
    const DIMENSION: Dimension = Dimension::AgeBand;

    fn all() -> &'static [Self] {
        &[
            Self::Under5,
            Self::Age5To9,
            Self::Age10To14,
            Self::Age15To19,
            Self::Age20To24,
            Self::Age25To34,
            Self::Age35To44,
            Self::Age45To54,
            Self::Age55To59,
            Self::Age60To64,
            Self::Age65To74,
            Self::Age75To84,
            Self::Age85Plus,
        ]
    }

    fn label(self) -> &'static str {
        match self {
            Self::Under5 => "0-5",
            Self::Age5To9 => "5-9",
            Self::Age10To14 => "10-14",
            Self::Age15To19 => "15-19",
            Self::Age20To24 => "20-24",
            Self::Age25To34 => "25-34",
            Self::Age35To44 => "35-44",
            Self::Age45To54 => "45-54",
            Self::Age55To59 => "55-59",
            Self::Age60To64 => "60-64",
            Self::Age65To74 => "65-74",
            Self::Age75To84 => "75-84",
            Self::Age85Plus => "85+",
        }
    }

    fn column(self) -> Option<&'static str> {
        Some(match self {
            Self::Under5 => "POP_0_5",
            Self::Age5To9 => "POP_5_9",
            Self::Age10To14 => "POP_10_14",
            Self::Age15To19 => "POP_15_19",
            Self::Age20To24 => "POP_20_24",
            Self::Age25To34 => "POP_25_34",
            Self::Age35To44 => "POP_35_44",
            Self::Age45To54 => "POP_45_54",
            Self::Age55To59 => "POP_55_59",
            Self::Age60To64 => "POP_60_64",
            Self::Age65To74 => "POP_65_74",
            Self::Age75To84 => "POP_75_84",
            Self::Age85Plus => "POP_85_OVER",
        })
    }
}

/// Adult age bands of the reconciled output tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ReportingAgeBand {
    Age35To44,
    Age45To54,
    Age55To64,
    Age65To74,
    Age75To84,
    Age85Plus,
}

impl Category for ReportingAgeBand {
    const DIMENSION: Dimension = Dimension::AgeBand;

    fn all() -> &'static [Self] {
        &[
            Self::Age35To44,
            Self::Age45To54,
            Self::Age55To64,
            Self::Age65To74,
            Self::Age75To84,
            Self::Age85Plus,
        ]
    }

    fn label(self) -> &'static str {
        match self {
            Self::Age35To44 => "35-44",
            Self::Age45To54 => "45-54",
            Self::Age55To64 => "55-64",
            Self::Age65To74 => "65-74",
            Self::Age75To84 => "75-84",
            Self::Age85Plus => "85+",
        }
    }

    fn column(self) -> Option<&'static str> {
        None
    }
}

/// Race/ethnicity derived from the race and Hispanic-origin codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RaceEthnicity {
    WhiteNH,
    BlackNH,
    OtherNH,
    Hispanic,
}

impl RaceEthnicity {
    /// Categories carried past the first pass
    pub const RETAINED: [Self; 2] = [Self::WhiteNH, Self::BlackNH];

    /// Derive from `RAC1P` and `HISP`; a `HISP` code of 1 means "not Hispanic".
    pub fn from_codes(race_code: f64, hispanic_code: f64) -> Result<Self> {
        if !hispanic_code.is_finite() {
            return Err(RefinerError::InvalidCode { field: "HISP", value: hispanic_code });
        }
        if hispanic_code != 1.0 {
            return Ok(Self::Hispanic);
        }
        if !race_code.is_finite() {
            return Err(RefinerError::InvalidCode { field: "RAC1P", value: race_code });
        }
        Ok(match race_code as i64 {
            1 => Self::WhiteNH,
            2 => Self::BlackNH,
            _ => Self::OtherNH,
        })
    }

    /// Whether the category is kept after the first pass
    #[must_use]
    pub fn is_retained(self) -> bool {
        matches!(self, Self::WhiteNH | Self::BlackNH)
    }

    /// Population group label used by the ACS published tables
    #[must_use]
    pub fn acs_group(self) -> Option<&'static str> {
        match self {
            Self::WhiteNH => Some("White alone, not Hispanic or Latino"),
            Self::BlackNH => Some("Black or African American alone, not Hispanic or Latino"),
            _ => None,
        }
    }

    /// Inverse of [`RaceEthnicity::acs_group`]
    #[must_use]
    pub fn from_acs_group(label: &str) -> Option<Self> {
        Self::RETAINED
            .into_iter()
            .find(|race| race.acs_group() == Some(label))
    }
}

impl Category for RaceEthnicity {
    const DIMENSION: Dimension = Dimension::RaceEthnicity;

    fn all() -> &'static [Self] {
        &[Self::WhiteNH, Self::BlackNH, Self::OtherNH, Self::Hispanic]
    }

    fn label(self) -> &'static str {
        match self {
            Self::WhiteNH => "WhiteNH",
            Self::BlackNH => "BlackNH",
            Self::OtherNH => "OtherNH",
            Self::Hispanic => "Hispanic",
        }
    }

    fn column(self) -> Option<&'static str> {
        Some(match self {
            Self::WhiteNH => "POP_WNH",
            Self::BlackNH => "POP_BNH",
            Self::OtherNH => "POP_ONH",
            Self::Hispanic => "POP_HISP",
        })
    }
}

/// Sex
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Map the `SEX` code (1 male, 2 female)
    pub fn from_code(code: f64) -> Result<Self> {
        if code == 1.0 {
            Ok(Self::Male)
        } else if code == 2.0 {
            Ok(Self::Female)
        } else {
            Err(RefinerError::InvalidCode { field: "SEX", value: code })
        }
    }
}

impl Category for Sex {
    const DIMENSION: Dimension = Dimension::Sex;

    fn all() -> &'static [Self] {
        &[Self::Male, Self::Female]
    }

    fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    fn column(self) -> Option<&'static str> {
        Some(match self {
            Self::Male => "POP_M",
            Self::Female => "POP_F",
        })
    }
}

/// Which `SCHL` code table applies to a survey year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchoolingCodes {
    /// Survey years before 2008
    Pre2008,
    /// Survey years 2008 and later
    From2008,
}

impl SchoolingCodes {
    /// Upper bound (inclusive) of each education level, in [`Education::all`] order
    #[must_use]
    pub const fn bounds(self) -> [u32; 7] {
        match self {
            Self::Pre2008 => [4, 8, 9, 11, 12, 13, 16],
            Self::From2008 => [11, 15, 17, 19, 20, 21, 24],
        }
    }
}

/// Educational attainment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Education {
    LessThan9thGrade,
    Grade9To12,
    HighSchool,
    SomeCollege,
    Associates,
    Bachelors,
    Graduate,
}

impl Education {
    /// Map a `SCHL` code using the table of the survey year
    pub fn from_schooling_code(code: f64, codes: SchoolingCodes) -> Result<Self> {
        let invalid = RefinerError::InvalidCode { field: "SCHL", value: code };
        if !code.is_finite() || code < 0.0 {
            return Err(invalid);
        }
        let code = code.trunc() as u32;
        codes
            .bounds()
            .iter()
            .zip(Self::all())
            .find(|(bound, _)| code <= **bound)
            .map(|(_, level)| *level)
            .ok_or(invalid)
    }

    /// Two-way collapse used in the final output
    #[must_use]
    pub fn bucket(self) -> EducationBucket {
        if self <= Self::HighSchool {
            EducationBucket::HsOrLess
        } else {
            EducationBucket::SomeCollegeOrMore
        }
    }
}

impl Category for Education {
    const DIMENSION: Dimension = Dimension::Education;

    fn all() -> &'static [Self] {
        &[
            Self::LessThan9thGrade,
            Self::Grade9To12,
            Self::HighSchool,
            Self::SomeCollege,
            Self::Associates,
            Self::Bachelors,
            Self::Graduate,
        ]
    }

    fn label(self) -> &'static str {
        match self {
            Self::LessThan9thGrade => "Less than 9th grade",
            Self::Grade9To12 => "9th to 12th grade",
            Self::HighSchool => "High School",
            Self::SomeCollege => "Some college",
            Self::Associates => "Associates Degree",
            Self::Bachelors => "Bachelors Degree",
            Self::Graduate => "Graduate Degree",
        }
    }

    fn column(self) -> Option<&'static str> {
        Some(match self {
            Self::LessThan9thGrade => "POP_LESS_9",
            Self::Grade9To12 => "POP_9_12",
            Self::HighSchool => "POP_HS",
            Self::SomeCollege => "POP_SC",
            Self::Associates => "POP_AD",
            Self::Bachelors => "POP_BD",
            Self::Graduate => "POP_GD",
        })
    }
}

/// Collapsed education buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EducationBucket {
    HsOrLess,
    SomeCollegeOrMore,
}

impl Category for EducationBucket {
    const DIMENSION: Dimension = Dimension::Education;

    fn all() -> &'static [Self] {
        &[Self::HsOrLess, Self::SomeCollegeOrMore]
    }

    fn label(self) -> &'static str {
        match self {
            Self::HsOrLess => "HS or Less",
            Self::SomeCollegeOrMore => "Some college or more",
        }
    }

    fn column(self) -> Option<&'static str> {
        None
    }
}

/// A category of any raking dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CategoryValue {
    Race(RaceEthnicity),
    Sex(Sex),
    Age(AgeBand),
    Education(Education),
}

impl CategoryValue {
    /// Dimension of the wrapped category
    #[must_use]
    pub fn dimension(self) -> Dimension {
        match self {
            Self::Race(_) => Dimension::RaceEthnicity,
            Self::Sex(_) => Dimension::Sex,
            Self::Age(_) => Dimension::AgeBand,
            Self::Education(_) => Dimension::Education,
        }
    }

    /// Output label of the wrapped category
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Race(c) => c.label(),
            Self::Sex(c) => c.label(),
            Self::Age(c) => c.label(),
            Self::Education(c) => c.label(),
        }
    }

    /// Published column of the wrapped category
    #[must_use]
    pub fn column(self) -> Option<&'static str> {
        match self {
            Self::Race(c) => c.column(),
            Self::Sex(c) => c.column(),
            Self::Age(c) => c.column(),
            Self::Education(c) => c.column(),
        }
    }

    /// All categories of a dimension in output order
    #[must_use]
    pub fn all_of(dimension: Dimension) -> Vec<Self> {
        match dimension {
            Dimension::RaceEthnicity => RaceEthnicity::all().iter().map(|&c| c.into()).collect(),
            Dimension::Sex => Sex::all().iter().map(|&c| c.into()).collect(),
            Dimension::AgeBand => AgeBand::all().iter().map(|&c| c.into()).collect(),
            Dimension::Education => Education::all().iter().map(|&c| c.into()).collect(),
        }
    }
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<RaceEthnicity> for CategoryValue {
    fn from(value: RaceEthnicity) -> Self {
        Self::Race(value)
    }
}

impl From<Sex> for CategoryValue {
    fn from(value: Sex) -> Self {
        Self::Sex(value)
    }
}

impl From<AgeBand> for CategoryValue {
    fn from(value: AgeBand) -> Self {
        Self::Age(value)
    }
}

impl From<Education> for CategoryValue {
    fn from(value: Education) -> Self {
        Self::Education(value)
    }
}
