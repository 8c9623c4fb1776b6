//! Domain models
//!
//! Categories and unit keys, input records and published totals, and the
//! output rows written by the refiner.

pub mod acs;
pub mod categories;
pub mod output;
pub mod record;
pub mod totals;
pub mod unit;

pub use categories::{
    AgeBand, Category, CategoryValue, Dimension, Education, EducationBucket, RaceEthnicity,
    ReportingAgeBand, Sex,
};
pub use output::{AgeCrossTabRow, ArrowSchema, DetailCrossTabRow, EducationCrossTabRow, IncomeRow};
pub use record::{DerivedPersons, Person, RawRecord};
pub use totals::{MarginalTable, PublishedTotals};
pub use unit::{StateCode, SurveyYear, UnitKey};
