//! Output rows of the refiner
//!
//! Each row type maps one-to-one onto an Arrow schema, with the column names
//! of the published Census extracts.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, FieldRef, Schema};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Conversion between a row type and Arrow record batches
pub trait ArrowSchema: Sized + Serialize + for<'de> Deserialize<'de> {
    /// Arrow schema of the row type
    fn schema() -> Schema;

    /// Columns identifying the stratum a row belongs to, for partitioned output
    fn partition_key(&self) -> String;

    /// Get the schema as `Arc<Schema>`
    fn schema_ref() -> Arc<Schema> {
        Arc::new(Self::schema())
    }

    /// Convert rows to a `RecordBatch`
    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let fields: Vec<FieldRef> = Self::schema().fields().iter().map(Arc::clone).collect();
        Ok(serde_arrow::to_record_batch(&fields, &rows)?)
    }

    /// Convert a `RecordBatch` back to rows
    fn from_record_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        Ok(serde_arrow::from_record_batch(batch)?)
    }
}

fn key_fields() -> Vec<Field> {
    vec![
        Field::new("FIPS", DataType::UInt32, false),
        Field::new("YEAR", DataType::UInt16, false),
        Field::new("RACE_ETH", DataType::Utf8, false),
    ]
}

/// Race x sex x reporting age band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeCrossTabRow {
    #[serde(rename = "FIPS")]
    pub fips: u32,
    #[serde(rename = "YEAR")]
    pub year: u16,
    #[serde(rename = "RACE_ETH")]
    pub race: String,
    #[serde(rename = "SEX_")]
    pub sex: String,
    #[serde(rename = "AGE_CAT")]
    pub age: String,
    pub total: f64,
}

impl ArrowSchema for AgeCrossTabRow {
    fn schema() -> Schema {
        let mut fields = key_fields();
        fields.push(Field::new("SEX_", DataType::Utf8, false));
        fields.push(Field::new("AGE_CAT", DataType::Utf8, false));
        fields.push(Field::new("total", DataType::Float64, false));
        Schema::new(fields)
    }

    fn partition_key(&self) -> String {
        format!("{}_{}_{}", self.race, self.sex, self.age)
    }
}

/// Race x sex x education bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationCrossTabRow {
    #[serde(rename = "FIPS")]
    pub fips: u32,
    #[serde(rename = "YEAR")]
    pub year: u16,
    #[serde(rename = "RACE_ETH")]
    pub race: String,
    #[serde(rename = "SEX_")]
    pub sex: String,
    #[serde(rename = "EDU")]
    pub education: String,
    pub total: f64,
}

impl ArrowSchema for EducationCrossTabRow {
    fn schema() -> Schema {
        let mut fields = key_fields();
        fields.push(Field::new("SEX_", DataType::Utf8, false));
        fields.push(Field::new("EDU", DataType::Utf8, false));
        fields.push(Field::new("total", DataType::Float64, false));
        Schema::new(fields)
    }

    fn partition_key(&self) -> String {
        format!("{}_{}_{}", self.race, self.sex, self.education)
    }
}

/// Race x sex x reporting age band x education bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailCrossTabRow {
    #[serde(rename = "FIPS")]
    pub fips: u32,
    #[serde(rename = "YEAR")]
    pub year: u16,
    #[serde(rename = "RACE_ETH")]
    pub race: String,
    #[serde(rename = "SEX_")]
    pub sex: String,
    #[serde(rename = "AGE_CAT")]
    pub age: String,
    #[serde(rename = "EDU")]
    pub education: String,
    pub total: f64,
}

impl ArrowSchema for DetailCrossTabRow {
    fn schema() -> Schema {
        let mut fields = key_fields();
        fields.push(Field::new("SEX_", DataType::Utf8, false));
        fields.push(Field::new("AGE_CAT", DataType::Utf8, false));
        fields.push(Field::new("EDU", DataType::Utf8, false));
        fields.push(Field::new("total", DataType::Float64, false));
        Schema::new(fields)
    }

    fn partition_key(&self) -> String {
        format!("{}_{}_{}_{}", self.race, self.sex, self.age, self.education)
    }
}

/// Weighted income summary of one race/ethnicity group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRow {
    #[serde(rename = "FIPS")]
    pub fips: u32,
    #[serde(rename = "YEAR")]
    pub year: u16,
    #[serde(rename = "RACE_ETH")]
    pub race: String,
    #[serde(rename = "Median")]
    pub median: f64,
    #[serde(rename = "Mean")]
    pub mean: f64,
}

impl ArrowSchema for IncomeRow {
    fn schema() -> Schema {
        let mut fields = key_fields();
        fields.push(Field::new("Median", DataType::Float64, false));
        fields.push(Field::new("Mean", DataType::Float64, false));
        Schema::new(fields)
    }

    fn partition_key(&self) -> String {
        self.race.clone()
    }
}
