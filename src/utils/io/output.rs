//! Writing of run outputs
//!
//! Every table is written as one Parquet file. With partitioning enabled the
//! rows are also split into one file per stratum under a directory named
//! after the table. A JSON summary records what was written and which units
//! were skipped.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::algorithm::acs_count::AcsPopulationTable;
use crate::algorithm::pipeline::{RefinerOutput, UnitFailure};
use crate::algorithm::raking::RakingDiagnostic;
use crate::error::Result;
use crate::error::util::ensure_directory;
use crate::models::output::ArrowSchema;
use crate::utils::io::parquet::write_parquet;

pub const AGE_TABLE: &str = "ipf_age";
pub const EDUCATION_TABLE: &str = "ipf_education";
pub const DETAIL_TABLE: &str = "ipf_detail";
pub const INCOME_TABLE: &str = "income";
pub const ACS_TABLE: &str = "acs_pop_count";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// File-name safe form of a stratum key
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Writes tables into one output directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    partition: bool,
}

impl OutputWriter {
    /// Create the writer, creating `dir` if needed
    pub fn new(dir: &Path, partition: bool) -> Result<Self> {
        ensure_directory(dir, true)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            partition,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one table, returning the files written
    ///
    /// Empty tables are skipped.
    pub fn write_table<R: ArrowSchema + Clone>(&self, name: &str, rows: &[R]) -> Result<Vec<PathBuf>> {
        if rows.is_empty() {
            log::info!("No rows for table {name}; nothing written");
            return Ok(Vec::new());
        }

        let mut written = Vec::new();
        let path = self.dir.join(format!("{name}.parquet"));
        write_parquet(&path, R::schema_ref(), &[R::to_record_batch(rows)?])?;
        written.push(path);

        if self.partition {
            let mut strata: BTreeMap<String, Vec<&R>> = BTreeMap::new();
            for row in rows {
                strata.entry(row.partition_key()).or_default().push(row);
            }
            for (key, members) in strata {
                let members: Vec<R> = members.into_iter().cloned().collect();
                let path = self
                    .dir
                    .join(name)
                    .join(format!("{}.parquet", sanitize(&key)));
                write_parquet(&path, R::schema_ref(), &[R::to_record_batch(&members)?])?;
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Write every table of a pipeline run
    pub fn write_refiner_output(&self, output: &RefinerOutput) -> Result<Vec<PathBuf>> {
        let mut written = self.write_table(AGE_TABLE, &output.age_rows)?;
        written.extend(self.write_table(EDUCATION_TABLE, &output.education_rows)?);
        written.extend(self.write_table(DETAIL_TABLE, &output.detail_rows)?);
        written.extend(self.write_table(INCOME_TABLE, &output.income_rows)?);
        Ok(written)
    }

    /// Write the ACS population count table
    pub fn write_acs(&self, table: &AcsPopulationTable) -> Result<PathBuf> {
        let batch = table.to_record_batch()?;
        let path = self.dir.join(format!("{ACS_TABLE}.parquet"));
        write_parquet(&path, batch.schema(), &[batch])?;
        Ok(path)
    }

    /// Write the run summary as pretty JSON
    pub fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        let path = self.dir.join(SUMMARY_FILE);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, summary)?;
        writer.flush()?;
        Ok(path)
    }
}

/// What a run did
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub units_completed: usize,
    pub records_rejected: usize,
    pub failures: Vec<UnitFailure>,
    pub diagnostics: Vec<RakingDiagnostic>,
    pub outputs: Vec<PathBuf>,
}

impl RunSummary {
    /// Summarise a run that started at `started_at` and ends now
    #[must_use]
    pub fn new(started_at: DateTime<Utc>, output: &RefinerOutput, outputs: Vec<PathBuf>) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            units_completed: output.units_completed,
            records_rejected: output.records_rejected,
            failures: output.failures.clone(),
            diagnostics: output.diagnostics.clone(),
            outputs,
        }
    }
}
