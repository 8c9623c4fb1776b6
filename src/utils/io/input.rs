//! Loading of run inputs
//!
//! Parquet files named by a [`RunManifest`] are read asynchronously and
//! converted into the typed inputs of the pipeline.

use std::collections::BTreeMap;
use std::path::Path;

use futures::future::try_join_all;

use crate::algorithm::acs_count::AcsPopulationTable;
use crate::algorithm::pipeline::PumsUnit;
use crate::error::{RefinerError, Result};
use crate::models::acs::AcsExtract;
use crate::models::totals::{MarginalTable, PublishedTotals};
use crate::models::unit::SurveyYear;
use crate::utils::arrow::{acs_from_batch, records_from_batch, totals_from_batch};
use crate::utils::io::manifest::{AcsInput, MarginalInput, PumsInput, RunManifest};
use crate::utils::io::parquet::read_parquet_async;
use crate::utils::logging::log_operation_complete;

/// Person columns read from PUMS files
pub const PUMS_COLUMNS: [&str; 7] = ["PWGTP", "AGEP", "SEX", "RAC1P", "HISP", "SCHL", "PINCP"];

fn source_name(path: &Path) -> String {
    path.file_stem().map_or_else(
        || path.display().to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}

/// Read one PUMS person file into a unit
pub async fn load_pums_unit(input: &PumsInput, batch_size: usize) -> Result<PumsUnit> {
    let key = input.key()?;
    let source = source_name(&input.path);
    let batches = read_parquet_async(&input.path, Some(&PUMS_COLUMNS), Some(batch_size)).await?;

    let mut records = Vec::with_capacity(batches.iter().map(|b| b.num_rows()).sum());
    for batch in &batches {
        records.extend(records_from_batch(batch, &source)?);
    }
    log_operation_complete("loaded", key, records.len(), None);
    Ok(PumsUnit::new(key, records))
}

/// Read one marginal file, returning its year and state rows
pub async fn load_marginals(
    input: &MarginalInput,
    batch_size: usize,
) -> Result<(SurveyYear, Vec<PublishedTotals>)> {
    let year = input.year()?;
    let source = source_name(&input.path);
    let batches = read_parquet_async(&input.path, None, Some(batch_size)).await?;

    let mut rows = Vec::new();
    for batch in &batches {
        rows.extend(totals_from_batch(batch, &source)?);
    }
    Ok((year, rows))
}

/// Read every ACS extract and build the population count table
pub async fn load_acs_table(input: &AcsInput, batch_size: usize) -> Result<AcsPopulationTable> {
    let extracts = try_join_all(input.paths.iter().map(|path| async move {
        let source = source_name(path);
        let batches = read_parquet_async(path, None, Some(batch_size)).await?;
        let mut extract = AcsExtract::default();
        for batch in &batches {
            extract.extend(acs_from_batch(batch, &source)?);
        }
        Ok::<_, RefinerError>(extract)
    }))
    .await?;

    let mut combined = AcsExtract::default();
    for extract in extracts {
        combined.extend(extract);
    }
    AcsPopulationTable::build(combined, &input.renames)
}

/// Everything a manifest names, loaded
#[derive(Debug, Default)]
pub struct RunInputs {
    pub units: Vec<PumsUnit>,
    pub marginals: MarginalTable,
    pub acs: Option<AcsPopulationTable>,
}

impl RunInputs {
    /// Load all inputs of a manifest concurrently
    ///
    /// # Errors
    /// Returns the first read or conversion error
    pub async fn load(manifest: &RunManifest) -> Result<Self> {
        let batch_size = manifest.config.batch_size;

        let units = try_join_all(
            manifest
                .pums
                .iter()
                .map(|input| load_pums_unit(input, batch_size)),
        );
        let marginal_files = try_join_all(
            manifest
                .marginals
                .iter()
                .map(|input| load_marginals(input, batch_size)),
        );
        let (units, marginal_files) = futures::try_join!(units, marginal_files)?;

        let mut marginals = MarginalTable::new();
        for (year, rows) in marginal_files {
            marginals.extend_year(year, rows);
        }

        let acs = match &manifest.acs {
            Some(input) => Some(load_acs_table(input, batch_size).await?),
            None => None,
        };

        Ok(Self {
            units,
            marginals,
            acs,
        })
    }

    /// Number of person records over all units
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.units.iter().map(|unit| unit.records.len()).sum()
    }

    /// Units per year, for logging
    #[must_use]
    pub fn units_per_year(&self) -> BTreeMap<SurveyYear, usize> {
        let mut counts = BTreeMap::new();
        for unit in &self.units {
            *counts.entry(unit.key.year).or_insert(0) += 1;
        }
        counts
    }
}
