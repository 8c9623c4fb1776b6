//! Parquet file operations
//!
//! Reading Parquet files into Arrow record batches, synchronously or as an
//! async stream, and writing record batches back out.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use itertools::Itertools;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::async_reader::ParquetRecordBatchStreamBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::schema::types::SchemaDescriptor;

use crate::error::Result;
use crate::error::util::{ensure_directory, safe_open_file};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Helper for creating a projection mask from column names
///
/// # Arguments
/// * `columns` - Columns to read
/// * `file_schema` - The Arrow schema of the file
/// * `parquet_schema` - The Parquet schema descriptor from the builder
///
/// # Returns
/// A projection mask, or `None` when no listed column exists (read everything)
#[must_use]
pub fn create_projection(
    columns: &[&str],
    file_schema: &Schema,
    parquet_schema: &SchemaDescriptor,
) -> Option<ProjectionMask> {
    let projection = columns
        .iter()
        .filter_map(|name| file_schema.index_of(name).ok())
        .sorted()
        .collect_vec();

    if projection.is_empty() {
        log_warning(
            "No matching fields found in schema projection, reading all columns",
            None,
        );
        None
    } else {
        Some(ProjectionMask::roots(parquet_schema, projection))
    }
}

/// Read a Parquet file into Arrow record batches
///
/// # Arguments
/// * `path` - Path to the Parquet file
/// * `columns` - Optional column projection
/// * `batch_size` - Rows per batch (defaults to `DEFAULT_BATCH_SIZE`)
///
/// # Errors
/// Returns an error if the file cannot be opened or if the Parquet file is invalid
pub fn read_parquet(
    path: &Path,
    columns: Option<&[&str]>,
    batch_size: Option<usize>,
) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading parquet file", path.display());

    let file = safe_open_file(path, "reading parquet")?;
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    if let Some(columns) = columns {
        if let Some(mask) = create_projection(columns, builder.schema(), builder.parquet_schema())
        {
            builder = builder.with_projection(mask);
        }
    }

    let reader = builder
        .with_batch_size(batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;

    log_operation_complete("read", path.display(), batches.len(), Some(start.elapsed()));
    Ok(batches)
}

/// Read a Parquet file asynchronously into Arrow record batches
///
/// The file is streamed batch by batch rather than read in one piece.
///
/// # Arguments
/// * `path` - Path to the Parquet file
/// * `columns` - Optional column projection
/// * `batch_size` - Rows per batch (defaults to `DEFAULT_BATCH_SIZE`)
///
/// # Errors
/// Returns an error if file reading fails
pub async fn read_parquet_async(
    path: &Path,
    columns: Option<&[&str]>,
    batch_size: Option<usize>,
) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading parquet file asynchronously", path.display());

    let file = tokio::fs::File::open(path).await?;
    let mut builder = ParquetRecordBatchStreamBuilder::new(file).await?;

    if let Some(columns) = columns {
        if let Some(mask) = create_projection(columns, builder.schema(), builder.parquet_schema())
        {
            builder = builder.with_projection(mask);
        }
    }

    let stream = builder
        .with_batch_size(batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;
    let batches = stream.try_collect::<Vec<_>>().await?;

    log_operation_complete("read", path.display(), batches.len(), Some(start.elapsed()));
    Ok(batches)
}

/// Write record batches to one Parquet file, creating parent directories
///
/// # Returns
/// The number of rows written
///
/// # Errors
/// Returns an error if the file cannot be created or a batch does not match `schema`
pub fn write_parquet(path: &Path, schema: SchemaRef, batches: &[RecordBatch]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent, true)?;
    }

    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), schema, Some(props))?;

    let mut rows = 0;
    for batch in batches {
        writer.write(batch)?;
        rows += batch.num_rows();
    }
    writer.close()?;

    log_operation_complete("wrote", path.display(), rows, None);
    Ok(rows)
}
