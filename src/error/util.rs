//! Utility functions for error handling
//!
//! Helpers that turn filesystem and column lookups into errors carrying
//! enough context to be shown to the user as plain messages.

use std::fs;
use std::io;
use std::path::Path;

use arrow::record_batch::RecordBatch;

use crate::error::{RefinerError, Result};

/// Open a file, naming the purpose in the error if it cannot be opened
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.is_file() {
        return Err(RefinerError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found (needed for {purpose})", path.display()),
        )));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => format!("failed to open for {purpose}"),
        };
        RefinerError::Io(io::Error::new(
            e.kind(),
            format!("{}: {context}: {e}", path.display()),
        ))
    })
}

/// Check that a directory exists, creating it when `create` is set
pub fn ensure_directory(path: &Path, create: bool) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(RefinerError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} exists but is not a directory", path.display()),
        )));
    }
    if create {
        fs::create_dir_all(path)?;
        return Ok(());
    }
    Err(RefinerError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Directory not found: {}", path.display()),
    )))
}

/// Fail with [`RefinerError::MissingColumn`] unless every column is present
pub fn require_columns(batch: &RecordBatch, columns: &[&str], source_name: &str) -> Result<()> {
    let schema = batch.schema();
    match columns.iter().find(|c| schema.index_of(c).is_err()) {
        Some(missing) => Err(RefinerError::missing_column(*missing, source_name)),
        None => Ok(()),
    }
}
