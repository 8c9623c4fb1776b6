//! Utilities for working with Arrow arrays.
//!
//! Column lookup with type adaptation, so callers can rely on one physical
//! type whatever numeric (or string) type the input file used.

use arrow::array::{Array, ArrayRef};
use arrow::compute::kernels::cast::{can_cast_types, cast};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{RefinerError, Result};

/// Get a column from a record batch, cast to `expected_type`
///
/// # Arguments
///
/// * `batch` - The record batch containing the column
/// * `column_name` - The name of the column to extract
/// * `expected_type` - The data type the caller works with
/// * `source_name` - What is being read, for error messages
///
/// # Returns
///
/// * `Ok(Some(ArrayRef))` - The column array (converted if necessary) if found
/// * `Ok(None)` - If the column is not present
/// * `Err` - If the column cannot be cast
pub fn get_column(
    batch: &RecordBatch,
    column_name: &str,
    expected_type: &DataType,
    source_name: &str,
) -> Result<Option<ArrayRef>> {
    let Ok(idx) = batch.schema().index_of(column_name) else {
        return Ok(None);
    };

    let column = batch.column(idx);
    let actual_type = column.data_type();
    if actual_type == expected_type {
        return Ok(Some(column.clone()));
    }

    if !can_cast_types(actual_type, expected_type) {
        return Err(RefinerError::Serialization(format!(
            "column '{column_name}' of {source_name} has type {actual_type:?}, \
             which cannot be read as {expected_type:?}"
        )));
    }

    debug!("Converting column '{column_name}' from {actual_type:?} to {expected_type:?}");
    Ok(Some(cast(column, expected_type)?))
}

/// Like [`get_column`], failing with `MissingColumn` when the column is absent
pub fn require_column(
    batch: &RecordBatch,
    column_name: &str,
    expected_type: &DataType,
    source_name: &str,
) -> Result<ArrayRef> {
    get_column(batch, column_name, expected_type, source_name)?
        .ok_or_else(|| RefinerError::missing_column(column_name, source_name))
}

/// Downcast a column to a specific array type with clear error messages
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        RefinerError::Serialization(format!(
            "column '{column_name}' has unexpected array type {:?}",
            array.data_type()
        ))
    })
}
