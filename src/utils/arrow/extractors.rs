//! Column extraction utilities for Arrow record batches
//!
//! Whole-column extractors returning plain vectors, with nulls kept as `None`.

use arrow::array::{Array, Float64Array, StringArray, UInt32Array};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::utils::arrow::array_utils::{downcast_array, get_column, require_column};

/// Extract a numeric column as `f64`
///
/// # Arguments
///
/// * `batch` - The record batch to extract from
/// * `column_name` - The name of the column
/// * `required` - Whether a missing column is an error
/// * `source_name` - What is being read, for error messages
///
/// # Returns
///
/// * `Ok(Some(values))` - One entry per row, `None` for nulls
/// * `Ok(None)` - If the column is not present (and not required)
pub fn extract_float64(
    batch: &RecordBatch,
    column_name: &str,
    required: bool,
    source_name: &str,
) -> Result<Option<Vec<Option<f64>>>> {
    let array = if required {
        Some(require_column(batch, column_name, &DataType::Float64, source_name)?)
    } else {
        get_column(batch, column_name, &DataType::Float64, source_name)?
    };

    array
        .map(|array| {
            let values = downcast_array::<Float64Array>(&array, column_name)?;
            Ok(values.iter().collect())
        })
        .transpose()
}

/// Extract a required string column
pub fn extract_string(
    batch: &RecordBatch,
    column_name: &str,
    source_name: &str,
) -> Result<Vec<Option<String>>> {
    let array = require_column(batch, column_name, &DataType::Utf8, source_name)?;
    let values = downcast_array::<StringArray>(&array, column_name)?;
    Ok(values.iter().map(|v| v.map(str::to_string)).collect())
}

/// Extract a required unsigned integer column (numeric or numeric text)
pub fn extract_uint32(
    batch: &RecordBatch,
    column_name: &str,
    source_name: &str,
) -> Result<Vec<Option<u32>>> {
    let array = require_column(batch, column_name, &DataType::UInt32, source_name)?;
    let values = downcast_array::<UInt32Array>(&array, column_name)?;
    Ok((0..values.len())
        .map(|i| (!values.is_null(i)).then(|| values.value(i)))
        .collect())
}
