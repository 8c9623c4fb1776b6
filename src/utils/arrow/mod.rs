//! Arrow data handling utilities
//!
//! This module contains utilities for working with Arrow arrays and record
//! batches: column lookup with type adaptation, whole-column extraction, and
//! conversion of input batches into typed rows.

pub mod array_utils;
pub mod conversion;
pub mod extractors;

// Re-export commonly used functions for convenience
pub use array_utils::{get_column, require_column};
pub use conversion::{acs_from_batch, records_from_batch, totals_from_batch};
pub use extractors::{extract_float64, extract_string, extract_uint32};
