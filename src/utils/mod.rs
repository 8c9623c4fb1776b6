//! Utility functions
//!
//! Arrow column handling, file input and output, logging helpers and test
//! fixtures.

pub mod arrow;
pub mod io;
pub mod logging;
pub mod paths;
pub mod test;

// Re-export commonly used functions for convenience
pub use io::parquet::{DEFAULT_BATCH_SIZE, read_parquet, read_parquet_async, write_parquet};
