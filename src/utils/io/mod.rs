//! File input and output
//!
//! - [`parquet`]: Parquet reading (sync and async) and writing
//! - [`manifest`]: the JSON run manifest
//! - [`input`]: loading manifest inputs into pipeline types
//! - [`output`]: writing result tables and the run summary

pub mod input;
pub mod manifest;
pub mod output;
pub mod parquet;

pub use input::RunInputs;
pub use manifest::RunManifest;
pub use output::{OutputWriter, RunSummary};
pub use parquet::{read_parquet, read_parquet_async, write_parquet};
