//! Test utilities
//!
//! Deterministic synthetic inputs for unit and integration tests.


// Re-export commonly used functions for convenience
pub use fixtures::{marginal_table, synthetic_records, synthetic_totals, synthetic_unit};
