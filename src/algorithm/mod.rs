//! Algorithm implementations
//!
//! Raking of survey tables, weighted income summaries, ACS population counts
//! and the pipeline that drives them over (state, year) units.

pub mod acs_count;
pub mod income;
pub mod pipeline;
pub mod raking;
