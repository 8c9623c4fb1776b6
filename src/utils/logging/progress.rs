//! Progress reporting for long-running operations
//!
//! Thin wrappers around indicatif with the styles used across the refiner.

use indicatif::{ProgressBar, ProgressStyle};

/// Style for the unit progress bar
pub const UNIT_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} units ({per_sec}) {msg}";

/// Create the progress bar for (state, year) units.
///
/// A hidden bar is returned when `visible` is false, so callers never branch
/// on whether progress is shown.
///
/// # Arguments
/// * `length` - Number of units
/// * `visible` - Whether to draw the bar
#[must_use]
pub fn create_unit_progress_bar(length: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(length);
    match ProgressStyle::default_bar().template(UNIT_TEMPLATE) {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => log::debug!("Falling back to the default progress style: {e}"),
    }
    pb
}

/// Finish a progress bar with a completion message
///
/// # Arguments
/// * `pb` - The `ProgressBar` to finish
/// * `message` - Optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}
