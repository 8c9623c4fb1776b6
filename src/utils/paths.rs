//! Path helpers for input discovery
//!
//! PUMS person files are conventionally named `ss<yy>p<st>` (for example
//! `ss10pny.parquet`) and marginal files `marginals_<yy>`. These helpers
//! recover unit keys from such names when a manifest leaves them out.

use std::path::{Path, PathBuf};

use crate::error::{RefinerError, Result};
use crate::models::unit::{StateCode, SurveyYear, UnitKey};

fn file_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| RefinerError::InvalidKey(format!("no file name in {}", path.display())))
}

/// Infer the unit key of a PUMS person file from its name
///
/// Characters 3-4 of the stem are the two-digit year and the last two the
/// state code: `ss10pny` is New York, 2010.
///
/// # Errors
/// Returns `InvalidKey` when the name does not follow the convention
pub fn infer_pums_key(path: &Path) -> Result<UnitKey> {
    let stem = file_stem(path)?;
    let invalid = || {
        RefinerError::InvalidKey(format!(
            "cannot infer state and year from PUMS file name '{stem}'"
        ))
    };

    if !stem.is_ascii() || stem.len() < 6 {
        return Err(invalid());
    }
    let year = SurveyYear::from_short(&stem[2..4]).map_err(|_| invalid())?;
    let state = StateCode::new(&stem[stem.len() - 2..]).map_err(|_| invalid())?;
    Ok(UnitKey::new(state, year))
}

/// Infer the survey year of a marginal file from its name
///
/// The year is the second `_`-separated part of the stem: `marginals_10`.
///
/// # Errors
/// Returns `InvalidKey` when the name does not follow the convention
pub fn infer_marginal_year(path: &Path) -> Result<SurveyYear> {
    let stem = file_stem(path)?;
    stem.split('_')
        .nth(1)
        .ok_or_else(|| {
            RefinerError::InvalidKey(format!(
                "cannot infer the year from marginal file name '{stem}'"
            ))
        })
        .and_then(SurveyYear::from_short)
}

/// Resolve `path` against `base` unless it is already absolute
#[must_use]
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
