//! Run manifest
//!
//! A JSON document naming every input file of a run and where outputs go.
//! Relative paths are resolved against the manifest's own directory.
//!
//! ```json
//! {
//!   "pums": [{ "path": "pums/ss10pny.parquet" },
//!            { "path": "pums/tx.parquet", "state": "TX", "year": 2010 }],
//!   "marginals": [{ "path": "marginals/marginals_10.parquet" }],
//!   "acs": { "paths": ["acs/acs_2012.parquet"], "renames": { "HC01_EST_VC01": "POP_18_OVER" } },
//!   "output_dir": "out",
//!   "config": { "solver": { "tolerance": 1e-9 } }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::RefinerConfig;
use crate::error::util::safe_open_file;
use crate::error::{RefinerError, Result};
use crate::models::unit::{SurveyYear, UnitKey};
use crate::utils::paths::{infer_marginal_year, infer_pums_key, resolve};

/// One PUMS person file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumsInput {
    pub path: PathBuf,
    /// State code; inferred from the file name when absent
    #[serde(default)]
    pub state: Option<String>,
    /// Four-digit year; inferred from the file name when absent
    #[serde(default)]
    pub year: Option<u16>,
}

impl PumsInput {
    /// Unit key, from the explicit fields or else the file name
    pub fn key(&self) -> Result<UnitKey> {
        match (&self.state, self.year) {
            (Some(state), Some(year)) => UnitKey::parse(state, year),
            (None, None) => infer_pums_key(&self.path),
            (state, year) => {
                let inferred = infer_pums_key(&self.path)?;
                let state = match state {
                    Some(state) => state.parse()?,
                    None => inferred.state,
                };
                let year = match year {
                    Some(year) => SurveyYear::new(year)?,
                    None => inferred.year,
                };
                Ok(UnitKey::new(state, year))
            }
        }
    }
}

/// One published marginal file covering every state of a year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginalInput {
    pub path: PathBuf,
    /// Four-digit year; inferred from the file name when absent
    #[serde(default)]
    pub year: Option<u16>,
}

impl MarginalInput {
    pub fn year(&self) -> Result<SurveyYear> {
        self.year
            .map_or_else(|| infer_marginal_year(&self.path), SurveyYear::new)
    }
}

/// ACS population extracts for the population count table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcsInput {
    pub paths: Vec<PathBuf>,
    /// Source column name to canonical column name
    #[serde(default)]
    pub renames: BTreeMap<String, String>,
}

/// All inputs and settings of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(default)]
    pub pums: Vec<PumsInput>,
    #[serde(default)]
    pub marginals: Vec<MarginalInput>,
    #[serde(default)]
    pub acs: Option<AcsInput>,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub config: RefinerConfig,
}

impl RunManifest {
    /// Load a manifest and resolve its paths against the manifest directory
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if
    /// [`RunManifest::validate`] rejects it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = safe_open_file(path, "run manifest")?;
        let mut manifest: Self = serde_json::from_reader(std::io::BufReader::new(file))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        manifest.resolve_paths(base);
        manifest.validate()?;
        Ok(manifest)
    }

    /// Make every relative path relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for input in &mut self.pums {
            input.path = resolve(base, &input.path);
        }
        for input in &mut self.marginals {
            input.path = resolve(base, &input.path);
        }
        if let Some(acs) = &mut self.acs {
            for path in &mut acs.paths {
                *path = resolve(base, path);
            }
        }
        self.output_dir = resolve(base, &self.output_dir);
    }

    /// Check that the manifest describes a runnable job
    ///
    /// Every PUMS file must have a key, keys must be unique, and PUMS input
    /// needs at least one marginal file.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;

        if self.pums.is_empty() && self.acs.is_none() {
            return Err(RefinerError::Config(
                "manifest names neither PUMS nor ACS input".to_string(),
            ));
        }
        if !self.pums.is_empty() && self.marginals.is_empty() {
            return Err(RefinerError::Config(
                "PUMS input needs at least one marginal file".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for input in &self.pums {
            let key = input.key()?;
            if !seen.insert(key) {
                return Err(RefinerError::InvalidKey(format!(
                    "unit {key} is listed more than once (again by {})",
                    input.path.display()
                )));
            }
        }
        for input in &self.marginals {
            input.year()?;
        }
        if let Some(acs) = &self.acs {
            if acs.paths.is_empty() {
                return Err(RefinerError::Config("ACS input lists no files".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_manifest_paths_resolve_and_keys_infer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "pums": [{{ "path": "pums/ss10pny.parquet" }},
                         {{ "path": "people.parquet", "state": "tx", "year": 2011 }}],
                "marginals": [{{ "path": "marginals_10.parquet" }}],
                "output_dir": "out",
                "config": {{ "parallel": false }}
            }}"#
        )
        .unwrap();

        let manifest = RunManifest::from_json_file(&path).unwrap();
        assert_eq!(manifest.output_dir, dir.path().join("out"));
        assert_eq!(manifest.pums[0].path, dir.path().join("pums/ss10pny.parquet"));
        assert_eq!(manifest.pums[0].key().unwrap(), UnitKey::parse("NY", 2010).unwrap());
        assert_eq!(manifest.pums[1].key().unwrap(), UnitKey::parse("TX", 2011).unwrap());
        assert_eq!(manifest.marginals[0].year().unwrap().get(), 2010);
        assert!(!manifest.config.parallel);
        assert_eq!(manifest.config.batch_size, RefinerConfig::default().batch_size);
    }

    #[test]
    fn test_partial_key_overrides_inference() {
        let input = PumsInput {
            path: PathBuf::from("ss10pny.parquet"),
            state: None,
            year: Some(2012),
        };
        assert_eq!(input.key().unwrap(), UnitKey::parse("NY", 2012).unwrap());
    }

    #[test]
    fn test_duplicate_units_are_rejected() {
        let manifest = RunManifest {
            pums: vec![
                PumsInput {
                    path: PathBuf::from("a/ss10pny.parquet"),
                    state: None,
                    year: None,
                },
                PumsInput {
                    path: PathBuf::from("b.parquet"),
                    state: Some("NY".to_string()),
                    year: Some(2010),
                },
            ],
            marginals: vec![MarginalInput {
                path: PathBuf::from("marginals_10.parquet"),
                year: None,
            }],
            acs: None,
            output_dir: PathBuf::from("out"),
            config: RefinerConfig::default(),
        };
        assert!(matches!(manifest.validate(), Err(RefinerError::InvalidKey(_))));
    }

    #[test]
    fn test_pums_without_marginals_is_rejected() {
        let manifest = RunManifest {
            pums: vec![PumsInput {
                path: PathBuf::from("ss10pny.parquet"),
                state: None,
                year: None,
            }],
            marginals: Vec::new(),
            acs: None,
            output_dir: PathBuf::from("out"),
            config: RefinerConfig::default(),
        };
        assert!(matches!(manifest.validate(), Err(RefinerError::Config(_))));
    }
}
