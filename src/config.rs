//! Resolver configuration
//!
//! Loaded from an optional YAML file; every field has a default so an empty
//! file (or no file at all) gives the standard 25% UBO run.
//!
//! ```yaml
//! threshold: 0.25
//! aggregation: keep_separate   # or: sum
//! max_depth: ~
//! repair_line_breaks: true
//! files:
//!   company: company.tsv
//!   founder_legal: founder_legal.tsv
//!   founder_natural: founder_natural.tsv
//! output: results.tsv
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, UboError};

/// Cumulative share at which a natural person is reported as a UBO
pub const DEFAULT_UBO_THRESHOLD: f64 = 0.25;

/// How the resolver treats several paths from one person to one company
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// One result row per ownership path
    #[default]
    KeepSeparate,
    /// Paths to the same (company, person) are summed into one row
    Sum,
}

/// Input file names, relative to the data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub company: PathBuf,
    pub founder_legal: PathBuf,
    pub founder_natural: PathBuf,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            company: PathBuf::from("company.tsv"),
            founder_legal: PathBuf::from("founder_legal.tsv"),
            founder_natural: PathBuf::from("founder_natural.tsv"),
        }
    }
}

impl DataFiles {
    /// Resolve all three file names against `dir`
    pub fn in_dir(&self, dir: &Path) -> Self {
        Self {
            company: dir.join(&self.company),
            founder_legal: dir.join(&self.founder_legal),
            founder_natural: dir.join(&self.founder_natural),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Inclusive lower bound on the flattened share, as a fraction
    pub threshold: f64,
    pub aggregation: AggregationPolicy,
    /// Maximum number of companies on one traversal path (None = unbounded)
    pub max_depth: Option<usize>,
    /// Join records split by stray line breaks before parsing
    pub repair_line_breaks: bool,
    pub files: DataFiles,
    pub output: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_UBO_THRESHOLD,
            aggregation: AggregationPolicy::default(),
            max_depth: None,
            repair_line_breaks: true,
            files: DataFiles::default(),
            output: PathBuf::from("results.tsv"),
        }
    }
}

impl ResolverConfig {
    /// Load config from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| UboError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            UboError::Config(ConfigError::Parse { message, .. }) => {
                UboError::Config(ConfigError::Parse {
                    path: path.to_path_buf(),
                    message,
                })
            }
            other => other,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.max_depth == Some(0) {
            return Err(ConfigError::InvalidMaxDepth);
        }
        Ok(())
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationPolicy) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}
