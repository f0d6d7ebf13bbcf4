//! Error handling for the beneficial ownership pipeline
//!
//! Only structural problems are errors: unreadable files, missing columns and
//! unparsable key fields. Data-quality gaps (missing percentages, unknown
//! founders, cycles) are modelled as "no contribution" by the core stages and
//! never reach this type.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the resolver
#[derive(Error, Debug)]
pub enum UboError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required column '{column}' in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Invalid value '{value}' for '{field}' in {source_name} row {row}")]
    InvalidField {
        source_name: String,
        row: usize,
        field: String,
        value: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("max_depth must be at least 1")]
    InvalidMaxDepth,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, UboError>;

impl UboError {
    pub fn invalid_field(
        source_name: &str,
        row: usize,
        field: &str,
        value: impl Into<String>,
    ) -> Self {
        UboError::InvalidField {
            source_name: source_name.to_string(),
            row,
            field: field.to_string(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_field_display_names_row() {
        let err = UboError::invalid_field("company.tsv", 7, "inn", "abc");
        assert_eq!(
            err.to_string(),
            "Invalid value 'abc' for 'inn' in company.tsv row 7"
        );
    }

    #[test]
    fn test_config_error_converts() {
        let err: UboError = ConfigError::InvalidThreshold(1.5).into();
        assert!(matches!(err, UboError::Config(_)));
        assert!(err.to_string().contains("1.5"));
    }
}
