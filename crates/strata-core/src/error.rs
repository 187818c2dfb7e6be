//! Error types for Strata

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Strata operations
#[derive(Debug, Error)]
pub enum StrataError {
    #[error("Invalid scene path: {0}")]
    InvalidPath(String),

    #[error("Prim not found: {0}")]
    PrimNotFound(String),

    #[error("Variant set '{set}' not found on prim {prim}")]
    VariantSetNotFound { prim: String, set: String },

    #[error("Variant '{variant}' is not part of set '{set}' on prim {prim}")]
    VariantNotFound {
        prim: String,
        set: String,
        variant: String,
    },

    #[error("Layer error: {0}")]
    LayerError(String),

    #[error("Failed to open scene file {path}: {reason}")]
    StageOpenFailed { path: PathBuf, reason: String },

    #[error("Only one '--only' flag can be used at a time")]
    MultipleOnlyFlags,

    #[error("Cannot combine '--only' and '--skip' flags")]
    OnlyWithSkip,

    #[error("Cannot skip all rules. At least one rule must run")]
    AllRulesDisabled,

    #[error("Unknown rule category: {0}")]
    UnknownCategory(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Could not write output file {path}: {source}")]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

impl StrataError {
    /// True for errors produced by contradictory or incomplete rule selection
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StrataError::MultipleOnlyFlags
                | StrataError::OnlyWithSkip
                | StrataError::AllRulesDisabled
                | StrataError::UnknownCategory(_)
                | StrataError::ConfigError(_)
        )
    }
}

/// Result type alias for Strata operations
pub type Result<T> = std::result::Result<T, StrataError>;

impl From<toml::de::Error> for StrataError {
    fn from(err: toml::de::Error) -> Self {
        StrataError::TomlParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_classified() {
        assert!(StrataError::MultipleOnlyFlags.is_config_error());
        assert!(StrataError::OnlyWithSkip.is_config_error());
        assert!(StrataError::AllRulesDisabled.is_config_error());
        assert!(!StrataError::PrimNotFound("/World".to_string()).is_config_error());
    }

    #[test]
    fn test_variant_error_message() {
        let err = StrataError::VariantNotFound {
            prim: "/World".to_string(),
            set: "look".to_string(),
            variant: "green".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Variant 'green' is not part of set 'look' on prim /World"
        );
    }
}
