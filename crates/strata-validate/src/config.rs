//! Validator configuration file
//!
//! ```toml
//! output = "report.txt"
//!
//! [rules]
//! skip = ["variants"]
//! ```
//!
//! Command-line selections replace the file's selection as a whole, so a
//! file `skip` never combines with a command-line `only`.

use crate::selection::{RuleCategory, RuleSelection, RunConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strata_core::{Result, StrataError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub rules: RulesSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesSection {
    #[serde(default)]
    pub only: Option<RuleCategory>,
    #[serde(default)]
    pub skip: Vec<RuleCategory>,
}

impl ValidatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            StrataError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content).map_err(|e| {
            StrataError::ConfigError(format!("{}: {}", path.display(), e))
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn selection(&self) -> RuleSelection {
        RuleSelection {
            only: self.rules.only.into_iter().collect(),
            skip: self.rules.skip.clone(),
        }
    }

    /// Merge command-line values over the file and apply the selection
    /// policy
    pub fn resolve(&self, cli: &RuleSelection, cli_output: Option<PathBuf>) -> Result<RunConfig> {
        let selection = if cli.is_empty() {
            self.selection()
        } else {
            cli.clone()
        };
        let output = cli_output.or_else(|| self.output.clone());
        RunConfig::from_selection(&selection, output)
    }
}
