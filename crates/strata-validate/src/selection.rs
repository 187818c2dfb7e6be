//! Rule selection policy

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strata_core::{Result, StrataError};

/// The validation categories, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Geometry,
    #[serde(alias = "shader")]
    Shaders,
    #[serde(alias = "layer")]
    Layers,
    #[serde(alias = "variant")]
    Variants,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 4] = [
        RuleCategory::Geometry,
        RuleCategory::Shaders,
        RuleCategory::Layers,
        RuleCategory::Variants,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            RuleCategory::Geometry => "geometry",
            RuleCategory::Shaders => "shaders",
            RuleCategory::Layers => "layers",
            RuleCategory::Variants => "variants",
        }
    }
}

impl FromStr for RuleCategory {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geometry" => Ok(RuleCategory::Geometry),
            "shaders" | "shader" => Ok(RuleCategory::Shaders),
            "layers" | "layer" => Ok(RuleCategory::Layers),
            "variants" | "variant" => Ok(RuleCategory::Variants),
            _ => Err(StrataError::UnknownCategory(s.to_string())),
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Raw `only`/`skip` requests, before the policy is applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSelection {
    pub only: Vec<RuleCategory>,
    pub skip: Vec<RuleCategory>,
}

impl RuleSelection {
    pub fn only(category: RuleCategory) -> Self {
        Self {
            only: vec![category],
            skip: Vec::new(),
        }
    }

    pub fn skip(categories: impl IntoIterator<Item = RuleCategory>) -> Self {
        Self {
            only: Vec::new(),
            skip: categories.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.only.is_empty() && self.skip.is_empty()
    }
}

/// Which rules run, and where the rendered report is exported.
///
/// Always has at least one rule enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    enabled: BTreeSet<RuleCategory>,
    output: Option<PathBuf>,
}

impl RunConfig {
    /// Every rule enabled, no export
    pub fn all() -> Self {
        Self {
            enabled: RuleCategory::ALL.into_iter().collect(),
            output: None,
        }
    }

    /// Apply the selection policy.
    ///
    /// At most one distinct `only` category; `only` and `skip` cannot be
    /// mixed; skipping every category is rejected. Each `skip` disables
    /// exactly its own category.
    pub fn from_selection(selection: &RuleSelection, output: Option<PathBuf>) -> Result<Self> {
        let only: BTreeSet<RuleCategory> = selection.only.iter().copied().collect();
        if only.len() > 1 {
            return Err(StrataError::MultipleOnlyFlags);
        }
        if !only.is_empty() && !selection.skip.is_empty() {
            return Err(StrataError::OnlyWithSkip);
        }

        let enabled: BTreeSet<RuleCategory> = if only.is_empty() {
            RuleCategory::ALL
                .into_iter()
                .filter(|c| !selection.skip.contains(c))
                .collect()
        } else {
            only
        };

        if enabled.is_empty() {
            return Err(StrataError::AllRulesDisabled);
        }

        Ok(Self { enabled, output })
    }

    pub fn is_enabled(&self, category: RuleCategory) -> bool {
        self.enabled.contains(&category)
    }

    /// Enabled categories in registration order
    pub fn enabled(&self) -> Vec<RuleCategory> {
        self.enabled.iter().copied().collect()
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Remove the export target, for callers that write their own artifact
    pub fn take_output(&mut self) -> Option<PathBuf> {
        self.output.take()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_everything() {
        let config = RunConfig::from_selection(&RuleSelection::default(), None).unwrap();
        assert_eq!(config.enabled(), RuleCategory::ALL.to_vec());
        assert!(config.output().is_none());
    }

    #[test]
    fn test_only_enables_exactly_one() {
        let config =
            RunConfig::from_selection(&RuleSelection::only(RuleCategory::Shaders), None).unwrap();
        assert_eq!(config.enabled(), vec![RuleCategory::Shaders]);
    }

    #[test]
    fn test_repeated_identical_only_is_one_flag() {
        let selection = RuleSelection {
            only: vec![RuleCategory::Layers, RuleCategory::Layers],
            skip: Vec::new(),
        };
        let config = RunConfig::from_selection(&selection, None).unwrap();
        assert_eq!(config.enabled(), vec![RuleCategory::Layers]);
    }

    #[test]
    fn test_multiple_only_rejected() {
        let selection = RuleSelection {
            only: vec![RuleCategory::Geometry, RuleCategory::Shaders],
            skip: Vec::new(),
        };
        assert!(matches!(
            RunConfig::from_selection(&selection, None),
            Err(StrataError::MultipleOnlyFlags)
        ));
    }

    #[test]
    fn test_only_with_skip_rejected() {
        let selection = RuleSelection {
            only: vec![RuleCategory::Geometry],
            skip: vec![RuleCategory::Shaders],
        };
        assert!(matches!(
            RunConfig::from_selection(&selection, None),
            Err(StrataError::OnlyWithSkip)
        ));
    }

    #[test]
    fn test_skip_all_rejected() {
        let selection = RuleSelection::skip(RuleCategory::ALL);
        let err = RunConfig::from_selection(&selection, None).unwrap_err();
        assert!(matches!(err, StrataError::AllRulesDisabled));
        assert!(err.to_string().contains("Cannot skip all"));
    }

    #[test]
    fn test_skip_variants_disables_only_variants() {
        let selection = RuleSelection::skip([RuleCategory::Variants]);
        let config = RunConfig::from_selection(&selection, None).unwrap();
        assert!(config.is_enabled(RuleCategory::Layers));
        assert!(!config.is_enabled(RuleCategory::Variants));
        assert_eq!(config.enabled().len(), 3);
    }

    #[test]
    fn test_parse_category() {
        assert_eq!("Geometry".parse::<RuleCategory>().unwrap(), RuleCategory::Geometry);
        assert_eq!("shader".parse::<RuleCategory>().unwrap(), RuleCategory::Shaders);
        assert!(matches!(
            "lighting".parse::<RuleCategory>(),
            Err(StrataError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_output_is_carried() {
        let config = RunConfig::from_selection(
            &RuleSelection::default(),
            Some(PathBuf::from("report.txt")),
        )
        .unwrap();
        assert_eq!(config.output(), Some(Path::new("report.txt")));
    }
}
