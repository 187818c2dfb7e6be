//! Variant rule
//!
//! Every candidate of every variant set is selected in turn and the prim
//! re-resolved to confirm it stays valid. Selection edits are global to the
//! stage, so each set is handled inside a [`SelectionScope`] that puts the
//! original selection back when the set is done, including on early exits
//! and unwinding.

use super::{Findings, RuleText};
use crate::registry::Rule;
use crate::report::RuleOutcome;
use strata_core::{Result, ScenePath};
use strata_stage::{Prim, Stage, VariantSet};

const TEXT: RuleText = RuleText {
    name: "Validate Variants",
    absent: "No variants found in the scene. That's acceptable.",
    failed_header: "Variant validation failed with the following issues:",
    all_valid: "All variants and their selections are valid.",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct VariantRule;

impl Rule for VariantRule {
    fn name(&self) -> &str {
        TEXT.name
    }

    fn check(&self, stage: &mut dyn Stage) -> RuleOutcome {
        let mut findings = Findings::new();

        for prim in stage.traverse_all() {
            if prim.variant_sets().is_empty() {
                continue;
            }
            findings.subject_found();

            for set in prim.variant_sets() {
                check_variant_set(stage, prim.path(), set, &mut findings);
            }
        }

        findings.into_outcome(&TEXT)
    }
}

fn check_variant_set(
    stage: &mut dyn Stage,
    path: &ScenePath,
    set: &VariantSet,
    findings: &mut Findings,
) {
    if set.name.is_empty() {
        findings.push(format!(
            "Found a variant set with an empty name at: {}",
            path
        ));
        return;
    }
    if set.variants.is_empty() {
        findings.push(format!(
            "Variant set '{}' has no variants on prim: {}",
            set.name, path
        ));
        return;
    }

    let mut scope = SelectionScope::enter(stage, path, &set.name);

    for variant in &set.variants {
        if variant.is_empty() {
            findings.push(format!(
                "Empty variant name in set '{}' at: {}",
                set.name, path
            ));
            continue;
        }

        if let Err(e) = scope.select(variant) {
            tracing::debug!(prim = %path, set = %set.name, variant = %variant, "selection refused: {}", e);
            findings.push(format!(
                "Failed to set variant '{}' in set '{}' at: {}",
                variant, set.name, path
            ));
            continue;
        }

        if !scope.resolve().is_some_and(|p| p.is_valid()) {
            findings.push(format!(
                "Prim became invalid after setting variant '{}' in set '{}' at: {}",
                variant, set.name, path
            ));
        }
    }

    let original = scope.original().to_string();
    if let Err(e) = scope.restore() {
        tracing::warn!(prim = %path, set = %set.name, "could not restore selection: {}", e);
        findings.push(format!(
            "Failed to restore selection '{}' in set '{}' at: {}",
            original, set.name, path
        ));
    }
}

/// Exclusive hold on one variant set's selection.
///
/// `restore` puts the original selection back: a selection previously
/// made through the stage is re-applied, otherwise the override is cleared
/// so the authored selection shows through again, even one naming a
/// variant that does not exist. If the scope is dropped without
/// `restore`, the drop does it.
pub(crate) struct SelectionScope<'s> {
    stage: &'s mut dyn Stage,
    prim: ScenePath,
    set: String,
    original: String,
    session: Option<String>,
    restored: bool,
}

impl<'s> SelectionScope<'s> {
    pub fn enter(stage: &'s mut dyn Stage, prim: &ScenePath, set: &str) -> Self {
        let original = stage.variant_selection(prim, set);
        let session = stage.session_variant_selection(prim, set);
        Self {
            stage,
            prim: prim.clone(),
            set: set.to_string(),
            original,
            session,
            restored: false,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn select(&mut self, variant: &str) -> Result<()> {
        self.stage
            .set_variant_selection(&self.prim, &self.set, variant)
    }

    /// Re-resolve the prim under the current selection
    pub fn resolve(&self) -> Option<Prim> {
        self.stage.prim_at_path(&self.prim)
    }

    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.apply_original()
    }

    fn apply_original(&mut self) -> Result<()> {
        match self.session.clone() {
            Some(variant) => self
                .stage
                .set_variant_selection(&self.prim, &self.set, &variant),
            None => self.stage.clear_variant_selection(&self.prim, &self.set),
        }
    }
}

impl Drop for SelectionScope<'_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.apply_original() {
            tracing::warn!(prim = %self.prim, set = %self.set, "could not restore selection: {}", e);
        }
    }
}
