//! Built-in validation rules

mod geometry;
mod layers;
mod shaders;
mod variants;

pub use geometry::GeometryRule;
pub use layers::LayerStructureRule;
pub use shaders::ShaderRule;
pub use variants::VariantRule;

use crate::report::RuleOutcome;

/// Fixed wording of one rule's outcomes
pub(crate) struct RuleText {
    pub name: &'static str,
    /// Passing message when nothing relevant was found
    pub absent: &'static str,
    pub failed_header: &'static str,
    pub all_valid: &'static str,
}

/// Violations collected while a rule walks the stage
#[derive(Debug, Default)]
pub(crate) struct Findings {
    subject_found: bool,
    violations: Vec<String>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark that at least one prim the rule cares about exists
    pub fn subject_found(&mut self) {
        self.subject_found = true;
    }

    pub fn push(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }

    /// Violations take precedence over the "nothing found" message
    pub fn into_outcome(self, text: &RuleText) -> RuleOutcome {
        if !self.violations.is_empty() {
            RuleOutcome::fail(text.name, text.failed_header, self.violations)
        } else if !self.subject_found {
            RuleOutcome::pass(text.name, text.absent)
        } else {
            RuleOutcome::pass(text.name, text.all_valid)
        }
    }
}
