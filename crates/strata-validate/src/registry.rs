//! Rule trait and the run-scoped rule registry

use crate::report::RuleOutcome;
use crate::rules;
use crate::selection::RuleCategory;
use std::fmt;
use strata_stage::Stage;

/// A validation rule.
///
/// Rules receive the stage mutably because some of them (variants) switch
/// selections while inspecting; every rule must leave the stage as it
/// found it.
pub trait Rule {
    fn name(&self) -> &str;

    fn check(&self, stage: &mut dyn Stage) -> RuleOutcome;
}

struct FnRule<F> {
    name: String,
    check: F,
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&mut dyn Stage) -> RuleOutcome,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, stage: &mut dyn Stage) -> RuleOutcome {
        (self.check)(stage)
    }
}

/// A rule together with the category that enables it
pub struct RegisteredRule {
    pub category: RuleCategory,
    pub rule: Box<dyn Rule>,
}

/// Ordered set of rules for one run
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<RegisteredRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in rules in their fixed order:
    /// geometry, shaders, layers, variants
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        registry.register(RuleCategory::Geometry, rules::GeometryRule);
        registry.register(RuleCategory::Shaders, rules::ShaderRule);
        registry.register(RuleCategory::Layers, rules::LayerStructureRule);
        registry.register(RuleCategory::Variants, rules::VariantRule);
        registry
    }

    pub fn register(&mut self, category: RuleCategory, rule: impl Rule + 'static) {
        self.rules.push(RegisteredRule {
            category,
            rule: Box::new(rule),
        });
    }

    /// Register a closure as a rule
    pub fn register_fn<F>(&mut self, category: RuleCategory, name: impl Into<String>, check: F)
    where
        F: Fn(&mut dyn Stage) -> RuleOutcome + 'static,
    {
        self.register(
            category,
            FnRule {
                name: name.into(),
                check,
            },
        );
    }

    /// Rules in registration order
    pub fn all(&self) -> &[RegisteredRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.rules
                    .iter()
                    .map(|r| (r.category, r.rule.name().to_string())),
            )
            .finish()
    }
}
