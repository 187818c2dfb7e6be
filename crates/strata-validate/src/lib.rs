//! Strata Validate - Rule-based scene validation
//!
//! This crate holds the fixed set of validation rules (geometry, shaders,
//! layer structure, variants), the registry and runner that execute them
//! against a `Stage`, the policy deciding which rules run, and the reporter
//! that renders results.

mod config;
mod registry;
mod report;
mod reporter;
mod rules;
mod runner;
mod selection;
mod session;

pub use config::{RulesSection, ValidatorConfig};
pub use registry::{RegisteredRule, Rule, RuleRegistry};
pub use report::{RuleOutcome, RunReport, Verdict};
pub use reporter::{format_outcome, format_summary, Reporter};
pub use rules::{GeometryRule, LayerStructureRule, ShaderRule, VariantRule};
pub use runner::{RuleObserver, RuleRunner};
pub use selection::{RuleCategory, RuleSelection, RunConfig};
pub use session::{run_session, validate_scene, SessionOutcome};
