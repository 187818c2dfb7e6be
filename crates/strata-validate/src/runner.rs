//! Rule runner
//!
//! Executes the enabled rules of a registry against one stage, in
//! registration order, and notifies an observer as each rule completes.
//! A panicking rule is caught and recorded as a failed outcome so the
//! remaining rules still run.

use crate::registry::{Rule, RuleRegistry};
use crate::report::{RuleOutcome, RunReport};
use crate::selection::RunConfig;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use strata_stage::Stage;

/// Receives each outcome as soon as its rule finishes
pub trait RuleObserver {
    fn rule_completed(&mut self, outcome: &RuleOutcome);
}

impl<F> RuleObserver for F
where
    F: FnMut(&RuleOutcome),
{
    fn rule_completed(&mut self, outcome: &RuleOutcome) {
        self(outcome)
    }
}

pub struct RuleRunner<'a> {
    registry: &'a RuleRegistry,
}

impl<'a> RuleRunner<'a> {
    pub fn new(registry: &'a RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn execute(
        &self,
        stage: &mut dyn Stage,
        config: &RunConfig,
        observer: &mut dyn RuleObserver,
    ) -> RunReport {
        let mut report = RunReport::new();

        for registered in self.registry.all() {
            let name = registered.rule.name();
            if !config.is_enabled(registered.category) {
                tracing::debug!(rule = name, category = %registered.category, "skipped");
                continue;
            }

            let started = Instant::now();
            let outcome = run_isolated(registered.rule.as_ref(), stage);
            tracing::debug!(
                rule = name,
                passed = outcome.passed,
                violations = outcome.violations.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "rule completed"
            );

            observer.rule_completed(&outcome);
            report.outcomes.push(outcome);
        }

        report
    }
}

fn run_isolated(rule: &dyn Rule, stage: &mut dyn Stage) -> RuleOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| rule.check(stage))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::error!(rule = rule.name(), %reason, "rule panicked");
            RuleOutcome::fail_with_message(
                rule.name(),
                format!("Rule aborted unexpectedly: {}", reason),
            )
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
