//! Scene validation command

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use strata_validate::{
    validate_scene, RuleCategory, RuleRegistry, RuleSelection, RunConfig, RunReport,
    ValidatorConfig,
};

pub struct ValidateArgs {
    pub scene: PathBuf,
    pub only: Vec<RuleCategory>,
    pub skip: Vec<RuleCategory>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub format: String,
}

/// Resolve the rule selection without touching the scene
pub fn resolve_config(args: &ValidateArgs) -> Result<RunConfig> {
    let file_config = match &args.config {
        Some(path) => ValidatorConfig::load(path)?,
        None => ValidatorConfig::default(),
    };
    let selection = RuleSelection {
        only: args.only.clone(),
        skip: args.skip.clone(),
    };
    Ok(file_config.resolve(&selection, args.output.clone())?)
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let mut config = resolve_config(&args)?;
    tracing::debug!(enabled = ?config.enabled(), output = ?config.output(), "resolved rule selection");
    let registry = RuleRegistry::with_builtin_rules();

    if args.format == "json" {
        let output = config.take_output();
        let outcome = validate_scene(&args.scene, &config, &registry, io::sink())?;
        let rendered = serde_json::to_string_pretty(&report_json(&outcome.report))?;
        println!("{}", rendered);

        if let Some(path) = output {
            match fs::write(&path, format!("{}\n", rendered)) {
                Ok(()) => eprintln!("Results exported to: {}", path.display()),
                Err(e) => eprintln!("Error: could not write output file {}: {}", path.display(), e),
            }
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let outcome = validate_scene(&args.scene, &config, &registry, stdout.lock())?;
    if let Some(err) = outcome.export_error {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

fn report_json(report: &RunReport) -> serde_json::Value {
    let rules: Vec<serde_json::Value> = report
        .outcomes
        .iter()
        .map(|o| {
            serde_json::json!({
                "name": o.name,
                "passed": o.passed,
                "message": o.message,
                "violations": o.violations,
            })
        })
        .collect();

    serde_json::json!({
        "passed": report.passed_count(),
        "failed": report.failed_count(),
        "verdict": report.verdict().closing_statement(),
        "rules": rules,
    })
}
