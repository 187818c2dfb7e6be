//! Strata CLI - Validate layered scene files from the command line

mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use commands::validate;
use std::path::PathBuf;
use strata_core::StrataError;
use strata_validate::RuleCategory;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(
    about = "Validate a layered scene file against geometry, shader, layer and variant rules",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to the scene file
    scene: PathBuf,

    /// Run only this rule category (geometry, shaders, layers, variants)
    #[arg(long, value_name = "CATEGORY", value_parser = parse_category)]
    only: Vec<RuleCategory>,

    /// Skip a rule category; may be given more than once
    #[arg(long, value_name = "CATEGORY", value_parser = parse_category)]
    skip: Vec<RuleCategory>,

    /// Also write the report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML file providing a default rule selection and output path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text", value_parser = parse_format)]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn parse_category(s: &str) -> Result<RuleCategory, String> {
    s.parse().map_err(|_| {
        format!(
            "unknown rule category '{}'; valid values: geometry, shaders, layers, variants",
            s
        )
    })
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn init_tracing(verbose: bool, debug: bool) {
    let level = if debug {
        "trace"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.debug);

    let result = validate::run(validate::ValidateArgs {
        scene: cli.scene,
        only: cli.only,
        skip: cli.skip,
        output: cli.output,
        config: cli.config,
        format: cli.format,
    });

    if let Err(err) = &result {
        if let Some(strata_err) = err.downcast_ref::<StrataError>() {
            if strata_err.is_config_error() {
                eprintln!("Error: {}\n", strata_err);
                eprintln!("{}", Cli::command().render_help());
                std::process::exit(1);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_repeated_flags() {
        let cli = Cli::try_parse_from([
            "strata",
            "scene.toml",
            "--skip",
            "geometry",
            "--skip",
            "variants",
            "-o",
            "report.txt",
        ])
        .unwrap();
        assert_eq!(cli.scene, PathBuf::from("scene.toml"));
        assert!(cli.only.is_empty());
        assert_eq!(cli.skip, vec![RuleCategory::Geometry, RuleCategory::Variants]);
        assert_eq!(cli.output, Some(PathBuf::from("report.txt")));
        assert_eq!(cli.format, "text");
    }

    #[test]
    fn test_scene_is_required() {
        assert!(Cli::try_parse_from(["strata"]).is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert!(Cli::try_parse_from(["strata", "scene.toml", "--only", "lighting"]).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["strata", "scene.toml", "--format", "xml"]).is_err());
    }
}
