//! One validation session: open, run, summarize, export

use crate::registry::RuleRegistry;
use crate::report::RunReport;
use crate::reporter::Reporter;
use crate::runner::RuleRunner;
use crate::selection::RunConfig;
use std::io::Write;
use std::path::{Path, PathBuf};
use strata_core::{Result, StrataError};
use strata_stage::{MemoryStage, Stage};

/// What a completed session produced
#[derive(Debug)]
pub struct SessionOutcome {
    pub report: RunReport,
    /// Rendered report text, identical to the console output
    pub transcript: String,
    /// Where the transcript was exported, if requested and written
    pub exported: Option<PathBuf>,
    /// Export failure; the run itself still completed
    pub export_error: Option<StrataError>,
}

/// Run the enabled rules against an already-open stage, rendering as each
/// rule completes
pub fn run_session<W: Write>(
    stage: &mut dyn Stage,
    config: &RunConfig,
    registry: &RuleRegistry,
    reporter: &mut Reporter<W>,
) -> RunReport {
    reporter.stage_opened();
    let report = RuleRunner::new(registry).execute(stage, config, reporter);
    reporter.summary(&report);
    report
}

/// Open `scene` and validate it.
///
/// Failing to open the scene is the only error: no rule runs and nothing
/// is rendered. Export problems are recorded in the outcome instead.
pub fn validate_scene<W: Write>(
    scene: &Path,
    config: &RunConfig,
    registry: &RuleRegistry,
    console: W,
) -> Result<SessionOutcome> {
    let mut stage = MemoryStage::open(scene)?;
    tracing::info!(scene = %scene.display(), "validating");

    let mut reporter = Reporter::new(console);
    let report = run_session(&mut stage, config, registry, &mut reporter);

    let mut exported = None;
    let mut export_error = None;
    if let Some(path) = config.output() {
        match reporter.export(path) {
            Ok(()) => {
                reporter.note(&format!("Results exported to: {}", path.display()));
                exported = Some(path.to_path_buf());
            }
            Err(e) => export_error = Some(e),
        }
    }

    Ok(SessionOutcome {
        report,
        transcript: reporter.transcript().to_string(),
        exported,
        export_error,
    })
}
