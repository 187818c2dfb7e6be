//! Console rendering and report export

use crate::report::{RuleOutcome, RunReport};
use crate::runner::RuleObserver;
use std::fs;
use std::io::Write;
use std::path::Path;
use strata_core::{Result, StrataError};

pub const STAGE_OPENED: &str = "Opened scene file successfully.";

/// Render one rule line, e.g. `[PASS] Validate Shaders: ...`
pub fn format_outcome(outcome: &RuleOutcome) -> String {
    format!(
        "[{}] {}: {}\n",
        outcome.status_label(),
        outcome.name,
        outcome.message
    )
}

/// Render the summary block and closing sentence
pub fn format_summary(report: &RunReport) -> String {
    format!(
        "\nSummary:\n  Passed: {}\n  Failed: {}\n\n{}\n",
        report.passed_count(),
        report.failed_count(),
        report.verdict().closing_statement()
    )
}

/// Writes report text to a console sink and keeps a transcript of
/// everything written, for export
pub struct Reporter<W: Write> {
    console: W,
    transcript: String,
}

impl<W: Write> Reporter<W> {
    pub fn new(console: W) -> Self {
        Self {
            console,
            transcript: String::new(),
        }
    }

    pub fn stage_opened(&mut self) {
        self.emit(&format!("{}\n\n", STAGE_OPENED));
    }

    pub fn outcome(&mut self, outcome: &RuleOutcome) {
        self.emit(&format_outcome(outcome));
    }

    pub fn summary(&mut self, report: &RunReport) {
        self.emit(&format_summary(report));
    }

    /// Console-only line, not part of the exported transcript
    pub fn note(&mut self, text: &str) {
        self.write_console(&format!("{}\n", text));
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Write the transcript to `path`, replacing any existing file
    pub fn export(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.transcript).map_err(|source| StrataError::ExportFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_inner(self) -> W {
        self.console
    }

    fn emit(&mut self, text: &str) {
        self.transcript.push_str(text);
        self.write_console(text);
    }

    fn write_console(&mut self, text: &str) {
        if let Err(e) = self
            .console
            .write_all(text.as_bytes())
            .and_then(|_| self.console.flush())
        {
            tracing::warn!("failed to write report to console: {}", e);
        }
    }
}

impl<W: Write> RuleObserver for Reporter<W> {
    fn rule_completed(&mut self, outcome: &RuleOutcome) {
        self.outcome(outcome);
    }
}
