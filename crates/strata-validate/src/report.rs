//! Rule outcomes and run summaries

/// The result of running one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub name: String,
    pub passed: bool,
    /// Rendered message; for failures, a header followed by `- ` bullets
    pub message: String,
    pub violations: Vec<String>,
}

impl RuleOutcome {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// A failure listing each violation under `header`
    pub fn fail(name: impl Into<String>, header: &str, violations: Vec<String>) -> Self {
        let mut message = header.to_string();
        for violation in &violations {
            message.push_str("\n- ");
            message.push_str(violation);
        }
        Self {
            name: name.into(),
            passed: false,
            message,
            violations,
        }
    }

    /// A failure that stops before any per-item checks
    pub fn fail_with_message(name: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            name: name.into(),
            passed: false,
            violations: vec![message.clone()],
            message,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.passed {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

/// Overall shape of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    AllPassed,
    AllFailed,
    Mixed,
}

impl Verdict {
    pub fn closing_statement(&self) -> &'static str {
        match self {
            Verdict::AllPassed => "Congratulations, all rules passed!",
            Verdict::AllFailed => {
                "All rules failed. The scene file may have serious issues. Please review it thoroughly."
            }
            Verdict::Mixed => {
                "Some rules failed. Please review the scene file and address the failing rules."
            }
        }
    }
}

/// Outcomes of one run, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<RuleOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn verdict(&self) -> Verdict {
        if self.failed_count() == 0 {
            Verdict::AllPassed
        } else if self.passed_count() == 0 {
            Verdict::AllFailed
        } else {
            Verdict::Mixed
        }
    }
}
