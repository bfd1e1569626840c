//! Scenario and run reports
//!
//! One `AssertionRecord` per independent assertion, cleanup failures kept
//! apart from them, and a verdict derived from the worst failure class.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::FailureClass;
use crate::contract::Violation;

/// Lifecycle of a scenario group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Setup,
    Execute,
    Assert,
    Teardown,
    Done,
}

impl Phase {
    /// The phase that follows this one; `Done` is terminal.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Init => Self::Setup,
            Self::Setup => Self::Execute,
            Self::Execute => Self::Assert,
            Self::Assert => Self::Teardown,
            Self::Teardown | Self::Done => Self::Done,
        }
    }
}

/// Outcome of one independent assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssertionRecord {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl AssertionRecord {
    pub fn new(name: impl Into<String>, result: Result<(), Vec<Violation>>) -> Self {
        let violations = result.err().unwrap_or_default();
        Self {
            name: name.into(),
            passed: violations.is_empty(),
            violations,
        }
    }
}

/// Which cleanup call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStage {
    Delete,
    Verify,
}

/// Cleanup of one id did not complete as required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CleanupFailure {
    pub id: u64,
    pub stage: CleanupStage,
    pub violations: Vec<Violation>,
}

/// Everything one scenario group produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupReport {
    pub name: String,
    pub assertions: Vec<AssertionRecord>,
    /// Ids deleted and verified gone
    #[serde(default)]
    pub cleaned: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleanup_failures: Vec<CleanupFailure>,
    /// Phase and transport error that stopped the group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<(Phase, String)>,
    /// Ids still registered when the group aborted; not deleted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreleased: Vec<u64>,
    pub final_phase: Phase,
    pub duration_ms: u64,
}

impl GroupReport {
    pub fn failed_assertions(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.assertions.iter().filter(|a| !a.passed)
    }

    /// Worst failure class of this group, `None` if it passed.
    #[must_use]
    pub fn failure_class(&self) -> Option<FailureClass> {
        if self.aborted.is_some() {
            Some(FailureClass::Aborted)
        } else if !self.cleanup_failures.is_empty() {
            Some(FailureClass::CleanupFailure)
        } else if self.failed_assertions().next().is_some() {
            Some(FailureClass::ContractViolation)
        } else {
            None
        }
    }
}

/// All groups of one run against one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub environment: String,
    pub base_url: String,
    pub groups: Vec<GroupReport>,
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

impl RunReport {
    pub fn assertion_count(&self) -> usize {
        self.groups.iter().map(|g| g.assertions.len()).sum()
    }

    pub fn failed_assertion_count(&self) -> usize {
        self.groups.iter().map(|g| g.failed_assertions().count()).sum()
    }

    pub fn cleanup_failure_count(&self) -> usize {
        self.groups.iter().map(|g| g.cleanup_failures.len()).sum()
    }

    /// PASS iff every group passed; exit code of the worst class otherwise.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        let worst = self.groups.iter().filter_map(GroupReport::failure_class).max();

        let Some(worst) = worst else {
            let reason = if self.groups.is_empty() {
                "No scenario groups ran".to_string()
            } else {
                format!("All {} assertions passed", self.assertion_count())
            };
            return Verdict {
                status: if self.groups.is_empty() {
                    VerdictStatus::Fail
                } else {
                    VerdictStatus::Pass
                },
                exit_code: if self.groups.is_empty() { 3 } else { 0 },
                reason,
            };
        };

        let mut parts = Vec::new();
        let failed = self.failed_assertion_count();
        if failed > 0 {
            parts.push(format!(
                "{failed}/{} assertions failed",
                self.assertion_count()
            ));
        }
        let cleanup = self.cleanup_failure_count();
        if cleanup > 0 {
            parts.push(format!("{cleanup} ids not cleaned up"));
        }
        let aborted = self.groups.iter().filter(|g| g.aborted.is_some()).count();
        if aborted > 0 {
            parts.push(format!("{aborted} groups aborted"));
        }

        Verdict {
            status: VerdictStatus::Fail,
            exit_code: worst.exit_code(),
            reason: parts.join("; "),
        }
    }

    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "Environment: {} ({})\n",
            self.environment, self.base_url
        ));

        for group in &self.groups {
            let icon = match group.failure_class() {
                None => "PASS".to_string(),
                Some(class) => format!("FAIL ({class})"),
            };
            lines.push(format!("{icon}: {} [{} ms]", group.name, group.duration_ms));
            for a in &group.assertions {
                let mark = if a.passed { "ok" } else { "FAILED" };
                lines.push(format!("  [{mark}] {}", a.name));
                for v in &a.violations {
                    lines.push(format!("         {v}"));
                }
            }
            for f in &group.cleanup_failures {
                lines.push(format!("  [cleanup {:?}] id {}", f.stage, f.id));
                for v in &f.violations {
                    lines.push(format!("         {v}"));
                }
            }
            if let Some((phase, err)) = &group.aborted {
                lines.push(format!("  aborted in {phase:?}: {err}"));
                if !group.unreleased.is_empty() {
                    lines.push(format!("  unreleased ids: {:?}", group.unreleased));
                }
            }
            lines.push(String::new());
        }

        let verdict = self.verdict();
        lines.push(format!("{}: {}", verdict.status, verdict.reason));
        lines.join("\n")
    }
}

/// JSON Schema of `RunReport`, for tooling that consumes `--output json`.
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(RunReport);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
