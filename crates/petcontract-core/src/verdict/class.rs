//! Failure classes of a contract run
//!
//! The class decides the exit code, so "API behavior wrong" and "API left
//! dirty" stay distinguishable in CI.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What kind of failure a scenario group produced, ordered by gravity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Response did not match the contract (exit 1)
    ContractViolation,
    /// Created resource could not be removed or still resolves (exit 2)
    CleanupFailure,
    /// Transport failed; state of the API is unknown (exit 3)
    Aborted,
}

impl FailureClass {
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ContractViolation => 1,
            Self::CleanupFailure => 2,
            Self::Aborted => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContractViolation => "contract violation",
            Self::CleanupFailure => "cleanup failure",
            Self::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
