//! Verdict module - failure classes, scenario reports, and the run verdict

mod class;
mod report;

pub use class::FailureClass;
pub use report::{
    AssertionRecord, CleanupFailure, CleanupStage, GroupReport, Phase, RunReport, Verdict,
    VerdictStatus, generate_schema,
};
