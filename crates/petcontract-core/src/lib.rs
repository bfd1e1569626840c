//! petcontract-core: configuration, test data, and contract types
//!
//! Everything here is pure data and logic; the only I/O is reading
//! environment documents from the config directory.

pub mod catalog;
pub mod config;
pub mod contract;
pub mod ids;
pub mod method;
pub mod payload;
pub mod plan;
pub mod verdict;

pub use catalog::{
    ClassMember, EquivalenceClass, FieldValue, InvalidityKind, NegativeCase, TestDataCatalog,
};
pub use config::{ConfigError, ConfigResolver, DEFAULT_ENVIRONMENT, EnvironmentConfig, PET_ROUTE};
pub use contract::{ExpectedContract, HeaderExpectation, MatchMode, PayloadVariant, Violation};
pub use ids::IdSource;
pub use method::HttpMethod;
pub use payload::{Pet, PetStatus, validate_pet};
pub use plan::{GroupPlan, RunPlan};
pub use verdict::{
    AssertionRecord, CleanupFailure, CleanupStage, FailureClass, GroupReport, Phase, RunReport,
    Verdict, VerdictStatus,
};
