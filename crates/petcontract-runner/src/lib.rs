//! petcontract-runner: drives the pet API and checks what comes back
//!
//! Everything that performs I/O lives here: the request client, cleanup, and
//! the scenario groups built on the catalog from `petcontract-core`.

pub mod api;
pub mod checks;
pub mod cleanup;
pub mod client;
pub mod harness;
pub mod registry;
pub mod scenario;
pub mod suites;

pub use api::PetApi;
pub use checks::{CheckResult, verify, verify_each};
pub use cleanup::{CleanupOutcome, NOT_FOUND_MESSAGE, cleanup};
pub use client::{HttpClient, Request, Response, Transport, TransportError};
pub use harness::{ContractRunner, RunnerError};
pub use registry::CreatedResourceRegistry;
pub use scenario::{ScenarioContext, ScenarioError, ScenarioGroup, run_group};
