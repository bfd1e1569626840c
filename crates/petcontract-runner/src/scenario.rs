//! Scenario groups and the phase machine that drives them
//!
//! A group runs `Setup → Execute → Assert` and always reaches `Teardown`.
//! Every response passes through the group's registry before the group sees
//! it, so an id is tracked even if the assertions on it never run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use petcontract_core::{
    AssertionRecord, ExpectedContract, GroupPlan, GroupReport, HttpMethod, Phase,
    TestDataCatalog, Violation,
};
use serde_json::Value;

use crate::api::PetApi;
use crate::checks::{CheckResult, verify, verify_each};
use crate::cleanup::cleanup;
use crate::client::{Response, TransportError};
use crate::registry::CreatedResourceRegistry;

/// Why a group stopped before its assertions finished.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Outcome of the last request unknown; cleanup is unsafe.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A setup step did not produce what later phases need; already recorded
    /// as a failed assertion.
    #[error("precondition failed: {0}")]
    Precondition(String),
}

/// Per-group state handed to every phase.
pub struct ScenarioContext<'a> {
    api: &'a PetApi<'a>,
    catalog: &'a TestDataCatalog,
    registry: CreatedResourceRegistry,
    assertions: Vec<AssertionRecord>,
}

impl<'a> ScenarioContext<'a> {
    pub fn new(api: &'a PetApi<'a>, catalog: &'a TestDataCatalog) -> Self {
        Self {
            api,
            catalog,
            registry: CreatedResourceRegistry::new(),
            assertions: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &TestDataCatalog {
        self.catalog
    }

    pub fn assertions(&self) -> &[AssertionRecord] {
        &self.assertions
    }

    fn tracked(
        &mut self,
        result: Result<Response, TransportError>,
    ) -> Result<Response, ScenarioError> {
        let response = result?;
        self.registry.capture(&response);
        Ok(response)
    }

    /// `POST` a body; any id in the response is tracked.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Transport` if no response was observed.
    pub fn create(&mut self, body: &Value) -> Result<Response, ScenarioError> {
        let result = self.api.create(body);
        self.tracked(result)
    }

    /// `PUT` a body; any id in the response is tracked.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Transport` if no response was observed.
    pub fn update(&mut self, body: &Value) -> Result<Response, ScenarioError> {
        let result = self.api.update(body);
        self.tracked(result)
    }

    /// # Errors
    ///
    /// Returns `ScenarioError::Transport` if no response was observed.
    pub fn fetch(&mut self, id: u64) -> Result<Response, ScenarioError> {
        Ok(self.api.fetch(id)?)
    }

    /// Arbitrary verb and headers against the collection; ids are tracked.
    ///
    /// `headers: None` sends the standard mutating headers.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Transport` if no response was observed.
    pub fn send_to_collection(
        &mut self,
        method: HttpMethod,
        headers: Option<Vec<(String, String)>>,
        body: &Value,
    ) -> Result<Response, ScenarioError> {
        let headers = headers.unwrap_or_else(|| self.api.json_headers());
        let result = self.api.send_to_collection(method, headers, Some(body));
        self.tracked(result)
    }

    /// Record one assertion.
    pub fn assert(&mut self, name: impl Into<String>, result: CheckResult) -> bool {
        let record = AssertionRecord::new(name, result);
        if !record.passed {
            tracing::info!(
                assertion = %record.name,
                violations = record.violations.len(),
                "assertion failed"
            );
        }
        let passed = record.passed;
        self.assertions.push(record);
        passed
    }

    /// Verify `response` as a single assertion.
    pub fn check(&mut self, name: &str, response: &Response, contract: &ExpectedContract) -> bool {
        self.assert(name, verify(response, contract))
    }

    /// Verify `response`, recording each check as its own assertion.
    pub fn check_each(
        &mut self,
        name: &str,
        response: &Response,
        contract: &ExpectedContract,
    ) -> bool {
        let mut all = true;
        for (check, result) in verify_each(response, contract) {
            all &= self.assert(format!("{name} [{check}]"), result);
        }
        all
    }

    /// Like `check`, but a failure stops the group.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Precondition` if the response does not satisfy
    /// `contract`.
    pub fn require(
        &mut self,
        name: &str,
        response: &Response,
        contract: &ExpectedContract,
    ) -> Result<(), ScenarioError> {
        if self.check(name, response, contract) {
            Ok(())
        } else {
            Err(ScenarioError::Precondition(name.to_string()))
        }
    }

    /// The id a successful create returned.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Precondition` if the response has no usable id.
    pub fn require_id(&mut self, name: &str, response: &Response) -> Result<u64, ScenarioError> {
        match response.resource_id() {
            Some(id) => Ok(id),
            None => {
                let actual = response
                    .field("id")
                    .map_or_else(|| "missing".to_string(), Value::to_string);
                self.assert(
                    name,
                    Err(vec![Violation::new("id", "positive integer", actual)]),
                );
                Err(ScenarioError::Precondition(name.to_string()))
            }
        }
    }
}

/// One described test unit sharing a registry.
///
/// Phases communicate through `self`; the context carries only the shared
/// machinery.
pub trait ScenarioGroup {
    fn name(&self) -> &str;

    /// Requests and cases this group would issue, without sending anything.
    fn plan(&self) -> GroupPlan;

    /// # Errors
    ///
    /// Returns error if a precondition could not be established.
    fn setup(&mut self, _ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Returns error if a request could not be completed.
    fn execute(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError>;

    /// # Errors
    ///
    /// Returns error if a follow-up request could not be completed.
    fn assert(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError>;
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Drive `group` through every phase and clean up after it.
///
/// Teardown runs on every path. After a transport error the registered ids
/// are reported as unreleased instead of being deleted.
pub fn run_group(
    group: &mut dyn ScenarioGroup,
    api: &PetApi<'_>,
    catalog: &TestDataCatalog,
) -> GroupReport {
    let start = Instant::now();
    let name = group.name().to_string();
    let mut ctx = ScenarioContext::new(api, catalog);
    let mut aborted: Option<(Phase, String)> = None;

    tracing::info!(group = %name, "starting");

    let mut phase = Phase::Init;
    loop {
        phase = phase.next();
        let step = match phase {
            Phase::Setup => catch_unwind(AssertUnwindSafe(|| group.setup(&mut ctx))),
            Phase::Execute => catch_unwind(AssertUnwindSafe(|| group.execute(&mut ctx))),
            Phase::Assert => catch_unwind(AssertUnwindSafe(|| group.assert(&mut ctx))),
            Phase::Init | Phase::Teardown | Phase::Done => break,
        };
        match step {
            Ok(Ok(())) => {}
            Ok(Err(ScenarioError::Transport(e))) => {
                tracing::warn!(group = %name, ?phase, error = %e, "aborted");
                aborted = Some((phase, e.to_string()));
                break;
            }
            Ok(Err(ScenarioError::Precondition(step))) => {
                tracing::warn!(
                    group = %name,
                    ?phase,
                    %step,
                    "precondition failed, skipping to teardown"
                );
                break;
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(group = %name, ?phase, %message, "panicked");
                ctx.assert(
                    format!("{phase:?} completed"),
                    Err(vec![Violation::new("panic", "no panic", message)]),
                );
                break;
            }
        }
    }

    tracing::debug!(group = %name, tracked = ctx.registry.len(), "teardown");
    let ids = ctx.registry.drain();
    let (cleaned, cleanup_failures, unreleased) = if aborted.is_some() {
        if !ids.is_empty() {
            tracing::warn!(group = %name, ?ids, "ids left unreleased");
        }
        (Vec::new(), Vec::new(), ids)
    } else {
        let outcome = cleanup(api, &ids);
        (outcome.cleaned, outcome.failures, Vec::new())
    };

    let report = GroupReport {
        name,
        assertions: ctx.assertions,
        cleaned,
        cleanup_failures,
        aborted,
        unreleased,
        final_phase: Phase::Done,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    tracing::info!(
        group = %report.name,
        passed = report.failure_class().is_none(),
        duration_ms = report.duration_ms,
        "finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::NOT_FOUND_MESSAGE;
    use crate::client::testing::ScriptedTransport;
    use petcontract_core::{CleanupStage, FailureClass};
    use serde_json::json;

    /// Creates one pet in setup, then does whatever `step` says in execute.
    struct ScriptedGroup {
        step: Step,
    }

    impl ScenarioGroup for ScriptedGroup {
        fn name(&self) -> &str {
            "scripted"
        }

        fn plan(&self) -> GroupPlan {
            GroupPlan {
                name: "scripted".into(),
                requests: 2,
                max_cleanup_ids: 1,
                cases: vec![],
            }
        }

        fn setup(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
            let resp = ctx.create(&TestDataCatalog::required_body())?;
            ctx.require("setup create", &resp, &ExpectedContract::ok())
        }

        fn execute(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
            (self.step)(ctx)
        }

        fn assert(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
            ctx.assert("asserted", Ok(()));
            Ok(())
        }
    }

    fn not_found() -> Value {
        json!({"code": 1, "type": "error", "message": NOT_FOUND_MESSAGE})
    }

    type Step = fn(&mut ScenarioContext<'_>) -> Result<(), ScenarioError>;

    fn run(transport: &ScriptedTransport, step: Step) -> GroupReport {
        let api = PetApi::new(transport, "http://api.test/pet", "k");
        let catalog = TestDataCatalog::default();
        run_group(&mut ScriptedGroup { step }, &api, &catalog)
    }

    #[test]
    fn passing_group_cleans_up() {
        let transport = ScriptedTransport::default()
            .reply(200, json!({"id": 11, "name": "doggie", "photoUrls": []}))
            .reply(200, json!({"code": 200}))
            .reply(404, not_found());
        let report = run(&transport, |_| Ok(()));

        assert_eq!(report.final_phase, Phase::Done);
        assert_eq!(report.cleaned, vec![11]);
        assert!(report.failure_class().is_none());
        let names: Vec<&str> = report.assertions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["setup create", "asserted"]);
    }

    #[test]
    fn failed_precondition_still_tears_down() {
        // 400 with an id: nominally failed, still tracked
        let transport = ScriptedTransport::default()
            .reply(400, json!({"id": 12}))
            .reply(200, json!({"code": 200}))
            .reply(404, not_found());
        let report = run(&transport, |_| panic!("execute must not run"));

        assert_eq!(report.cleaned, vec![12]);
        assert_eq!(report.failure_class(), Some(FailureClass::ContractViolation));
        assert_eq!(report.assertions.len(), 1);
        assert!(report.aborted.is_none());
    }

    #[test]
    fn transport_error_leaves_ids_unreleased() {
        let transport = ScriptedTransport::default()
            .reply(200, json!({"id": 13}))
            .fail("connection refused");
        let report = run(&transport, |ctx| {
            ctx.update(&TestDataCatalog::update_body(13))?;
            Ok(())
        });

        let (phase, error) = report.aborted.clone().unwrap();
        assert_eq!(phase, Phase::Execute);
        assert!(error.contains("connection refused"));
        assert_eq!(report.unreleased, vec![13]);
        assert!(report.cleaned.is_empty());
        assert_eq!(report.failure_class(), Some(FailureClass::Aborted));
        // No delete was attempted after the abort
        assert_eq!(transport.sent().len(), 2);
    }

    #[test]
    fn panic_is_recorded_and_cleanup_runs() {
        let transport = ScriptedTransport::default()
            .reply(200, json!({"id": 14}))
            .reply(200, json!({"code": 200}))
            .reply(404, not_found());
        let report = run(&transport, |_| panic!("boom"));

        let panicked = report.assertions.iter().find(|a| !a.passed).unwrap();
        assert_eq!(panicked.name, "Execute completed");
        assert_eq!(panicked.violations[0].actual, "boom");
        assert_eq!(report.cleaned, vec![14]);
    }

    #[test]
    fn cleanup_failure_reported_separately() {
        let transport = ScriptedTransport::default()
            .reply(200, json!({"id": 15}))
            .reply(500, json!({"code": 500}));
        let report = run(&transport, |_| Ok(()));

        assert_eq!(report.cleanup_failures.len(), 1);
        assert_eq!(report.cleanup_failures[0].stage, CleanupStage::Delete);
        assert!(report.failed_assertions().next().is_none());
        assert_eq!(report.failure_class(), Some(FailureClass::CleanupFailure));
    }

    #[test]
    fn check_each_records_per_check() {
        let transport = ScriptedTransport::default();
        let api = PetApi::new(&transport, "http://api.test/pet", "k");
        let catalog = TestDataCatalog::default();
        let mut ctx = ScenarioContext::new(&api, &catalog);

        let resp = crate::client::testing::response(400, json!({"code": 400}));
        assert!(!ctx.check_each("create", &resp, &ExpectedContract::status(200)));
        let names: Vec<&str> = ctx.assertions().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["create [status]", "create [duration]"]);
        assert!(!ctx.assertions()[0].passed);
        assert!(ctx.assertions()[1].passed);
    }

    #[test]
    fn require_id_rejects_missing_id() {
        let transport = ScriptedTransport::default();
        let api = PetApi::new(&transport, "http://api.test/pet", "k");
        let catalog = TestDataCatalog::default();
        let mut ctx = ScenarioContext::new(&api, &catalog);

        let resp = crate::client::testing::response(200, json!({"name": "doggie"}));
        assert!(matches!(
            ctx.require_id("created id", &resp),
            Err(ScenarioError::Precondition(_))
        ));
        assert_eq!(ctx.assertions()[0].violations[0].actual, "missing");
    }
}
