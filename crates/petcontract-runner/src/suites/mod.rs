//! Concrete scenario groups for the pet resource
//!
//! Create and update suites draw every fixture and negative case from the
//! shared `TestDataCatalog`.

mod create;
mod update;

pub use create::{CreateFull, CreateNegatives, CreateRequired};
pub use update::{UpdateFull, UpdateNegatives, UpdateRequired};

use petcontract_core::payload::MIN_ID;
use petcontract_core::{
    ExpectedContract, HttpMethod, NegativeCase, PayloadVariant, TestDataCatalog,
};
use serde_json::{Value, json};

use crate::client::Response;
use crate::scenario::{ScenarioContext, ScenarioError, ScenarioGroup};

/// Every group, in run order.
pub fn all() -> Vec<Box<dyn ScenarioGroup>> {
    vec![
        Box::new(CreateRequired::default()),
        Box::new(CreateFull::default()),
        Box::new(CreateNegatives::default()),
        Box::new(UpdateRequired::default()),
        Box::new(UpdateFull::default()),
        Box::new(UpdateNegatives::default()),
    ]
}

/// Id used to build case lists for a plan, where no pet exists yet.
const PLAN_ID: u64 = MIN_ID;

/// One request the API must refuse.
#[derive(Debug, Clone)]
pub(crate) struct NegativeRequest {
    pub label: String,
    pub method: HttpMethod,
    /// `None` sends the standard mutating headers
    pub headers: Option<Vec<(String, String)>>,
    pub body: Value,
    pub expected_status: u16,
}

impl NegativeRequest {
    fn rejected_body(method: HttpMethod, case: NegativeCase) -> Self {
        Self {
            label: format!("{method} {}", case.label),
            method,
            headers: None,
            body: case.body,
            expected_status: 400,
        }
    }

    fn send(&self, ctx: &mut ScenarioContext<'_>) -> Result<Response, ScenarioError> {
        ctx.send_to_collection(self.method, self.headers.clone(), &self.body)
    }
}

/// The shared negative matrix against one verb of the collection.
///
/// `id` is merged into every object body (update needs an existing pet).
pub(crate) fn negative_requests(method: HttpMethod, id: Option<u64>) -> Vec<NegativeRequest> {
    let mut base = TestDataCatalog::required_body();
    if let (Some(id), Some(obj)) = (id, base.as_object_mut()) {
        obj.insert("id".into(), json!(id));
    }

    let mut requests: Vec<NegativeRequest> = TestDataCatalog::body_cases(id)
        .into_iter()
        .map(|case| NegativeRequest::rejected_body(method, case))
        .collect();

    for m in TestDataCatalog::irrelevant_methods().members {
        requests.push(NegativeRequest {
            label: format!("{} instead of {method}", m.label),
            method: m.value,
            headers: None,
            body: base.clone(),
            expected_status: 405,
        });
    }

    for h in TestDataCatalog::invalid_headers().members {
        requests.push(NegativeRequest {
            label: format!("{method} with {}", h.label),
            method,
            headers: Some(h.value),
            body: base.clone(),
            expected_status: 405,
        });
    }

    let field_classes = [
        ("status", TestDataCatalog::invalid_statuses()),
        ("tags", TestDataCatalog::invalid_values()),
        ("category", TestDataCatalog::invalid_values()),
    ];
    for (field, class) in &field_classes {
        requests.extend(
            TestDataCatalog::field_cases(&base, field, class)
                .into_iter()
                .map(|case| NegativeRequest::rejected_body(method, case)),
        );
    }

    requests
}

/// Send every request and record whether each was refused as expected.
pub(crate) fn send_all(
    ctx: &mut ScenarioContext<'_>,
    requests: &[NegativeRequest],
) -> Result<Vec<(String, Response, ExpectedContract)>, ScenarioError> {
    requests
        .iter()
        .map(|r| {
            let response = r.send(ctx)?;
            Ok((
                r.label.clone(),
                response,
                ExpectedContract::status(r.expected_status),
            ))
        })
        .collect()
}

/// Contract of a fetch that must echo `fields` of an earlier response.
pub(crate) fn echo_contract(
    variant: PayloadVariant,
    source: &Value,
    fields: &[&str],
) -> ExpectedContract {
    fields.iter().fold(ExpectedContract::success(variant), |c, f| {
        c.with_field(*f, source.get(*f).cloned().unwrap_or(Value::Null))
    })
}

/// Follow-up fetch shared by the positive groups: `fields` of `expected` must
/// come back unchanged.
pub(crate) fn assert_fetch_echoes(
    ctx: &mut ScenarioContext<'_>,
    name: &str,
    id: u64,
    variant: PayloadVariant,
    expected: &Value,
    fields: &[&str],
) -> Result<(), ScenarioError> {
    let fetched = ctx.fetch(id)?;
    ctx.check(name, &fetched, &echo_contract(variant, expected, fields));
    Ok(())
}
