//! `POST <collection>` groups

use petcontract_core::{
    ExpectedContract, GroupPlan, HttpMethod, MatchMode, PayloadVariant, TestDataCatalog,
};
use serde_json::{Value, json};

use super::{NegativeRequest, assert_fetch_echoes, negative_requests, send_all};
use crate::client::Response;
use crate::scenario::{ScenarioContext, ScenarioError, ScenarioGroup};

/// Name sent when trying to overwrite an existing pet through create.
const COLLISION_NAME: &str = "UPDATED DOGGIE";

/// Fields of a create request the response must echo.
const REQUIRED_ECHO: &[&str] = &["name", "photoUrls"];
const FULL_ECHO: &[&str] = &["name", "photoUrls", "category", "tags", "status"];

fn created_contract(variant: PayloadVariant, input: &Value, echo: &[&str]) -> ExpectedContract {
    echo.iter()
        .fold(ExpectedContract::success(variant), |c, f| {
            c.with_field(*f, input[*f].clone())
        })
        .with_standard_headers(MatchMode::Substring)
}

/// Create, check the response, fetch it back by id.
fn create_and_fetch(
    ctx: &mut ScenarioContext<'_>,
    created: Option<Response>,
    variant: PayloadVariant,
    input: &Value,
    echo: &[&str],
) -> Result<(), ScenarioError> {
    let Some(created) = created else {
        return Ok(());
    };
    let label = match variant {
        PayloadVariant::Required => "POST required body",
        PayloadVariant::Full => "POST full body",
    };
    ctx.check_each(label, &created, &created_contract(variant, input, echo));

    let id = ctx.require_id(&format!("{label} [id]"), &created)?;
    let body = created.body.unwrap_or(Value::Null);
    assert_fetch_echoes(ctx, "GET created id", id, variant, &body, &["id", "name"])
}

/// Valid required-only payload.
#[derive(Debug, Default)]
pub struct CreateRequired {
    created: Option<Response>,
}

impl ScenarioGroup for CreateRequired {
    fn name(&self) -> &str {
        "create: required fields"
    }

    fn plan(&self) -> GroupPlan {
        GroupPlan {
            name: self.name().into(),
            requests: 2,
            max_cleanup_ids: 1,
            cases: vec!["POST required body".into(), "GET created id".into()],
        }
    }

    fn execute(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        self.created = Some(ctx.create(&TestDataCatalog::required_body())?);
        Ok(())
    }

    fn assert(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        create_and_fetch(
            ctx,
            self.created.take(),
            PayloadVariant::Required,
            &TestDataCatalog::required_body(),
            REQUIRED_ECHO,
        )
    }
}

/// Valid payload with every optional field.
#[derive(Debug, Default)]
pub struct CreateFull {
    created: Option<Response>,
}

impl ScenarioGroup for CreateFull {
    fn name(&self) -> &str {
        "create: full payload"
    }

    fn plan(&self) -> GroupPlan {
        GroupPlan {
            name: self.name().into(),
            requests: 2,
            max_cleanup_ids: 1,
            cases: vec!["POST full body".into(), "GET created id".into()],
        }
    }

    fn execute(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        self.created = Some(ctx.create(&TestDataCatalog::full_body())?);
        Ok(())
    }

    fn assert(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        create_and_fetch(
            ctx,
            self.created.take(),
            PayloadVariant::Full,
            &TestDataCatalog::full_body(),
            FULL_ECHO,
        )
    }
}

/// Everything create must refuse, plus create-over-existing-id.
#[derive(Debug, Default)]
pub struct CreateNegatives {
    existing: Option<u64>,
    outcomes: Vec<(String, Response, ExpectedContract)>,
}

impl CreateNegatives {
    fn requests() -> Vec<NegativeRequest> {
        negative_requests(HttpMethod::Post, None)
    }
}

impl ScenarioGroup for CreateNegatives {
    fn name(&self) -> &str {
        "create: negative"
    }

    fn plan(&self) -> GroupPlan {
        let requests = Self::requests();
        let mut cases = vec![
            "POST existing id".to_string(),
            "GET existing pet unchanged".to_string(),
        ];
        cases.extend(requests.iter().map(|r| r.label.clone()));
        let n = u32::try_from(requests.len()).unwrap_or(u32::MAX);
        GroupPlan {
            name: self.name().into(),
            requests: n.saturating_add(3),
            max_cleanup_ids: n.saturating_add(2),
            cases,
        }
    }

    fn setup(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        let resp = ctx.create(&TestDataCatalog::required_body())?;
        ctx.require("POST pet to collide with", &resp, &ExpectedContract::ok())?;
        self.existing = Some(ctx.require_id("POST pet to collide with [id]", &resp)?);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        let Some(id) = self.existing else {
            return Err(ScenarioError::Precondition("no pet to collide with".into()));
        };

        let mut collision = TestDataCatalog::required_body();
        collision["id"] = json!(id);
        collision["name"] = json!(COLLISION_NAME);
        let resp = ctx.create(&collision)?;
        self.outcomes
            .push(("POST existing id".into(), resp, ExpectedContract::status(405)));

        let original = TestDataCatalog::required_body();
        let resp = ctx.fetch(id)?;
        self.outcomes.push((
            "GET existing pet unchanged".into(),
            resp,
            ExpectedContract::ok().with_field("name", original["name"].clone()),
        ));

        self.outcomes.extend(send_all(ctx, &Self::requests())?);
        Ok(())
    }

    fn assert(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        for (label, resp, contract) in std::mem::take(&mut self.outcomes) {
            ctx.check(&label, &resp, &contract);
        }
        Ok(())
    }
}
