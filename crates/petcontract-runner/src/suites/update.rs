//! `PUT <collection>` groups
//!
//! Each group creates its own pet under a fresh client-supplied id first.

use petcontract_core::{
    ExpectedContract, GroupPlan, HttpMethod, MatchMode, PayloadVariant, TestDataCatalog,
};
use serde_json::Value;

use super::{
    NegativeRequest, PLAN_ID, assert_fetch_echoes, echo_contract, negative_requests, send_all,
};
use crate::client::Response;
use crate::scenario::{ScenarioContext, ScenarioError, ScenarioGroup};

/// The pet an update group works on.
#[derive(Debug, Clone)]
struct Target {
    id: u64,
    created: Value,
}

fn create_target(ctx: &mut ScenarioContext<'_>) -> Result<Target, ScenarioError> {
    let id = ctx.catalog().next_id();
    let body = TestDataCatalog::required_pet().with_id(id).to_json();
    let resp = ctx.create(&body)?;
    ctx.require(
        "POST pet to update",
        &resp,
        &ExpectedContract::success(PayloadVariant::Required),
    )?;
    let id = ctx.require_id("POST pet to update [id]", &resp)?;
    Ok(Target {
        id,
        created: resp.body.unwrap_or(Value::Null),
    })
}

fn require_target(target: Option<&Target>) -> Result<&Target, ScenarioError> {
    target.ok_or_else(|| ScenarioError::Precondition("no pet to update".into()))
}

/// Update name and photos with a required-only body.
#[derive(Debug, Default)]
pub struct UpdateRequired {
    target: Option<Target>,
    updated: Option<Response>,
}

impl ScenarioGroup for UpdateRequired {
    fn name(&self) -> &str {
        "update: required fields"
    }

    fn plan(&self) -> GroupPlan {
        GroupPlan {
            name: self.name().into(),
            requests: 3,
            max_cleanup_ids: 1,
            cases: vec![
                "POST pet to update".into(),
                "PUT required body".into(),
                "GET updated pet".into(),
            ],
        }
    }

    fn setup(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        self.target = Some(create_target(ctx)?);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        let id = require_target(self.target.as_ref())?.id;
        self.updated = Some(ctx.update(&TestDataCatalog::update_body(id))?);
        Ok(())
    }

    fn assert(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        let id = require_target(self.target.as_ref())?.id;
        let Some(updated) = self.updated.take() else {
            return Ok(());
        };
        let input = TestDataCatalog::update_body(id);
        let fields = TestDataCatalog::expected_keys(PayloadVariant::Required);

        let contract = echo_contract(PayloadVariant::Required, &input, fields)
            .with_standard_headers(MatchMode::Exact);
        ctx.check_each("PUT required body", &updated, &contract);

        assert_fetch_echoes(
            ctx,
            "GET updated pet",
            id,
            PayloadVariant::Required,
            &input,
            fields,
        )
    }
}

/// Add every optional field, leaving the required ones as they were.
#[derive(Debug, Default)]
pub struct UpdateFull {
    target: Option<Target>,
    updated: Option<Response>,
}

impl ScenarioGroup for UpdateFull {
    fn name(&self) -> &str {
        "update: full payload"
    }

    fn plan(&self) -> GroupPlan {
        GroupPlan {
            name: self.name().into(),
            requests: 3,
            max_cleanup_ids: 1,
            cases: vec![
                "POST pet to update".into(),
                "PUT full body".into(),
                "GET updated pet".into(),
            ],
        }
    }

    fn setup(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        self.target = Some(create_target(ctx)?);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        let id = require_target(self.target.as_ref())?.id;
        self.updated = Some(ctx.update(&TestDataCatalog::full_update_body(id))?);
        Ok(())
    }

    fn assert(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        let target = require_target(self.target.as_ref())?.clone();
        let Some(updated) = self.updated.take() else {
            return Ok(());
        };
        let input = TestDataCatalog::full_update_body(target.id);

        let added = echo_contract(PayloadVariant::Full, &input, &["category", "tags", "status"]);
        ctx.check_each("PUT full body", &updated, &added);

        // Untouched fields stay as created
        let kept = echo_contract(
            PayloadVariant::Full,
            &target.created,
            TestDataCatalog::expected_keys(PayloadVariant::Required),
        );
        ctx.check("PUT full body keeps required fields", &updated, &kept);

        assert_fetch_echoes(
            ctx,
            "GET updated pet",
            target.id,
            PayloadVariant::Full,
            &input,
            TestDataCatalog::expected_keys(PayloadVariant::Full),
        )
    }
}

/// Everything update must refuse; the pet must survive unchanged.
#[derive(Debug, Default)]
pub struct UpdateNegatives {
    target: Option<Target>,
    outcomes: Vec<(String, Response, ExpectedContract)>,
}

impl UpdateNegatives {
    fn requests(id: u64) -> Vec<NegativeRequest> {
        negative_requests(HttpMethod::Put, Some(id))
    }
}

impl ScenarioGroup for UpdateNegatives {
    fn name(&self) -> &str {
        "update: negative"
    }

    fn plan(&self) -> GroupPlan {
        let requests = Self::requests(PLAN_ID);
        let mut cases = vec!["POST pet to update".to_string()];
        cases.extend(requests.iter().map(|r| r.label.clone()));
        cases.push("GET pet unchanged".into());
        let n = u32::try_from(requests.len()).unwrap_or(u32::MAX);
        GroupPlan {
            name: self.name().into(),
            requests: n.saturating_add(2),
            max_cleanup_ids: n.saturating_add(1),
            cases,
        }
    }

    fn setup(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        self.target = Some(create_target(ctx)?);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        let target = require_target(self.target.as_ref())?.clone();
        self.outcomes
            .extend(send_all(ctx, &Self::requests(target.id))?);

        let resp = ctx.fetch(target.id)?;
        self.outcomes.push((
            "GET pet unchanged".into(),
            resp,
            echo_contract(
                PayloadVariant::Required,
                &target.created,
                TestDataCatalog::expected_keys(PayloadVariant::Required),
            ),
        ));
        Ok(())
    }

    fn assert(&mut self, ctx: &mut ScenarioContext<'_>) -> Result<(), ScenarioError> {
        for (label, resp, contract) in std::mem::take(&mut self.outcomes) {
            ctx.check(&label, &resp, &contract);
        }
        Ok(())
    }
}
