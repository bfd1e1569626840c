//! Whole-run driver: resolve once, run every selected group in order

use petcontract_core::plan::validate_environment;
use petcontract_core::{
    ConfigError, ConfigResolver, EnvironmentConfig, IdSource, PET_ROUTE, RunPlan, RunReport,
    TestDataCatalog,
};

use crate::api::PetApi;
use crate::client::{HttpClient, Transport, TransportError};
use crate::scenario::{ScenarioGroup, run_group};
use crate::suites;

/// Runs the pet contract suites against one environment.
pub struct ContractRunner {
    config: EnvironmentConfig,
    transport: Box<dyn Transport>,
    catalog: TestDataCatalog,
    /// Only groups whose name contains this substring
    filter: Option<String>,
}

impl ContractRunner {
    pub fn new(config: EnvironmentConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            catalog: TestDataCatalog::default(),
            filter: None,
        }
    }

    /// Resolve `env` from `resolver` and talk to it over HTTP.
    ///
    /// # Errors
    ///
    /// Returns error if the environment cannot be resolved or the HTTP client
    /// cannot be built.
    pub fn from_resolver(
        resolver: &ConfigResolver,
        env: Option<&str>,
    ) -> Result<Self, RunnerError> {
        let config = resolver.resolve(env)?;
        tracing::info!(env = %config.name, base_url = %config.base_url, "environment resolved");
        Ok(Self::new(config, Box::new(HttpClient::new()?)))
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_id_source(mut self, ids: IdSource) -> Self {
        self.catalog = TestDataCatalog::new(ids);
        self
    }

    /// What `run` would do. No requests are sent.
    #[must_use]
    pub fn plan(&self) -> RunPlan {
        plan(&self.config, self.filter.as_deref())
    }

    /// Run every selected group; each cleans up after itself.
    ///
    /// # Errors
    ///
    /// Returns error if the pet route is missing from the environment.
    pub fn run(&self) -> Result<RunReport, RunnerError> {
        let api = PetApi::from_config(self.transport.as_ref(), &self.config)?;
        let groups = selected_groups(self.filter.as_deref());
        tracing::info!(collection = api.collection_url(), groups = groups.len(), "running");
        let mut reports = Vec::new();
        for mut group in groups {
            reports.push(run_group(group.as_mut(), &api, &self.catalog));
        }
        Ok(RunReport {
            environment: self.config.name.clone(),
            base_url: self.config.base_url.clone(),
            groups: reports,
        })
    }
}

fn selected_groups(filter: Option<&str>) -> Vec<Box<dyn ScenarioGroup>> {
    suites::all()
        .into_iter()
        .filter(|g| filter.is_none_or(|f| g.name().contains(f)))
        .collect()
}

/// Dry run of the groups matching `filter` against `config`.
///
/// Needs no transport.
#[must_use]
pub fn plan(config: &EnvironmentConfig, filter: Option<&str>) -> RunPlan {
    let groups: Vec<_> = selected_groups(filter).iter().map(|g| g.plan()).collect();
    let total_requests = groups
        .iter()
        .map(|g| u64::from(g.requests) + 2 * u64::from(g.max_cleanup_ids))
        .sum();
    RunPlan {
        environment: config.name.clone(),
        groups,
        total_requests,
        validations: validate_environment(config, PET_ROUTE),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedTransport;
    use petcontract_core::config::RouteTable;
    use serde_json::json;
    use std::collections::HashMap;

    fn config(routes: serde_json::Value) -> EnvironmentConfig {
        EnvironmentConfig {
            name: "dev".into(),
            base_url: "http://api.test/v2".into(),
            api_key: "special-key".into(),
            extra: HashMap::new(),
            routes: RouteTable::from_json(&routes).unwrap(),
        }
    }

    #[test]
    fn plan_counts_requests_and_cleanup() {
        let runner = ContractRunner::new(
            config(json!({"v2": {"pet": "/pet"}})),
            Box::new(ScriptedTransport::default()),
        )
        .with_filter(Some("create: required".into()));
        let plan = runner.plan();

        assert_eq!(plan.groups.len(), 1);
        // POST + GET, then DELETE + GET for the one id
        assert_eq!(plan.total_requests, 4);
        assert!(!plan.has_errors());
    }

    #[test]
    fn plan_without_filter_lists_every_group() {
        let runner = ContractRunner::new(
            config(json!({"v2": {"pet": "/pet"}})),
            Box::new(ScriptedTransport::default()),
        );
        let names: Vec<String> = runner.plan().groups.into_iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            vec![
                "create: required fields",
                "create: full payload",
                "create: negative",
                "update: required fields",
                "update: full payload",
                "update: negative",
            ]
        );
    }

    #[test]
    fn missing_route_fails_run_and_plan() {
        let runner = ContractRunner::new(
            config(json!({"v2": {"store": "/store"}})),
            Box::new(ScriptedTransport::default()),
        );
        assert!(runner.plan().has_errors());
        assert!(matches!(
            runner.run(),
            Err(RunnerError::Config(ConfigError::MissingRoute(_)))
        ));
    }

    #[test]
    fn plan_needs_only_config() {
        let config = config(json!({"v2": {"pet": "/pet"}}));
        let plan = plan(&config, Some("update"));

        assert_eq!(plan.environment, "dev");
        assert_eq!(plan.groups.len(), 3);
        assert!(plan.groups.iter().all(|g| g.name.starts_with("update")));
        let runner = ContractRunner::new(config, Box::new(ScriptedTransport::default()))
            .with_filter(Some("update".into()));
        assert_eq!(runner.plan().total_requests, plan.total_requests);
    }

    #[test]
    fn unknown_environment_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ConfigResolver::new(dir.path());
        assert!(matches!(
            ContractRunner::from_resolver(&resolver, Some("staging")),
            Err(RunnerError::Config(ConfigError::NotFound { .. }))
        ));
    }
}
