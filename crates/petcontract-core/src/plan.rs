//! Dry run plan types and environment validation
//!
//! Describes what a run *would* do without sending any requests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::EnvironmentConfig;

/// Complete dry run plan: scenario groups, request counts, and config checks.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunPlan {
    pub environment: String,
    pub groups: Vec<GroupPlan>,
    /// Requests the groups would send, cleanup included
    pub total_requests: u64,
    pub validations: Vec<Validation>,
}

/// Execution plan for one scenario group.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroupPlan {
    pub name: String,
    /// Requests issued by setup and execute
    pub requests: u32,
    /// Upper bound on ids to clean up (2 requests each)
    pub max_cleanup_ids: u32,
    /// Labels of the cases this group covers
    pub cases: Vec<String>,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Values that suggest a placeholder rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-api-key",
    "YOUR_API_KEY",
    "CHANGEME",
    "changeme",
    "placeholder",
    "REPLACE_ME",
    "xxx",
];

/// Validate a resolved environment.
#[must_use]
pub fn validate_environment(config: &EnvironmentConfig, route: &str) -> Vec<Validation> {
    let mut checks = Vec::new();

    if config.base_url.starts_with("http://") || config.base_url.starts_with("https://") {
        checks.push(Validation {
            check: "base_url".into(),
            status: ValidationStatus::Ok,
            message: format!("base_url: {}", config.base_url),
        });
    } else {
        checks.push(Validation {
            check: "base_url".into(),
            status: ValidationStatus::Error,
            message: format!(
                "base_url: {} (missing http:// or https:// prefix)",
                config.base_url
            ),
        });
    }

    let key = &config.api_key;
    if key.trim().is_empty() {
        checks.push(Validation {
            check: "api_key".into(),
            status: ValidationStatus::Warning,
            message: "api_key: empty".into(),
        });
    } else if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| key.contains(*p)) {
        checks.push(Validation {
            check: "api_key".into(),
            status: ValidationStatus::Warning,
            message: format!("api_key: contains '{pattern}', may be placeholder"),
        });
    } else {
        checks.push(Validation {
            check: "api_key".into(),
            status: ValidationStatus::Ok,
            message: "api_key: configured".into(),
        });
    }

    match config.resource_url(route) {
        Ok(url) => checks.push(Validation {
            check: "route".into(),
            status: ValidationStatus::Ok,
            message: format!("{route}: {url}"),
        }),
        Err(e) => {
            let known: Vec<&str> = config.routes.names().collect();
            let message = if known.is_empty() {
                format!("{e} (route table is empty)")
            } else {
                format!("{e} (known: {})", known.join(", "))
            };
            checks.push(Validation {
                check: "route".into(),
                status: ValidationStatus::Error,
                message,
            });
        }
    }

    checks
}

impl RunPlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run ({}): {} groups, up to {} requests planned\n",
            self.environment,
            self.groups.len(),
            self.total_requests,
        ));

        for group in &self.groups {
            lines.push(format!(
                "{} ({} requests, cleanup of up to {} ids):",
                group.name, group.requests, group.max_cleanup_ids
            ));
            for case in &group.cases {
                lines.push(format!("  - {case}"));
            }
            lines.push(String::new());
        }

        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PET_ROUTE, RouteTable};
    use std::collections::HashMap;

    fn env(base_url: &str, api_key: &str) -> EnvironmentConfig {
        EnvironmentConfig {
            name: "dev".into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            extra: HashMap::new(),
            routes: RouteTable::from_json(&serde_json::json!({"v2": {"pet": "/pet"}})).unwrap(),
        }
    }

    fn status_of(checks: &[Validation], name: &str) -> ValidationStatus {
        checks.iter().find(|c| c.check == name).unwrap().status
    }

    #[test]
    fn valid_environment_all_ok() {
        let checks = validate_environment(&env("https://petstore.example/v2", "s3cr3t"), PET_ROUTE);
        assert!(checks.iter().all(|c| c.status == ValidationStatus::Ok));
    }

    #[test]
    fn bad_base_url_is_error() {
        let checks = validate_environment(&env("petstore.example", "s3cr3t"), PET_ROUTE);
        assert_eq!(status_of(&checks, "base_url"), ValidationStatus::Error);
    }

    #[test]
    fn placeholder_key_warns() {
        let checks = validate_environment(&env("http://localhost", "CHANGEME"), PET_ROUTE);
        assert_eq!(status_of(&checks, "api_key"), ValidationStatus::Warning);
    }

    #[test]
    fn unknown_route_is_error() {
        let checks = validate_environment(&env("http://localhost", "k"), "v3.pet");
        assert_eq!(status_of(&checks, "route"), ValidationStatus::Error);
        let route = checks.iter().find(|c| c.check == "route").unwrap();
        assert_eq!(
            route.message,
            "Route 'v3.pet' not in route table (known: v2.pet)"
        );
    }

    #[test]
    fn plan_terminal_output() {
        let plan = RunPlan {
            environment: "dev".into(),
            groups: vec![GroupPlan {
                name: "create: required fields".into(),
                requests: 2,
                max_cleanup_ids: 1,
                cases: vec!["POST required body".into(), "GET created id".into()],
            }],
            total_requests: 4,
            validations: vec![Validation {
                check: "base_url".into(),
                status: ValidationStatus::Ok,
                message: "base_url: http://localhost".into(),
            }],
        };

        let text = plan.to_terminal();
        assert!(text.contains("1 groups, up to 4 requests planned"));
        assert!(text.contains("create: required fields (2 requests, cleanup of up to 1 ids):"));
        assert!(text.contains("  - GET created id"));
        assert!(text.contains("[OK] base_url: http://localhost"));
        assert!(!plan.has_errors());
    }
}
