//! Expected contracts per operation and the structured violation record

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound on response time for every operation.
pub const DEFAULT_MAX_DURATION_MS: u64 = 1000;

/// Headers every successful pet response must carry.
pub const EXPECTED_HEADERS: &[(&str, &str)] = &[
    (
        "access-control-allow-headers",
        "Content-Type, api_key, Authorization",
    ),
    ("access-control-allow-methods", "GET, POST, DELETE, PUT"),
    ("access-control-allow-origin", "*"),
    ("content-type", "application/json"),
];

/// One contract mismatch: which field, what was expected, what arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    /// Field path (`status`, `photoUrls[0]`, `header:content-type`, `$` for the whole body)
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl Violation {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Which response shape a successful operation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PayloadVariant {
    /// `id`, `name`, `photoUrls`
    Required,
    /// every field of the pet
    Full,
}

impl PayloadVariant {
    #[must_use]
    pub const fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Required => &["id", "name", "photoUrls"],
            Self::Full => &["id", "name", "photoUrls", "category", "tags", "status"],
        }
    }

    pub fn key_set(self) -> BTreeSet<String> {
        self.keys().iter().map(|k| (*k).to_string()).collect()
    }
}

/// How an expected header value is compared with the actual one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    Substring,
}

impl MatchMode {
    pub fn matches(self, expected: &str, actual: &str) -> bool {
        match self {
            Self::Exact => actual == expected,
            Self::Substring => actual.contains(expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderExpectation {
    /// Lower-case header name
    pub name: String,
    pub value: String,
    pub mode: MatchMode,
}

/// Everything one response must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedContract {
    pub expected_status: u16,

    /// Exact top-level key set of the body; `None` skips shape checks
    pub expected_keys: Option<BTreeSet<String>>,

    /// Top-level fields whose value must deep-equal the given JSON
    #[serde(default)]
    pub expected_fields: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub expected_headers: Vec<HeaderExpectation>,

    pub max_duration_ms: u64,
}

impl ExpectedContract {
    /// 200 with the given body shape.
    pub fn success(variant: PayloadVariant) -> Self {
        Self {
            expected_status: 200,
            expected_keys: Some(variant.key_set()),
            expected_fields: BTreeMap::new(),
            expected_headers: Vec::new(),
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
        }
    }

    /// 200 with a body whose shape is not checked (fetch after update etc.).
    pub fn ok() -> Self {
        Self::status(200)
    }

    /// Only the status code (and the timing bound) matter.
    pub fn status(expected_status: u16) -> Self {
        Self {
            expected_status,
            expected_keys: None,
            expected_fields: BTreeMap::new(),
            expected_headers: Vec::new(),
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.expected_fields.insert(name.into(), value);
        self
    }

    /// Require the standard pet response headers, compared with `mode`.
    #[must_use]
    pub fn with_standard_headers(mut self, mode: MatchMode) -> Self {
        self.expected_headers
            .extend(EXPECTED_HEADERS.iter().map(|(name, value)| HeaderExpectation {
                name: (*name).to_string(),
                value: (*value).to_string(),
                mode,
            }));
        self
    }

    #[must_use]
    pub fn with_max_duration_ms(mut self, ms: u64) -> Self {
        self.max_duration_ms = ms;
        self
    }
}
