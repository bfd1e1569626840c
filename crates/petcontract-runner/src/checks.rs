//! Response verification against an `ExpectedContract`
//!
//! No I/O. Every check runs regardless of the others, so one call can report
//! several violations.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use petcontract_core::ExpectedContract;
use petcontract_core::Violation;
use petcontract_core::payload::{
    MAX_SAFE_INTEGER, MIN_ID, PetStatus, VALID_URL_PREFIX, json_type,
};
use serde_json::{Value, json};

use crate::client::Response;

/// Result of one named check.
pub type CheckResult = Result<(), Vec<Violation>>;

/// Run every check; `Err` carries all violations.
///
/// # Errors
///
/// Returns the violations of every failed check.
pub fn verify(response: &Response, contract: &ExpectedContract) -> CheckResult {
    let violations: Vec<Violation> = verify_each(response, contract)
        .into_iter()
        .filter_map(|(_, r)| r.err())
        .flatten()
        .collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Run every check and keep results apart, one per check name.
///
/// Checks that the contract does not ask for are omitted.
pub fn verify_each(
    response: &Response,
    contract: &ExpectedContract,
) -> Vec<(&'static str, CheckResult)> {
    let mut results = vec![
        ("status", check_status(response, contract.expected_status)),
        ("duration", check_duration(response, contract.max_duration_ms)),
    ];
    if let Some(keys) = &contract.expected_keys {
        results.push(("keys", check_keys(response, keys)));
        results.push(("fields", check_field_shapes(response)));
    }
    if !contract.expected_fields.is_empty() {
        results.push(("values", check_values(response, contract)));
    }
    if !contract.expected_headers.is_empty() {
        results.push(("headers", check_headers(response, contract)));
    }
    results
}

fn single(v: Violation) -> CheckResult {
    Err(vec![v])
}

fn collect(violations: Vec<Violation>) -> CheckResult {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

pub fn check_status(response: &Response, expected: u16) -> CheckResult {
    if response.status == expected {
        Ok(())
    } else {
        single(Violation::new(
            "status",
            expected.to_string(),
            response.status.to_string(),
        ))
    }
}

pub fn check_duration(response: &Response, max_ms: u64) -> CheckResult {
    if response.duration_ms < max_ms {
        Ok(())
    } else {
        single(Violation::new(
            "duration_ms",
            format!("< {max_ms}"),
            response.duration_ms.to_string(),
        ))
    }
}

/// First 80 characters of a raw body.
fn raw_excerpt(text: &str) -> String {
    text.chars().take(80).collect()
}

fn format_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    format!("{{{}}}", keys.map(String::as_str).collect::<Vec<_>>().join(", "))
}

/// Top-level key set must equal `expected`, order ignored.
pub fn check_keys(response: &Response, expected: &BTreeSet<String>) -> CheckResult {
    let Some(obj) = response.body.as_ref().and_then(Value::as_object) else {
        let actual = match &response.body {
            Some(body) => json_type(body).to_string(),
            None if response.text.is_empty() => "no JSON body".to_string(),
            None => format!("non-JSON body {:?}", raw_excerpt(&response.text)),
        };
        return single(Violation::new("$", "object", actual));
    };
    let actual: BTreeSet<String> = obj.keys().cloned().collect();
    if &actual == expected {
        Ok(())
    } else {
        single(Violation::new(
            "$",
            format_keys(expected.iter()),
            format_keys(actual.iter()),
        ))
    }
}

/// One compiled per-field schema of a pet response body.
struct FieldSchema {
    field: &'static str,
    expected: &'static str,
    /// Compile error text if the schema itself is broken
    validator: Result<jsonschema::Validator, String>,
}

/// Compiled once; `verify` runs for every response of a run.
static FIELD_SCHEMAS: LazyLock<Vec<FieldSchema>> = LazyLock::new(|| {
    field_schemas()
        .into_iter()
        .map(|(field, schema, expected)| FieldSchema {
            field,
            expected,
            validator: jsonschema::validator_for(&schema).map_err(|e| e.to_string()),
        })
        .collect()
});

fn field_schemas() -> Vec<(&'static str, Value, &'static str)> {
    let id = json!({"type": "integer", "minimum": MIN_ID, "maximum": MAX_SAFE_INTEGER});
    let named = json!({
        "type": "object",
        "required": ["id", "name"],
        "properties": {"id": id, "name": {"type": "string"}}
    });
    let statuses: Vec<&str> = PetStatus::ALL.iter().map(|s| s.as_str()).collect();
    vec![
        ("id", id.clone(), "integer in [1, MAX_SAFE_INTEGER]"),
        (
            "name",
            json!({"type": "string", "minLength": 1}),
            "non-empty string",
        ),
        (
            "photoUrls",
            json!({
                "type": "array",
                "items": {"type": "string", "pattern": format!("^{VALID_URL_PREFIX}")}
            }),
            "array of https:// urls",
        ),
        ("category", named.clone(), "object {id, name}"),
        (
            "tags",
            json!({"type": "array", "items": named}),
            "array of {id, name}",
        ),
        (
            "status",
            json!({"type": "string", "enum": statuses}),
            "one of available, pending, sold",
        ),
    ]
}

/// Type and range of every known field present in the body.
///
/// A schema that failed to compile fails every body carrying its field.
pub fn check_field_shapes(response: &Response) -> CheckResult {
    let Some(obj) = response.body.as_ref().and_then(Value::as_object) else {
        // Reported by check_keys
        return Ok(());
    };
    let mut violations = Vec::new();
    for schema in FIELD_SCHEMAS.iter() {
        let Some(value) = obj.get(schema.field) else {
            continue;
        };
        match &schema.validator {
            Ok(validator) if validator.is_valid(value) => {}
            Ok(_) => violations.push(Violation::new(
                schema.field,
                schema.expected,
                value.to_string(),
            )),
            Err(e) => violations.push(Violation::new(
                schema.field,
                schema.expected,
                format!("unchecked, schema error: {e}"),
            )),
        }
    }
    collect(violations)
}

/// Fields with an exact expected value (deep equality).
pub fn check_values(response: &Response, contract: &ExpectedContract) -> CheckResult {
    let violations = contract
        .expected_fields
        .iter()
        .filter_map(|(field, expected)| match response.field(field) {
            Some(actual) if actual == expected => None,
            Some(actual) => Some(Violation::new(
                field.as_str(),
                expected.to_string(),
                actual.to_string(),
            )),
            None => Some(Violation::new(field.as_str(), expected.to_string(), "missing")),
        })
        .collect();
    collect(violations)
}

pub fn check_headers(response: &Response, contract: &ExpectedContract) -> CheckResult {
    let violations = contract
        .expected_headers
        .iter()
        .filter_map(|h| {
            let field = format!("header:{}", h.name);
            match response.header(&h.name) {
                Some(actual) if h.mode.matches(&h.value, actual) => None,
                Some(actual) => {
                    let expected = format!("{:?} {}", h.mode, h.value);
                    Some(Violation::new(field, expected, actual))
                }
                None => Some(Violation::new(field, h.value.as_str(), "missing")),
            }
        })
        .collect();
    collect(violations)
}
