//! The pet resource payload and its local contract validator
//!
//! `validate_pet` works on raw JSON so it can judge catalog members that are
//! not representable as a `Pet` (wrong types, missing fields, non-objects).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::Violation;

/// Smallest id the API assigns or accepts.
pub const MIN_ID: u64 = 1;

/// Largest integer a JSON number can carry without precision loss (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Accepted prefix for every entry of `photoUrls`.
pub const VALID_URL_PREFIX: &str = "https://";

/// Upper bound on `name` length, in characters.
pub const MAX_NAME_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Pending,
    Sold,
}

impl PetStatus {
    pub const ALL: [Self; 3] = [Self::Available, Self::Pending, Self::Sold];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Sold => "sold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

impl std::fmt::Display for PetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
}

/// A pet as sent to and returned by the API.
///
/// Optional fields are omitted from the JSON when unset, so a required-only
/// pet serializes to exactly `name` and `photoUrls` (plus `id` if known).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub photo_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PetStatus>,
}

impl Pet {
    pub fn new(name: impl Into<String>, photo_urls: Vec<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            photo_urls,
            category: None,
            tags: None,
            status: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn to_json(&self) -> Value {
        // A struct of strings, integers and enums always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// JSON type name used in violation messages.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_u64() || n.is_i64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `true` if the value is an integer in `[MIN_ID, MAX_SAFE_INTEGER]`.
pub fn is_valid_id(value: &Value) -> bool {
    value
        .as_u64()
        .is_some_and(|id| (MIN_ID..=MAX_SAFE_INTEGER).contains(&id))
}

/// Check a raw request body against the pet contract.
///
/// Collects every problem instead of stopping at the first one.
///
/// # Errors
///
/// Returns the list of violations if the body would be rejected.
pub fn validate_pet(body: &Value) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    let Some(obj) = body.as_object() else {
        return Err(vec![Violation::new("$", "object", json_type(body))]);
    };

    if let Some(id) = obj.get("id") {
        if !is_valid_id(id) {
            violations.push(Violation::new(
                "id",
                format!("integer in [{MIN_ID}, {MAX_SAFE_INTEGER}]"),
                id.to_string(),
            ));
        }
    }

    match obj.get("name") {
        None => violations.push(Violation::new("name", "present", "missing")),
        Some(name) => check_name("name", name, &mut violations),
    }

    match obj.get("photoUrls") {
        None => violations.push(Violation::new("photoUrls", "present", "missing")),
        Some(Value::Array(urls)) if urls.is_empty() => {
            violations.push(Violation::new("photoUrls", "at least 1 url", "[]"));
        }
        Some(Value::Array(urls)) => {
            for (i, url) in urls.iter().enumerate() {
                let valid = url
                    .as_str()
                    .and_then(|s| s.strip_prefix(VALID_URL_PREFIX))
                    .is_some_and(|rest| !rest.trim().is_empty());
                if !valid {
                    violations.push(Violation::new(
                        format!("photoUrls[{i}]"),
                        format!("string starting with {VALID_URL_PREFIX}"),
                        url.to_string(),
                    ));
                }
            }
        }
        Some(other) => violations.push(Violation::new("photoUrls", "array", json_type(other))),
    }

    if let Some(category) = obj.get("category") {
        check_named_entity("category", category, &mut violations);
    }

    if let Some(tags) = obj.get("tags") {
        match tags {
            Value::Array(items) => {
                for (i, tag) in items.iter().enumerate() {
                    check_named_entity(&format!("tags[{i}]"), tag, &mut violations);
                }
            }
            other => violations.push(Violation::new("tags", "array", json_type(other))),
        }
    }

    if let Some(status) = obj.get("status") {
        if status.as_str().and_then(PetStatus::parse).is_none() {
            violations.push(Violation::new(
                "status",
                "one of available, pending, sold",
                status.to_string(),
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn check_name(field: &str, name: &Value, violations: &mut Vec<Violation>) {
    match name.as_str() {
        None => violations.push(Violation::new(field, "string", json_type(name))),
        Some(s) if s.trim().is_empty() => {
            violations.push(Violation::new(field, "non-empty string", name.to_string()));
        }
        Some(s) if s.chars().count() > MAX_NAME_LEN => violations.push(Violation::new(
            field,
            format!("at most {MAX_NAME_LEN} characters"),
            format!("{} characters", s.chars().count()),
        )),
        Some(_) => {}
    }
}

/// `category` and each tag share the `{id, name}` shape.
fn check_named_entity(field: &str, value: &Value, violations: &mut Vec<Violation>) {
    let Some(obj) = value.as_object() else {
        violations.push(Violation::new(field, "object", json_type(value)));
        return;
    };
    match obj.get("id") {
        Some(id) if is_valid_id(id) => {}
        Some(id) => violations.push(Violation::new(
            format!("{field}.id"),
            format!("integer in [{MIN_ID}, {MAX_SAFE_INTEGER}]"),
            id.to_string(),
        )),
        None => violations.push(Violation::new(format!("{field}.id"), "present", "missing")),
    }
    match obj.get("name") {
        Some(name) => check_name(&format!("{field}.name"), name, violations),
        None => violations.push(Violation::new(
            format!("{field}.name"),
            "present",
            "missing",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dog() -> Value {
        json!({"name": "doggie", "photoUrls": ["https://example.com/dog.jpg"]})
    }

    #[test]
    fn required_only_pet_is_valid() {
        assert!(validate_pet(&dog()).is_ok());
    }

    #[test]
    fn full_pet_is_valid() {
        let body = json!({
            "id": 10,
            "name": "Tom",
            "photoUrls": ["https://example.com/cat.jpg"],
            "category": {"id": 2, "name": "cat"},
            "tags": [{"id": 2, "name": "normal breed"}],
            "status": "available"
        });
        assert!(validate_pet(&body).is_ok());
    }

    #[test]
    fn empty_tag_list_is_valid() {
        let mut body = dog();
        body["tags"] = json!([]);
        assert!(validate_pet(&body).is_ok());
    }

    #[test]
    fn non_object_body_rejected() {
        let errs = validate_pet(&json!(false)).unwrap_err();
        assert_eq!(errs, vec![Violation::new("$", "object", "boolean")]);
    }

    #[test]
    fn empty_object_reports_both_required_fields() {
        let errs = validate_pet(&json!({})).unwrap_err();
        let fields: Vec<&str> = errs.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "photoUrls"]);
    }

    #[test]
    fn blank_name_and_url_rejected() {
        let errs = validate_pet(&json!({"name": "   ", "photoUrls": ["    "]})).unwrap_err();
        let fields: Vec<&str> = errs.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "photoUrls[0]"]);
    }

    #[test]
    fn overlong_name_rejected() {
        let mut body = dog();
        body["name"] = json!("x".repeat(MAX_NAME_LEN + 1));
        let errs = validate_pet(&body).unwrap_err();
        assert_eq!(errs[0].field, "name");
        assert_eq!(errs[0].actual, format!("{} characters", MAX_NAME_LEN + 1));
    }

    #[test]
    fn id_out_of_range_rejected() {
        let mut body = dog();
        body["id"] = json!(0);
        assert!(validate_pet(&body).is_err());
        body["id"] = json!(MAX_SAFE_INTEGER + 1);
        assert!(validate_pet(&body).is_err());
        body["id"] = json!(MAX_SAFE_INTEGER);
        assert!(validate_pet(&body).is_ok());
    }

    #[test]
    fn bad_status_rejected() {
        for status in [json!("nice"), json!(""), json!(null), json!(123)] {
            let mut body = dog();
            body["status"] = status;
            assert!(validate_pet(&body).is_err());
        }
    }

    #[test]
    fn nested_shapes_checked() {
        let mut body = dog();
        body["category"] = json!({});
        body["tags"] = json!([{"hello": false}]);
        let errs = validate_pet(&body).unwrap_err();
        let fields: Vec<&str> = errs.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["category.id", "category.name", "tags[0].id", "tags[0].name"]
        );
    }

    #[test]
    fn pet_serializes_without_unset_fields() {
        let pet = Pet::new("doggie", vec!["https://example.com/dog.jpg".into()]).with_id(7);
        assert_eq!(
            pet.to_json(),
            json!({"id": 7, "name": "doggie", "photoUrls": ["https://example.com/dog.jpg"]})
        );
    }

    #[test]
    fn status_parse_round_trip() {
        for status in PetStatus::ALL {
            assert_eq!(PetStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PetStatus::parse("nice"), None);
    }
}
