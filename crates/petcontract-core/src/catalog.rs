//! Test-data catalog: valid fixtures and equivalence classes of invalid input
//!
//! Create and update suites draw from the same classes. A class member is only
//! turned into a negative case when the local contract validator rejects the
//! resulting body, so a case can never be accidentally valid.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::contract::PayloadVariant;
use crate::ids::IdSource;
use crate::method::HttpMethod;
use crate::payload::{Category, Pet, PetStatus, Tag, validate_pet};

/// Distinct ways an input can be invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvalidityKind {
    WrongType,
    Missing,
    Empty,
    Malformed,
    OutOfRange,
    WrongValue,
}

/// A field value that may also be absent (JSON has no `undefined`).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Present(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember<T> {
    pub label: String,
    pub kind: InvalidityKind,
    pub value: T,
}

/// Named set of representative invalid values.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceClass<T> {
    pub name: &'static str,
    pub members: Vec<ClassMember<T>>,
}

impl<T> EquivalenceClass<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            members: Vec::new(),
        }
    }

    fn member(mut self, label: impl Into<String>, kind: InvalidityKind, value: T) -> Self {
        self.members.push(ClassMember {
            label: label.into(),
            kind,
            value,
        });
        self
    }

    /// Kinds from `required` that no member represents.
    pub fn missing_kinds(&self, required: &[InvalidityKind]) -> Vec<InvalidityKind> {
        required
            .iter()
            .copied()
            .filter(|k| !self.members.iter().any(|m| m.kind == *k))
            .collect()
    }

    pub fn covers(&self, required: &[InvalidityKind]) -> bool {
        self.missing_kinds(required).is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A request body expected to be rejected, with the member it came from.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct NegativeCase {
    pub label: String,
    pub kind: InvalidityKind,
    pub body: Value,
}

/// Static fixtures and classes plus the run's id source.
#[derive(Debug, Default)]
pub struct TestDataCatalog {
    ids: IdSource,
}

impl TestDataCatalog {
    pub fn new(ids: IdSource) -> Self {
        Self { ids }
    }

    /// Fresh client-supplied id, see `IdSource`.
    pub fn next_id(&self) -> u64 {
        self.ids.next_id()
    }

    // ── Valid fixtures ──

    pub fn required_pet() -> Pet {
        Pet::new("doggie", vec!["https://example.com/dog.jpg".into()])
    }

    pub fn required_body() -> Value {
        Self::required_pet().to_json()
    }

    pub fn full_pet() -> Pet {
        Pet {
            id: None,
            name: "Tom".into(),
            photo_urls: vec!["https://example.com/cat.jpg".into()],
            category: Some(Category {
                id: 2,
                name: "cat".into(),
            }),
            tags: Some(vec![Tag {
                id: 2,
                name: "normal breed".into(),
            }]),
            status: Some(PetStatus::Available),
        }
    }

    pub fn full_body() -> Value {
        Self::full_pet().to_json()
    }

    /// Required-only update: new name and a second photo.
    pub fn update_body(id: u64) -> Value {
        Pet::new(
            "doggie update",
            vec![
                "https://example.com/dog.jpg".into(),
                "https://example.com/dog_2.jpg".into(),
            ],
        )
        .with_id(id)
        .to_json()
    }

    /// Full update: required fields untouched, optional fields added.
    pub fn full_update_body(id: u64) -> Value {
        let full = Self::full_pet();
        Pet {
            category: full.category,
            tags: full.tags,
            status: full.status,
            ..Self::required_pet().with_id(id)
        }
        .to_json()
    }

    /// Top-level keys a successful response of `variant` carries.
    pub fn expected_keys(variant: PayloadVariant) -> &'static [&'static str] {
        variant.keys()
    }

    // ── Equivalence classes ──

    pub fn invalid_bodies() -> EquivalenceClass<Value> {
        use InvalidityKind::*;
        EquivalenceClass::new("invalid bodies")
            .member("empty object", Empty, json!({}))
            .member("unknown field only", Malformed, json!({"hello": 123}))
            .member("name as list", WrongType, json!({"name": []}))
            .member("photoUrls missing", Missing, json!({"name": "doggie"}))
            .member(
                "name too long",
                OutOfRange,
                json!({
                    "name": "superlongname_".repeat(16),
                    "photoUrls": ["https://example.com/dog.jpg"]
                }),
            )
            .member(
                "photoUrls of numbers",
                WrongType,
                json!({"name": "doggie", "photoUrls": [123]}),
            )
            .member(
                "photoUrls of objects",
                WrongType,
                json!({"name": "doggie", "photoUrls": [{}]}),
            )
            .member(
                "photoUrls empty",
                Empty,
                json!({"name": "doggie", "photoUrls": []}),
            )
            .member(
                "blank name and url",
                Malformed,
                json!({"name": "                ", "photoUrls": ["              "]}),
            )
            .member("null body", WrongType, Value::Null)
            .member("empty string body", Empty, json!(""))
            .member("boolean body", WrongType, json!(false))
    }

    /// Invalid values for object/list fields (`tags`, `category`).
    pub fn invalid_values() -> EquivalenceClass<FieldValue> {
        use FieldValue::{Absent, Present};
        use InvalidityKind::*;
        EquivalenceClass::new("invalid values")
            .member("word", WrongType, Present(json!("nice")))
            .member("empty string", Empty, Present(json!("")))
            .member("undefined", Missing, Absent)
            .member("null", WrongType, Present(Value::Null))
            .member("empty list", Empty, Present(json!([])))
            .member("list of empty object", Malformed, Present(json!([{}])))
            .member("empty object", Empty, Present(json!({})))
            .member(
                "list of foreign object",
                Malformed,
                Present(json!([{"hello": false}])),
            )
            .member("number", WrongType, Present(json!(123)))
            .member("boolean", WrongType, Present(json!(false)))
    }

    pub fn invalid_statuses() -> EquivalenceClass<FieldValue> {
        use FieldValue::{Absent, Present};
        use InvalidityKind::*;
        EquivalenceClass::new("invalid statuses")
            .member("unknown word", WrongValue, Present(json!("nice")))
            .member("empty string", Empty, Present(json!("")))
            .member("undefined", Missing, Absent)
            .member("null", WrongType, Present(Value::Null))
            .member("empty list", Empty, Present(json!([])))
            .member("empty object", Empty, Present(json!({})))
            .member("valid word in a list", Malformed, Present(json!(["available"])))
            .member("number", WrongType, Present(json!(123)))
            .member("boolean", WrongType, Present(json!(false)))
    }

    /// Methods the collection endpoint must refuse for create and update.
    pub fn irrelevant_methods() -> EquivalenceClass<HttpMethod> {
        EquivalenceClass::new("irrelevant methods")
            .member("GET", InvalidityKind::WrongValue, HttpMethod::Get)
            .member("PATCH", InvalidityKind::WrongValue, HttpMethod::Patch)
    }

    /// Header sets missing what a mutating request needs.
    pub fn invalid_headers() -> EquivalenceClass<Vec<(String, String)>> {
        EquivalenceClass::new("invalid headers").member(
            "no api_key, no content-type",
            InvalidityKind::Missing,
            Vec::new(),
        )
    }

    // ── Negative case generation ──

    /// Whole-body cases; object bodies get `id` merged in when given.
    pub fn body_cases(id: Option<u64>) -> Vec<NegativeCase> {
        Self::invalid_bodies()
            .members
            .into_iter()
            .filter_map(|m| {
                let mut body = m.value;
                if let (Some(id), Some(obj)) = (id, body.as_object_mut()) {
                    obj.insert("id".into(), json!(id));
                }
                rejected(m.label, m.kind, body)
            })
            .collect()
    }

    /// Substitute each member into `field` of `base`, keeping only rejected bodies.
    pub fn field_cases(
        base: &Value,
        field: &str,
        class: &EquivalenceClass<FieldValue>,
    ) -> Vec<NegativeCase> {
        class
            .members
            .iter()
            .filter_map(|m| {
                let mut body = base.clone();
                let obj = body.as_object_mut()?;
                match &m.value {
                    FieldValue::Absent => {
                        obj.remove(field);
                    }
                    FieldValue::Present(v) => {
                        obj.insert(field.to_string(), v.clone());
                    }
                }
                rejected(format!("{field}: {}", m.label), m.kind, body)
            })
            .collect()
    }
}

fn rejected(label: String, kind: InvalidityKind, body: Value) -> Option<NegativeCase> {
    validate_pet(&body)
        .is_err()
        .then_some(NegativeCase { label, kind, body })
}
