//! In-memory pet API that honours the wire contract, with switchable faults.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use petcontract_core::contract::EXPECTED_HEADERS;
use petcontract_core::{HttpMethod, validate_pet};
use petcontract_runner::{NOT_FOUND_MESSAGE, Request, Response, Transport, TransportError};
use serde_json::{Value, json};

pub const BASE_URL: &str = "http://petstore.test/v2";
pub const COLLECTION: &str = "http://petstore.test/v2/pet";
pub const API_KEY: &str = "special-key";

#[derive(Debug, Default, Clone, Copy)]
pub struct Faults {
    /// DELETE answers 200 but keeps the pet
    pub sticky_delete: bool,
    /// Create stores any JSON object, valid or not
    pub lenient_create: bool,
    /// Every request after this many fails at the transport level
    pub offline_after: Option<usize>,
    /// `content-type` carries a `; charset=utf-8` suffix
    pub charset_content_type: bool,
}

#[derive(Debug, Default)]
struct State {
    pets: BTreeMap<u64, Value>,
    next_id: u64,
    log: Vec<(HttpMethod, String)>,
    created: Vec<u64>,
}

/// Cheap to clone; clones share one store.
#[derive(Debug, Clone, Default)]
pub struct FakePetStore {
    state: Rc<RefCell<State>>,
    faults: Faults,
}

fn reply(status: u16, body: Value) -> Response {
    let headers: HashMap<String, String> = EXPECTED_HEADERS
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    Response {
        status,
        headers,
        text: body.to_string(),
        body: Some(body),
        duration_ms: 3,
    }
}

fn not_found() -> Response {
    reply(404, json!({"code": 1, "type": "error", "message": NOT_FOUND_MESSAGE}))
}

fn not_allowed() -> Response {
    reply(405, json!({"code": 405, "type": "unknown", "message": "no data"}))
}

fn bad_input() -> Response {
    reply(400, json!({"code": 400, "type": "unknown", "message": "bad input"}))
}

impl FakePetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            faults,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.state.borrow().pets.len()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.state.borrow().pets.contains_key(&id)
    }

    /// Every id the store ever created, in order.
    pub fn created(&self) -> Vec<u64> {
        self.state.borrow().created.clone()
    }

    pub fn log(&self) -> Vec<(HttpMethod, String)> {
        self.state.borrow().log.clone()
    }

    fn authorized(request: &Request) -> bool {
        let has = |name: &str, value: &str| {
            request
                .headers
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case(name) && v == value)
        };
        has("api_key", API_KEY) && has("content-type", "application/json")
    }

    fn store(&self, mut pet: Value, id: u64) -> Response {
        pet["id"] = json!(id);
        let mut state = self.state.borrow_mut();
        if !state.created.contains(&id) {
            state.created.push(id);
        }
        state.pets.insert(id, pet.clone());
        reply(200, pet)
    }

    fn create(&self, body: &Value) -> Response {
        let acceptable = if self.faults.lenient_create {
            body.is_object()
        } else {
            validate_pet(body).is_ok()
        };
        if !acceptable {
            return bad_input();
        }
        let id = match body.get("id").and_then(Value::as_u64) {
            Some(id) if self.contains(id) => return not_allowed(),
            Some(id) => id,
            None => {
                let mut state = self.state.borrow_mut();
                state.next_id += 1;
                state.next_id
            }
        };
        self.store(body.clone(), id)
    }

    fn update(&self, body: &Value) -> Response {
        if validate_pet(body).is_err() {
            return bad_input();
        }
        match body.get("id").and_then(Value::as_u64) {
            Some(id) if self.contains(id) => self.store(body.clone(), id),
            _ => not_found(),
        }
    }

    fn item(&self, method: HttpMethod, id: u64) -> Response {
        match method {
            HttpMethod::Get => match self.state.borrow().pets.get(&id) {
                Some(pet) => reply(200, pet.clone()),
                None => not_found(),
            },
            HttpMethod::Delete => {
                if !self.contains(id) {
                    return not_found();
                }
                if !self.faults.sticky_delete {
                    self.state.borrow_mut().pets.remove(&id);
                }
                reply(200, json!({"code": 200, "type": "unknown", "message": id.to_string()}))
            }
            _ => not_allowed(),
        }
    }
}

impl Transport for FakePetStore {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let sent = {
            let mut state = self.state.borrow_mut();
            state.log.push((request.method, request.url.clone()));
            state.log.len()
        };
        if self.faults.offline_after.is_some_and(|n| sent > n) {
            return Err(TransportError::Send {
                method: request.method,
                url: request.url.clone(),
                message: "connection refused".into(),
            });
        }

        let mut response = self.route(request);
        if self.faults.charset_content_type {
            response.headers.insert(
                "content-type".into(),
                "application/json; charset=utf-8".into(),
            );
        }
        Ok(response)
    }
}

impl FakePetStore {
    fn route(&self, request: &Request) -> Response {
        if request.url == COLLECTION {
            let body = request.body.clone().unwrap_or(Value::Null);
            return match request.method {
                HttpMethod::Post | HttpMethod::Put if !Self::authorized(request) => not_allowed(),
                HttpMethod::Post => self.create(&body),
                HttpMethod::Put => self.update(&body),
                _ => not_allowed(),
            };
        }

        let id = request
            .url
            .strip_prefix(COLLECTION)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|id| id.parse::<u64>().ok());
        match id {
            Some(id) => self.item(request.method, id),
            None => not_found(),
        }
    }
}

/// Environment directory with `dev.json` and `routes.json` pointing at the fake.
pub fn config_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("dev.json"),
        json!({"baseUrl": BASE_URL, "env": {"api_key": API_KEY, "user_1": "alice"}}).to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("routes.json"),
        json!({"v2": {"pet": "/pet"}}).to_string(),
    )
    .unwrap();
    dir
}
