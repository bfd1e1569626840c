//! Request client: one uniform `send` for every verb
//!
//! Non-2xx statuses are ordinary responses. Only failures that leave the
//! outcome of a request unknown (DNS, refused connection, timeout, unreadable
//! body) become `TransportError`. Nothing is retried.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use petcontract_core::HttpMethod;
use serde_json::Value;

/// Hangs become transport errors after this long; the contract's own timing
/// bound is checked separately by the assertions.
pub const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Serialized as JSON when present, including `null`, `""` and `false`
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Lower-case header names
    pub headers: HashMap<String, String>,
    /// Parsed body, `None` if empty or not JSON
    pub body: Option<Value>,
    pub text: String,
    pub duration_ms: u64,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Top-level field of a JSON object body.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|b| b.get(name))
    }

    /// The body's `id` if it looks like a resource id (positive integer).
    pub fn resource_id(&self) -> Option<u64> {
        self.field("id").and_then(Value::as_u64).filter(|id| *id > 0)
    }
}

/// Sends one request and reports what came back.
pub trait Transport {
    /// # Errors
    ///
    /// Returns `TransportError` only if no complete response was observed.
    fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

/// `Transport` over a blocking reqwest client.
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(TRANSPORT_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpClient {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::Client(e.to_string()))?;

        let mut req = self.client.request(method, &request.url);
        for (k, v) in &request.headers {
            req = req.header(k, v);
        }
        if let Some(body) = &request.body {
            req = req.body(body.to_string());
        }

        let start = Instant::now();
        let resp = req.send().map_err(|e| TransportError::Send {
            method: request.method,
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        let status = resp.status().as_u16();
        let mut headers: HashMap<String, String> = HashMap::new();
        for (name, value) in resp.headers() {
            let Ok(value) = value.to_str() else {
                continue;
            };
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let text = resp.text().map_err(|e| TransportError::Body {
            method: request.method,
            url: request.url.clone(),
            message: e.to_string(),
        })?;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(Response {
            status,
            headers,
            body: serde_json::from_str(&text).ok(),
            text,
            duration_ms,
        })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP client error: {0}")]
    Client(String),
    #[error("{method} {url}: {message}")]
    Send {
        method: HttpMethod,
        url: String,
        message: String,
    },
    #[error("{method} {url}: unreadable response body: {message}")]
    Body {
        method: HttpMethod,
        url: String,
        message: String,
    },
}
