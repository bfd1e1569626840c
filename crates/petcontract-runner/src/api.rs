//! The pet resource's four verbs over any `Transport`

use petcontract_core::{ConfigError, EnvironmentConfig, HttpMethod, PET_ROUTE};
use serde_json::Value;

use crate::client::{Request, Response, Transport, TransportError};

/// URL templating and default headers for the pet collection.
pub struct PetApi<'t> {
    transport: &'t dyn Transport,
    collection_url: String,
    api_key: String,
}

impl<'t> PetApi<'t> {
    pub fn new(
        transport: &'t dyn Transport,
        collection_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            collection_url: collection_url.into(),
            api_key: api_key.into(),
        }
    }

    /// # Errors
    ///
    /// Returns error if the environment has no pet route.
    pub fn from_config(
        transport: &'t dyn Transport,
        config: &EnvironmentConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            transport,
            config.resource_url(PET_ROUTE)?,
            config.api_key.clone(),
        ))
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    pub fn item_url(&self, id: u64) -> String {
        format!("{}/{id}", self.collection_url)
    }

    /// Headers of a well-formed mutating request.
    pub fn json_headers(&self) -> Vec<(String, String)> {
        vec![
            ("Content-Type".into(), "application/json".into()),
            ("accept".into(), "application/json".into()),
            ("api_key".into(), self.api_key.clone()),
        ]
    }

    fn accept_only() -> Vec<(String, String)> {
        vec![("accept".into(), "application/json".into())]
    }

    /// `POST <collection>`
    ///
    /// # Errors
    ///
    /// Returns error if no response was observed.
    pub fn create(&self, body: &Value) -> Result<Response, TransportError> {
        self.send_to_collection(HttpMethod::Post, self.json_headers(), Some(body))
    }

    /// `PUT <collection>`
    ///
    /// # Errors
    ///
    /// Returns error if no response was observed.
    pub fn update(&self, body: &Value) -> Result<Response, TransportError> {
        self.send_to_collection(HttpMethod::Put, self.json_headers(), Some(body))
    }

    /// `GET <collection>/<id>`
    ///
    /// # Errors
    ///
    /// Returns error if no response was observed.
    pub fn fetch(&self, id: u64) -> Result<Response, TransportError> {
        self.send(HttpMethod::Get, self.item_url(id), Self::accept_only(), None)
    }

    /// `DELETE <collection>/<id>`
    ///
    /// # Errors
    ///
    /// Returns error if no response was observed.
    pub fn delete(&self, id: u64) -> Result<Response, TransportError> {
        self.send(HttpMethod::Delete, self.item_url(id), Self::accept_only(), None)
    }

    /// Any verb against the collection with explicit headers.
    ///
    /// # Errors
    ///
    /// Returns error if no response was observed.
    pub fn send_to_collection(
        &self,
        method: HttpMethod,
        headers: Vec<(String, String)>,
        body: Option<&Value>,
    ) -> Result<Response, TransportError> {
        self.send(method, self.collection_url.clone(), headers, body.cloned())
    }

    fn send(
        &self,
        method: HttpMethod,
        url: String,
        headers: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<Response, TransportError> {
        let request = Request {
            method,
            url,
            headers,
            body,
        };
        let result = self.transport.send(&request);
        match &result {
            Ok(resp) => tracing::debug!(
                method = %request.method,
                url = %request.url,
                status = resp.status,
                duration_ms = resp.duration_ms,
                "response"
            ),
            Err(e) => tracing::warn!(
                method = %request.method,
                url = %request.url,
                error = %e,
                "transport failure"
            ),
        }
        result
    }
}
