//! REST Dispatcher
//!
//! Single-shot calls against the backend's REST API. Every call is exactly one
//! network attempt with a fixed 120 second timeout and the cookie jar enabled.
//! Outcomes are funneled into a `Result` (or the two callbacks of
//! [`RestClient::dispatch`]); nothing panics out of a request.

use crate::error::{RestFailure, SessionError};
use reqwest::multipart::Form;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

pub const REST_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Ordered key/value payload of a REST call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `key=value&` for every field, in insertion order. Values are not
    /// percent-encoded; servers parse this exact shape.
    pub fn query_string(&self) -> String {
        let mut query = String::new();
        for (key, value) in &self.fields {
            query.push_str(key);
            query.push('=');
            query.push_str(value);
            query.push('&');
        }
        query
    }

    fn to_multipart(&self) -> Form {
        self.fields
            .iter()
            .fold(Form::new(), |form, (key, value)| form.text(key.clone(), value.clone()))
    }

    fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Generic REST request dispatcher
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

fn build_rest_http_client() -> Result<Client, SessionError> {
    Client::builder()
        .cookie_store(true)
        .timeout(REST_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SessionError::ClientError(format!("Failed to create HTTP client: {}", e)))
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SessionError> {
        Ok(Self {
            client: build_rest_http_client()?,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL and endpoint joined by exactly one slash
    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Issue one request and classify its outcome.
    ///
    /// `Ok` carries the body's `data` member of a 200 response; every other
    /// outcome is a [`RestFailure`] with the message to show the user.
    pub async fn request(
        &self,
        method: &str,
        endpoint: &str,
        data: FormData,
        headers: &BTreeMap<String, String>,
    ) -> Result<Value, RestFailure> {
        let method = method.to_lowercase();
        let mut url = self.url_for(endpoint);

        let mut builder = match method.as_str() {
            "get" => {
                if !data.is_empty() {
                    url.push('?');
                    url.push_str(&data.query_string());
                }
                self.client.get(&url)
            }
            "post" => self.client.post(&url).multipart(data.to_multipart()),
            "put" | "patch" | "delete" => {
                let verb = match method.as_str() {
                    "put" => Method::PUT,
                    "patch" => Method::PATCH,
                    _ => Method::DELETE,
                };
                let builder = self.client.request(verb, &url);
                if data.is_empty() {
                    builder
                } else {
                    builder.json(&data.to_json())
                }
            }
            other => {
                return Err(RestFailure::transport(format!(
                    "Unsupported request method: {}",
                    other
                )))
            }
        };

        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(method = %method, url = %url, "Dispatching REST request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %method, url = %url, error = %e, "REST request failed without response");
                return Err(RestFailure::transport(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RestFailure::transport(e.to_string()))?;

        if status == 200 {
            let body: Value = serde_json::from_str(&text).map_err(|e| {
                RestFailure::application(format!("Invalid JSON response: {}", e))
            })?;
            debug!(method = %method, url = %url, "REST request succeeded");
            return Ok(body.get("data").cloned().unwrap_or(Value::Null));
        }

        let message = failure_message(&text, status);
        warn!(method = %method, url = %url, status, message = %message, "REST request rejected");
        Err(RestFailure::http(status, message))
    }

    /// Callback form of [`RestClient::request`]: exactly one of the two
    /// callbacks runs, with the failure message or the response data.
    pub async fn dispatch<F, S>(
        &self,
        method: &str,
        endpoint: &str,
        on_failure: F,
        on_success: S,
        data: FormData,
        headers: &BTreeMap<String, String>,
    ) where
        F: FnOnce(String),
        S: FnOnce(Value),
    {
        match self.request(method, endpoint, data, headers).await {
            Ok(data) => on_success(data),
            Err(failure) => on_failure(failure.message),
        }
    }
}

/// `data.message` when the body has a `data` member, otherwise `error`.
pub fn failure_message(body: &str, status: u16) -> String {
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(e) => return format!("Invalid JSON response: {}", e),
    };

    let message = match json.get("data").filter(|data| !data.is_null()) {
        Some(data) => data.get("message").and_then(value_as_message),
        None => json.get("error").and_then(value_as_message),
    };

    message.unwrap_or_else(|| format!("request failed with status {}", status))
}

fn value_as_message(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
