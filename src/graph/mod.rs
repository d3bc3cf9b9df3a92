//! Batched Query-Language Network Layer
//!
//! Every request in a batch is posted independently and concurrently as
//! `{ query, variables }` JSON. Each request settles on its own continuation;
//! the batch future only waits for all of them and never fails itself.
//! Requests are processed in arrival order, not dispatch order.

pub mod headers;
pub mod request;
pub mod response;

pub use headers::{HeaderSet, HeaderSource, SessionHeaders, StaticHeaders};
pub use request::{PendingQuery, QueryHandle, QueryRequest, QueryResponse};
pub use response::GraphResponse;

use crate::error::{QueryError, SessionError};
use crate::navigation::Navigator;
use futures::future::join_all;
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct GraphClient {
    client: Client,
    endpoint: String,
    headers: RwLock<Arc<dyn HeaderSource>>,
    navigator: Arc<dyn Navigator>,
    not_found_path: String,
    timeout: Option<Duration>,
}

impl GraphClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(
        endpoint: impl Into<String>,
        navigator: Arc<dyn Navigator>,
        not_found_path: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, SessionError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| SessionError::ClientError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            headers: RwLock::new(Arc::new(StaticHeaders::default())),
            navigator,
            not_found_path: not_found_path.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Replace the header provider used by every subsequent request
    pub fn configure(&self, headers: Arc<dyn HeaderSource>) {
        *self.headers.write() = headers;
        info!(endpoint = %self.endpoint, "Query-language headers reconfigured");
    }

    /// Headers the next request would carry, caller-configured ones first
    pub fn current_headers(&self) -> HeaderSet {
        let source = self.headers.read().clone();
        source
            .headers()
            .with(ACCEPT.as_str(), "*/*")
            .with(CONTENT_TYPE.as_str(), "application/json")
    }

    /// Dispatch every request concurrently and wait until each has settled.
    pub async fn send_queries(&self, requests: Vec<Arc<dyn QueryRequest>>) {
        debug!(count = requests.len(), "Sending query batch");
        join_all(requests.into_iter().map(|request| self.send_query(request))).await;
    }

    async fn send_query(&self, request: Arc<dyn QueryRequest>) {
        let body = match self.fetch(request.as_ref()).await {
            Ok(body) => body,
            Err(e) => {
                warn!(query = request.debug_name(), error = %e, "Query failed");
                request.reject(e);
                return;
            }
        };

        match GraphResponse::classify(body) {
            GraphResponse::Data(data) => {
                debug!(query = request.debug_name(), "Query resolved");
                request.resolve(QueryResponse { response: data });
            }
            GraphResponse::QueryErrors(payload) => {
                warn!(query = request.debug_name(), "Query returned errors");
                request.reject(QueryError::Application {
                    debug_name: request.debug_name().to_string(),
                    payload,
                });
            }
            GraphResponse::Malformed => {
                warn!(query = request.debug_name(), "Query response missing data");
                request.reject(QueryError::MissingData {
                    debug_name: request.debug_name().to_string(),
                });
            }
        }
    }

    async fn fetch(&self, request: &dyn QueryRequest) -> Result<Value, QueryError> {
        let headers = self
            .current_headers()
            .into_header_map()
            .map_err(QueryError::Transport)?;
        let payload = json!({
            "query": request.query_string(),
            "variables": request.variables(),
        });

        let mut builder = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .body(payload.to_string());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(request, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(query = request.debug_name(), "Query endpoint answered 404");
            self.navigator.push(&self.not_found_path);
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| transport_error(request, e))
    }
}

fn transport_error(request: &dyn QueryRequest, error: reqwest::Error) -> QueryError {
    if error.is_timeout() {
        QueryError::Timeout {
            debug_name: request.debug_name().to_string(),
        }
    } else {
        QueryError::Transport(error.to_string())
    }
}
