//! Query requests and their continuations.

use crate::error::QueryError;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Successful settlement of one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub response: Value,
}

/// A query handed to [`GraphClient::send_queries`](super::GraphClient::send_queries).
///
/// Exactly one of `resolve` / `reject` is called per dispatch.
pub trait QueryRequest: Send + Sync {
    fn query_string(&self) -> &str;
    fn variables(&self) -> Value;
    fn debug_name(&self) -> &str;
    fn resolve(&self, result: QueryResponse);
    fn reject(&self, error: QueryError);
}

type Settlement = Result<QueryResponse, QueryError>;

/// Query whose settlement is delivered through a one-shot channel
pub struct PendingQuery {
    query: String,
    variables: Value,
    debug_name: String,
    settle: Mutex<Option<oneshot::Sender<Settlement>>>,
}

/// Receiving half of a [`PendingQuery`]
pub struct QueryHandle {
    debug_name: String,
    receiver: oneshot::Receiver<Settlement>,
}

impl PendingQuery {
    pub fn new(
        query: impl Into<String>,
        variables: Value,
        debug_name: impl Into<String>,
    ) -> (Arc<Self>, QueryHandle) {
        let (sender, receiver) = oneshot::channel();
        let debug_name = debug_name.into();
        let query = Arc::new(Self {
            query: query.into(),
            variables,
            debug_name: debug_name.clone(),
            settle: Mutex::new(Some(sender)),
        });
        (query, QueryHandle { debug_name, receiver })
    }

    fn settle(&self, outcome: Settlement) {
        if let Some(sender) = self.settle.lock().take() {
            // The caller may have stopped listening; the outcome is simply dropped.
            let _ = sender.send(outcome);
        }
    }
}

impl QueryRequest for PendingQuery {
    fn query_string(&self) -> &str {
        &self.query
    }

    fn variables(&self) -> Value {
        self.variables.clone()
    }

    fn debug_name(&self) -> &str {
        &self.debug_name
    }

    fn resolve(&self, result: QueryResponse) {
        self.settle(Ok(result));
    }

    fn reject(&self, error: QueryError) {
        self.settle(Err(error));
    }
}

impl QueryHandle {
    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// Wait for the query to settle
    pub async fn outcome(self) -> Result<QueryResponse, QueryError> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(QueryError::Transport(format!(
                "query `{}` was dropped before settling",
                self.debug_name
            ))),
        }
    }
}
