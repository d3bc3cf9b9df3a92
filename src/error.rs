//! Error types for the Checkdesk session and transport core.

use thiserror::Error;

/// Status marker attached to query-language errors that arrived inside a
/// successful HTTP response.
pub const APPLICATION_FAILURE_STATUS: &str = "200";

/// Where a REST failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No HTTP response was obtained (offline, DNS, refused connection, timeout)
    Transport,
    /// A response arrived with a non-200 status
    Http { status: u16 },
    /// The backend answered 200 but the body could not be used
    Application,
}

/// Failure delivered to a REST caller's failure callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RestFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RestFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Http { status },
            message: message.into(),
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Application,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::Http { status } => Some(status),
            _ => None,
        }
    }
}

/// Per-request failure of a batched query-language call.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("Query transport failed: {0}")]
    Transport(String),

    #[error(
        "Server request for query `{debug_name}` failed (status {status}): {payload}",
        status = APPLICATION_FAILURE_STATUS
    )]
    Application {
        debug_name: String,
        payload: serde_json::Value,
    },

    #[error("Server response was missing for query `{debug_name}`.")]
    MissingData { debug_name: String },

    #[error("Query `{debug_name}` timed out")]
    Timeout { debug_name: String },
}

impl QueryError {
    /// Error entries carried by an application-level failure.
    pub fn errors(&self) -> Option<&Vec<serde_json::Value>> {
        match self {
            QueryError::Application { payload, .. } => {
                payload.get("errors").and_then(|errors| errors.as_array())
            }
            _ => None,
        }
    }
}

/// Token persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Token store error: {0}")]
    Backend(String),

    #[error("Stored token is not valid UTF-8")]
    InvalidToken,
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Errors raised while assembling a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("HTTP client error: {0}")]
    ClientError(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

impl From<config::ConfigError> for SessionError {
    fn from(err: config::ConfigError) -> Self {
        SessionError::ConfigError(err.to_string())
    }
}
