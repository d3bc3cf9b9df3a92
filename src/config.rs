//! Configuration System
//!
//! Endpoints, host scoping, header names and storage locations for the session
//! core. Values are layered from defaults, the user's global file, an optional
//! explicit file and `CHECKDESK__*` environment variables.

use crate::logging::LoggingConfig;
use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckdeskConfig {
    /// Base URL of the REST API; endpoints are appended to it
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,

    /// Query-language endpoint
    #[serde(default = "default_graph_endpoint")]
    pub graph_endpoint: String,

    /// Host every team subdomain hangs off (may carry a port)
    #[serde(default = "default_root_host")]
    pub root_host: String,

    /// URL scheme used when building full-page navigation targets
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Header carrying the session token on query-language calls
    #[serde(default = "default_token_header")]
    pub token_header: String,

    /// Header carrying the current team's dbid on query-language calls
    #[serde(default = "default_team_header")]
    pub team_header: String,

    /// Headers sent on every query-language call
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    /// Per-request timeout for query-language calls; absent means none
    #[serde(default)]
    pub graph_timeout_secs: Option<u64>,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Application paths the session core navigates to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_root_path")]
    pub root: String,

    #[serde(default = "default_team_creation_path")]
    pub team_creation: String,

    #[serde(default = "default_not_found_path")]
    pub not_found: String,
}

/// Token persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory holding the session token
    #[serde(default = "default_token_db")]
    pub token_db: PathBuf,
}

fn default_rest_base_url() -> String {
    "http://localhost:3000/api/".to_string()
}

fn default_graph_endpoint() -> String {
    "http://localhost:3000/api/graphql".to_string()
}

fn default_root_host() -> String {
    "localhost:3333".to_string()
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_token_header() -> String {
    "X-Checkdesk-Token".to_string()
}

fn default_team_header() -> String {
    "X-Checkdesk-Context-Team".to_string()
}

fn default_root_path() -> String {
    "/".to_string()
}

fn default_team_creation_path() -> String {
    "/teams/new".to_string()
}

fn default_not_found_path() -> String {
    "/404".to_string()
}

pub(crate) fn default_token_db() -> PathBuf {
    directories::ProjectDirs::from("org", "meedan", "checkdesk")
        .map(|dirs| dirs.data_dir().join("session"))
        .unwrap_or_else(|| PathBuf::from(".checkdesk/session"))
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: default_root_path(),
            team_creation: default_team_creation_path(),
            not_found: default_not_found_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_db: default_token_db(),
        }
    }
}

impl Default for CheckdeskConfig {
    fn default() -> Self {
        Self {
            rest_base_url: default_rest_base_url(),
            graph_endpoint: default_graph_endpoint(),
            root_host: default_root_host(),
            scheme: default_scheme(),
            token_header: default_token_header(),
            team_header: default_team_header(),
            default_headers: BTreeMap::new(),
            graph_timeout_secs: None,
            paths: PathsConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Endpoint(String, String),
    Host(String),
    Header(String, String),
    Path(String, String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Endpoint(name, msg) => write!(f, "Endpoint '{}': {}", name, msg),
            ValidationError::Host(msg) => write!(f, "Host: {}", msg),
            ValidationError::Header(name, msg) => write!(f, "Header '{}': {}", name, msg),
            ValidationError::Path(name, msg) => write!(f, "Path '{}': {}", name, msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CheckdeskConfig {
    /// Query-language timeout, if one is configured
    pub fn graph_timeout(&self) -> Option<Duration> {
        self.graph_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, endpoint) in [
            ("rest_base_url", &self.rest_base_url),
            ("graph_endpoint", &self.graph_endpoint),
        ] {
            if let Err(e) = url::Url::parse(endpoint) {
                errors.push(ValidationError::Endpoint(
                    name.to_string(),
                    format!("'{}' is not a valid URL: {}", endpoint, e),
                ));
            }
        }

        if self.root_host.trim().is_empty() {
            errors.push(ValidationError::Host("root_host cannot be empty".to_string()));
        }
        if self.scheme != "http" && self.scheme != "https" {
            errors.push(ValidationError::Host(format!(
                "scheme must be 'http' or 'https', got '{}'",
                self.scheme
            )));
        }

        let header_names = [&self.token_header, &self.team_header]
            .into_iter()
            .chain(self.default_headers.keys());
        for name in header_names {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                errors.push(ValidationError::Header(
                    name.clone(),
                    "not a valid HTTP header name".to_string(),
                ));
            }
        }

        for (name, path) in [
            ("root", &self.paths.root),
            ("team_creation", &self.paths.team_creation),
            ("not_found", &self.paths.not_found),
        ] {
            if !path.starts_with('/') {
                errors.push(ValidationError::Path(
                    name.to_string(),
                    format!("'{}' must start with '/'", path),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
