//! Navigation sink and browser location.
//!
//! The router is consumed through [`Navigator`]: `push` is client-side routing
//! within the current origin, `assign` is a full page load (needed whenever the
//! subdomain changes).

use crate::error::SessionError;
use parking_lot::Mutex;
use std::collections::HashMap;

pub trait Navigator: Send + Sync {
    /// Client-side route change
    fn push(&self, path: &str);

    /// Full page load of an absolute URL
    fn assign(&self, url: &str);
}

/// A navigation that was requested of a [`Navigator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Push(String),
    Assign(String),
}

/// Navigator that records every request; used by the CLI and tests
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    log: Mutex<Vec<Navigation>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.log.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.log.lock().len()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, path: &str) {
        self.log.lock().push(Navigation::Push(path.to_string()));
    }

    fn assign(&self, url: &str) {
        self.log.lock().push(Navigation::Assign(url.to_string()));
    }
}

/// Current browser location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub scheme: String,
    /// Host including port, e.g. `acme.checkmedia.org:3333`
    pub host: String,
    pub path: String,
}

/// Route parameters extracted by the router
pub type UrlParams = HashMap<String, String>;

impl Location {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            path: path.into(),
        }
    }

    /// Parse an absolute URL such as `https://acme.example.org/project/9`
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let url = url::Url::parse(raw).map_err(|e| SessionError::InvalidLocation(format!("{}: {}", raw, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| SessionError::InvalidLocation(format!("{}: no host", raw)))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self::new(url.scheme(), host, url.path()))
    }

    /// `scheme://host`, the target of a full reload
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Route parameters recognised in the path (`/project/:projectId`)
    pub fn url_params(&self) -> UrlParams {
        let mut params = UrlParams::new();
        let segments: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();
        for pair in segments.windows(2) {
            match pair[0] {
                "project" => {
                    params.insert("projectId".to_string(), pair[1].to_string());
                }
                "team" => {
                    params.insert("teamId".to_string(), pair[1].to_string());
                }
                _ => {}
            }
        }
        params
    }
}
