//! Header composition for query-language calls.
//!
//! Headers are rebuilt on every call from a [`HeaderSource`], so the team
//! context header always reflects the context at call time.

use crate::session::context::SessionContext;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered header list; a later entry replaces an earlier one of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    pub fn extend<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.entries
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Effective value of a header, case-insensitively
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn into_header_map(self) -> Result<HeaderMap, String> {
        let mut map = HeaderMap::new();
        for (name, value) in self.entries {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| format!("invalid header name '{}': {}", name, e))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|e| format!("invalid value for header '{}': {}", name, e))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

/// Supplies the caller-configured headers for each call
pub trait HeaderSource: Send + Sync {
    fn headers(&self) -> HeaderSet;
}

/// Fixed headers, used before a session is known
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders(pub HeaderSet);

impl HeaderSource for StaticHeaders {
    fn headers(&self) -> HeaderSet {
        self.0.clone()
    }
}

/// Defaults, then the session token, then the current team's dbid.
pub struct SessionHeaders {
    defaults: BTreeMap<String, String>,
    token_header: String,
    team_header: String,
    token: Option<String>,
    context: Arc<SessionContext>,
}

impl SessionHeaders {
    pub fn new(
        defaults: BTreeMap<String, String>,
        token_header: impl Into<String>,
        team_header: impl Into<String>,
        token: Option<String>,
        context: Arc<SessionContext>,
    ) -> Self {
        Self {
            defaults,
            token_header: token_header.into(),
            team_header: team_header.into(),
            token,
            context,
        }
    }
}

impl HeaderSource for SessionHeaders {
    fn headers(&self) -> HeaderSet {
        let mut set = HeaderSet::new().extend(self.defaults.clone());
        if let Some(token) = &self.token {
            set = set.with(self.token_header.clone(), token.clone());
        }
        if let Some(dbid) = self.context.team().and_then(|team| team.dbid) {
            set = set.with(self.team_header.clone(), dbid.to_string());
        }
        set
    }
}
