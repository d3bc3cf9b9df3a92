//! Context resolution from the URL and from backend-confirmed records.

use crate::error::SessionError;
use crate::identity::{Project, Team};
use crate::navigation::{Navigator, UrlParams};
use crate::session::context::{ProjectRef, SessionContext, TeamRef};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

/// Which context slots a call actually wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextUpdate {
    pub team: bool,
    pub project: bool,
}

impl ContextUpdate {
    pub fn is_empty(&self) -> bool {
        !self.team && !self.project
    }
}

pub struct ContextResolver {
    root_host: String,
    scheme: String,
    subdomain_pattern: Regex,
    context: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
}

impl ContextResolver {
    pub fn new(
        root_host: impl Into<String>,
        scheme: impl Into<String>,
        context: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, SessionError> {
        let root_host = root_host.into();
        let pattern = format!(r"^([a-zA-Z0-9-]+)\.{}$", regex::escape(&root_host));
        let subdomain_pattern = Regex::new(&pattern)
            .map_err(|e| SessionError::ConfigError(format!("Invalid root host pattern: {}", e)))?;
        Ok(Self {
            root_host,
            scheme: scheme.into(),
            subdomain_pattern,
            context,
            navigator,
        })
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Team subdomain encoded in `host`, if it is a child of the root host
    pub fn subdomain_for_host(&self, host: &str) -> Option<String> {
        self.subdomain_pattern
            .captures(host)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Subdomain scope in effect: the context's team, else the current host.
    pub fn current_scope(&self, host: &str) -> Option<String> {
        self.context
            .subdomain()
            .or_else(|| self.subdomain_for_host(host))
    }

    /// Seed placeholder context from the current host and route parameters.
    /// Slots that are already set are left untouched.
    pub fn set_context(&self, host: &str, params: &UrlParams) -> ContextUpdate {
        let mut update = ContextUpdate::default();

        if let Some(subdomain) = self.subdomain_for_host(host) {
            if self.context.team().is_none() {
                update.team = self.context.set_team(TeamRef::subdomain(subdomain));
            }
        }

        if let Some(dbid) = params.get("projectId").and_then(|raw| parse_leading_int(raw)) {
            if self.context.project().is_none() {
                update.project = self.context.set_project(ProjectRef { dbid });
            }
        }

        debug!(team = update.team, project = update.project, "Context seeded from URL");
        update
    }

    /// `scheme://{subdomain}.{root}[/project/{dbid}]`; a team without a
    /// subdomain scopes to the root host itself.
    pub fn scope_url(&self, team: &Team, project: Option<&Project>) -> String {
        let host = match team.subdomain.as_deref().filter(|s| !s.is_empty()) {
            Some(subdomain) => format!("{}.{}", subdomain, self.root_host),
            None => self.root_host.clone(),
        };
        let mut url = format!("{}://{}", self.scheme, host);
        if let Some(dbid) = project.and_then(|p| p.dbid) {
            url.push_str(&format!("/project/{}", dbid));
        }
        url
    }

    /// Confirm the backend's team and project, then reload into the team's
    /// subdomain. Returns the navigation target.
    pub fn set_context_and_redirect(&self, team: &Team, project: Option<&Project>) -> String {
        let update = self.confirm_context(team, project);
        let url = self.scope_url(team, project);
        info!(
            url = %url,
            team_written = update.team,
            project_written = update.project,
            "Scoping session to team subdomain"
        );
        self.navigator.assign(&url);
        url
    }

    /// Confirm the backend's team and project without navigating.
    pub fn confirm_context(&self, team: &Team, project: Option<&Project>) -> ContextUpdate {
        ContextUpdate {
            team: self.context.confirm_team(TeamRef::from(team)),
            project: project
                .and_then(ProjectRef::from_project)
                .map(|p| self.context.confirm_project(p))
                .unwrap_or(false),
        }
    }

    /// Reload into `team`'s subdomain unless the context is already scoped to it.
    pub fn scope_to_team(&self, team: &Team) -> Option<String> {
        if self.context.subdomain() == team.subdomain {
            return None;
        }
        self.context.confirm_team(TeamRef::from(team));
        let url = self.scope_url(team, None);
        info!(url = %url, "Switching team scope");
        self.navigator.assign(&url);
        Some(url)
    }
}

/// Leading decimal digits of `raw` (optionally signed), as integer parsing of
/// route parameters does in the browser.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
