//! Post-login redirect decision.
//!
//! [`decide`] is pure: it maps the location, the fetched identity and the
//! current subdomain scope to a [`Redirect`]. [`RedirectDecider`] applies
//! decisions and never repeats one for an unchanged (location, identity) pair.

use crate::config::PathsConfig;
use crate::identity::{Identity, Project, Team};
use crate::navigation::{Location, Navigator};
use crate::session::resolver::ContextResolver;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectState {
    NoIdentity,
    IdentityNoTeam,
    IdentityTeamNoProjectNoSubdomain,
    IdentityTeamWithSubdomain,
}

/// What the caller should do after the identity fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Redirect {
    Stay,
    /// Client-side navigation to an in-app path
    Push(String),
    /// Full reload into the team's subdomain
    Scope { team: Team, project: Option<Project> },
}

pub fn classify(identity: Option<&Identity>, scope: Option<&str>) -> RedirectState {
    match identity {
        None => RedirectState::NoIdentity,
        Some(identity) => match (&identity.current_team, scope) {
            (None, _) => RedirectState::IdentityNoTeam,
            (Some(_), None) => RedirectState::IdentityTeamNoProjectNoSubdomain,
            (Some(_), Some(_)) => RedirectState::IdentityTeamWithSubdomain,
        },
    }
}

/// Decide where to send the user. Only the application root is redirected.
pub fn decide(
    location: &Location,
    identity: Option<&Identity>,
    scope: Option<&str>,
    paths: &PathsConfig,
) -> Redirect {
    if location.path != paths.root {
        return Redirect::Stay;
    }

    match classify(identity, scope) {
        RedirectState::NoIdentity | RedirectState::IdentityTeamWithSubdomain => Redirect::Stay,
        RedirectState::IdentityNoTeam => {
            // Reachable only when `paths.root` is configured as the team-creation path.
            if location.path == paths.team_creation {
                Redirect::Stay
            } else {
                Redirect::Push(paths.team_creation.clone())
            }
        }
        RedirectState::IdentityTeamNoProjectNoSubdomain => {
            match identity.and_then(|i| i.current_team.as_ref()) {
                Some(team) => Redirect::Scope {
                    team: team.clone(),
                    project: team.first_project().cloned(),
                },
                None => Redirect::Stay,
            }
        }
    }
}

pub struct RedirectDecider {
    resolver: Arc<ContextResolver>,
    navigator: Arc<dyn Navigator>,
    paths: PathsConfig,
    last: Mutex<Option<(Location, Option<Identity>)>>,
}

impl RedirectDecider {
    pub fn new(
        resolver: Arc<ContextResolver>,
        navigator: Arc<dyn Navigator>,
        paths: PathsConfig,
    ) -> Self {
        Self {
            resolver,
            navigator,
            paths,
            last: Mutex::new(None),
        }
    }

    /// Decide and navigate. Returns the decision that was applied; a repeat
    /// evaluation of the previous pair applies nothing and returns `Stay`.
    pub fn maybe_redirect(&self, location: &Location, identity: Option<&Identity>) -> Redirect {
        {
            let mut last = self.last.lock();
            let unchanged = last
                .as_ref()
                .is_some_and(|(loc, id)| loc == location && id.as_ref() == identity);
            if unchanged {
                debug!(path = %location.path, "Redirect already evaluated for this location");
                return Redirect::Stay;
            }
            *last = Some((location.clone(), identity.cloned()));
        }

        let scope = self.resolver.current_scope(&location.host);
        let decision = decide(location, identity, scope.as_deref(), &self.paths);
        match &decision {
            Redirect::Stay => {}
            Redirect::Push(path) => {
                info!(path = %path, "Redirecting to team creation");
                self.navigator.push(path);
            }
            Redirect::Scope { team, project } => {
                let target = self.resolver.scope_url(team, project.as_ref());
                if is_current_url(location, &target) {
                    info!(url = %target, "Already at team scope; confirming context only");
                    self.resolver.confirm_context(team, project.as_ref());
                    return Redirect::Stay;
                }
                self.resolver.set_context_and_redirect(team, project.as_ref());
            }
        }
        decision
    }
}

/// A reload of `target` would land on `location` again.
fn is_current_url(location: &Location, target: &str) -> bool {
    let current = format!("{}{}", location.origin(), location.path);
    current.trim_end_matches('/') == target.trim_end_matches('/')
}
