//! Session context: which team and project the client is scoped to.
//!
//! Each slot is written at most once per session. A placeholder (derived from
//! the URL) may later be upgraded to a backend-confirmed value; a confirmed
//! value is never replaced. Every setter reports whether the write took effect.

use crate::identity::{Project, Team};
use parking_lot::RwLock;

/// Identifying keys of a team, not the team record itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRef {
    pub dbid: Option<i64>,
    pub subdomain: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectRef {
    pub dbid: i64,
}

impl TeamRef {
    pub fn new(dbid: Option<i64>, subdomain: Option<String>) -> Self {
        Self { dbid, subdomain }
    }

    /// Placeholder known only by its subdomain
    pub fn subdomain(subdomain: impl Into<String>) -> Self {
        Self {
            dbid: None,
            subdomain: Some(subdomain.into()),
        }
    }
}

impl From<&Team> for TeamRef {
    fn from(team: &Team) -> Self {
        Self {
            dbid: team.dbid,
            subdomain: team.subdomain.clone(),
        }
    }
}

impl ProjectRef {
    pub fn from_project(project: &Project) -> Option<Self> {
        project.dbid.map(|dbid| Self { dbid })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot<T> {
    Empty,
    Placeholder(T),
    Confirmed(T),
}

impl<T: Clone> Slot<T> {
    fn value(&self) -> Option<T> {
        match self {
            Slot::Empty => None,
            Slot::Placeholder(v) | Slot::Confirmed(v) => Some(v.clone()),
        }
    }

    fn set(&mut self, value: T) -> bool {
        match self {
            Slot::Empty => {
                *self = Slot::Placeholder(value);
                true
            }
            _ => false,
        }
    }

    fn confirm(&mut self, value: T) -> bool {
        match self {
            Slot::Empty | Slot::Placeholder(_) => {
                *self = Slot::Confirmed(value);
                true
            }
            Slot::Confirmed(_) => false,
        }
    }

    fn is_confirmed(&self) -> bool {
        matches!(self, Slot::Confirmed(_))
    }
}

/// Point-in-time copy of the context
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextSnapshot {
    pub team: Option<TeamRef>,
    pub project: Option<ProjectRef>,
}

#[derive(Debug)]
pub struct SessionContext {
    team: RwLock<Slot<TeamRef>>,
    project: RwLock<Slot<ProjectRef>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            team: RwLock::new(Slot::Empty),
            project: RwLock::new(Slot::Empty),
        }
    }

    pub fn team(&self) -> Option<TeamRef> {
        self.team.read().value()
    }

    pub fn project(&self) -> Option<ProjectRef> {
        self.project.read().value()
    }

    /// Subdomain the context is scoped to, if any
    pub fn subdomain(&self) -> Option<String> {
        self.team().and_then(|team| team.subdomain)
    }

    pub fn team_is_confirmed(&self) -> bool {
        self.team.read().is_confirmed()
    }

    pub fn project_is_confirmed(&self) -> bool {
        self.project.read().is_confirmed()
    }

    /// Write a placeholder team; only an empty slot accepts it.
    pub fn set_team(&self, team: TeamRef) -> bool {
        self.team.write().set(team)
    }

    /// Write a placeholder project; only an empty slot accepts it.
    pub fn set_project(&self, project: ProjectRef) -> bool {
        self.project.write().set(project)
    }

    /// Write a backend-confirmed team over an empty slot or a placeholder.
    pub fn confirm_team(&self, team: TeamRef) -> bool {
        self.team.write().confirm(team)
    }

    /// Write a backend-confirmed project over an empty slot or a placeholder.
    pub fn confirm_project(&self, project: ProjectRef) -> bool {
        self.project.write().confirm(project)
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            team: self.team(),
            project: self.project(),
        }
    }
}
