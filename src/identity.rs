//! Identity model returned by the "me" call.
//!
//! The session owns the fetched identity; the view layer reads it through an
//! [`IdentityStore`].

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated user as returned by `GET me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque session credential; absent for some sign-in states
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub current_team: Option<Team>,

    /// Remaining profile fields, kept for the view layer
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// Team record as embedded in the identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub dbid: Option<i64>,

    #[serde(default)]
    pub subdomain: Option<String>,

    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub dbid: Option<i64>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Identity {
    pub fn new(token: impl Into<String>, current_team: Option<Team>) -> Self {
        Self {
            token: Some(token.into()),
            current_team,
            profile: Map::new(),
        }
    }
}

impl Team {
    pub fn first_project(&self) -> Option<&Project> {
        self.projects.first()
    }
}

impl Project {
    pub fn with_dbid(dbid: i64) -> Self {
        Self {
            dbid: Some(dbid),
            fields: Map::new(),
        }
    }
}

/// Read/write access to the current user reference
pub trait IdentityStore: Send + Sync {
    fn get(&self) -> Option<Identity>;
    fn set(&self, identity: Option<Identity>);
}

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    current: RwLock<Option<Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get(&self) -> Option<Identity> {
        self.current.read().clone()
    }

    fn set(&self, identity: Option<Identity>) {
        *self.current.write() = identity;
    }
}
