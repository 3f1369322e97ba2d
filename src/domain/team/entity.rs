//! Team entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::reference::CategoryId;

/// Team identifier assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(i64);

impl TeamId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team about to be inserted; (name, category) must be unique
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewTeam {
    pub name: String,
    pub category_id: CategoryId,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, category_id: CategoryId) -> Self {
        Self {
            name: name.into(),
            category_id,
        }
    }
}

/// Team entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier
    id: TeamId,
    /// Team name, unique within its category
    name: String,
    /// Category the team competes in
    category_id: CategoryId,
    /// Creation timestamp
    created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(
        id: TeamId,
        name: impl Into<String>,
        category_id: CategoryId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category_id,
            created_at,
        }
    }

    /// Materialize a freshly inserted team
    pub fn from_new(id: TeamId, team: NewTeam, created_at: DateTime<Utc>) -> Self {
        Self::new(id, team.name, team.category_id, created_at)
    }

    // Getters

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this team is the one a (name, category) lookup refers to
    pub fn matches(&self, name: &str, category_id: CategoryId) -> bool {
        self.name == name && self.category_id == category_id
    }
}
