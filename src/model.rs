use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub author: String,
    #[serde(default)]
    pub assignee: Option<String>,
    /// Full label names, e.g. `type.bug`.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Id of the milestone the issue belongs to.
    #[serde(default)]
    pub milestone: Option<u64>,
    #[serde(default = "default_open")]
    pub is_open: bool,
    #[serde(default)]
    pub is_pull_request: bool,
    #[serde(default)]
    pub is_merged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub comment_count: u32,
}

fn default_open() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_open")]
    pub is_open: bool,
}

/// A repository label, identified by its full name.
///
/// Names of the form `group.name` belong to an exclusive group: an issue carries at most one
/// label of that group. Names of the form `group-name` belong to a group without that
/// restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Label { name: name.into() }
    }

    /// Splits a full label name into its group, short name and exclusivity.
    pub fn parts(full_name: &str) -> (Option<&str>, &str, bool) {
        if let Some((group, name)) = full_name.split_once('.') {
            (Some(group), name, true)
        } else if let Some((group, name)) = full_name.split_once('-') {
            (Some(group), name, false)
        } else {
            (None, full_name, false)
        }
    }

    pub fn group(&self) -> Option<&str> {
        Self::parts(&self.name).0
    }

    pub fn short_name(&self) -> &str {
        Self::parts(&self.name).1
    }

    pub fn is_exclusive(&self) -> bool {
        Self::parts(&self.name).2
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A point-in-time copy of a repository's issues and the resources filters refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Ordered as the milestone aliases should see them, usually by due date.
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub current_milestone: Option<usize>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub collaborators: Vec<User>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        let snapshot: Snapshot = serde_json::from_str(&text)
            .map_err(|source| Error::Snapshot { path: path.to_path_buf(), source })?;
        tracing::debug!(
            path = %path.display(),
            issues = snapshot.issues.len(),
            milestones = snapshot.milestones.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }
}
