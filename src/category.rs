//! Sync categories and the classification rules
use std::{fmt, path::PathBuf};

use crate::git::Remote;

/// Sync state of a local repository relative to the hosted service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Hosted counterpart exists and a remote reaches it
    AlreadySynced,

    /// Hosted counterpart exists but no remote reaches it
    NeedsReconnection,

    /// No hosted counterpart, local history to publish
    ReadyToPush,

    /// No hosted counterpart and no local history yet
    NeedsCommits,

    /// Needs a human: hosted counterpart exists but the local copy is empty, or the
    /// repository could not be inspected
    Problems,
}

impl Category {
    /// All categories, in report order
    pub const ALL: [Category; 5] = [
        Category::AlreadySynced,
        Category::NeedsReconnection,
        Category::ReadyToPush,
        Category::NeedsCommits,
        Category::Problems,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::AlreadySynced => "already synced",
            Category::NeedsReconnection => "needs reconnection",
            Category::ReadyToPush => "ready to push",
            Category::NeedsCommits => "needs commits",
            Category::Problems => "problems",
        };
        f.write_str(label)
    }
}

/// Classify a repository from what was observed about it
pub fn classify(hosted_exists: bool, remote_working: bool, has_commits: bool) -> Category {
    match (hosted_exists, has_commits, remote_working) {
        (true, true, true) => Category::AlreadySynced,
        (true, true, false) => Category::NeedsReconnection,
        (false, true, _) => Category::ReadyToPush,
        (false, false, _) => Category::NeedsCommits,
        (true, false, _) => Category::Problems,
    }
}

/// Everything observed about one local repository during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryObservation {
    /// Directory base name, also the expected hosted repository name
    pub name: String,

    /// Location of the working copy
    pub path: PathBuf,

    /// Whether the history is non-empty
    pub has_commits: bool,

    /// Configured remotes
    pub remotes: Vec<Remote>,

    /// Whether a hosted repository with this name exists
    pub hosted_exists: bool,

    /// Whether a remote points at the hosted repository and answers
    pub remote_working: bool,

    /// Why the observation was degraded, if it was
    pub note: Option<String>,

    /// Assigned once, at construction
    category: Category,
}

impl RepositoryObservation {
    /// Build an observation, classifying it from its flags
    pub fn new(
        name: String,
        path: PathBuf,
        has_commits: bool,
        remotes: Vec<Remote>,
        hosted_exists: bool,
        remote_working: bool,
    ) -> Self {
        Self {
            category: classify(hosted_exists, remote_working, has_commits),
            name,
            path,
            has_commits,
            remotes,
            hosted_exists,
            remote_working,
            note: None,
        }
    }

    /// Observation for a repository that could not be inspected
    pub fn problem<S: Into<String>>(name: String, path: PathBuf, note: S) -> Self {
        Self {
            name,
            path,
            has_commits: false,
            remotes: vec![],
            hosted_exists: false,
            remote_working: false,
            note: Some(note.into()),
            category: Category::Problems,
        }
    }

    /// Category of the repository
    pub fn category(&self) -> Category {
        self.category
    }
}

/// Observations split by category, in discovery order
#[derive(Debug, Clone, Default)]
pub struct CategoryPartition {
    /// [`Category::AlreadySynced`] repositories
    pub already_synced: Vec<RepositoryObservation>,

    /// [`Category::NeedsReconnection`] repositories
    pub needs_reconnection: Vec<RepositoryObservation>,

    /// [`Category::ReadyToPush`] repositories
    pub ready_to_push: Vec<RepositoryObservation>,

    /// [`Category::NeedsCommits`] repositories
    pub needs_commits: Vec<RepositoryObservation>,

    /// [`Category::Problems`] repositories
    pub problems: Vec<RepositoryObservation>,
}

impl CategoryPartition {
    /// Append an observation to the slot of its category
    pub fn push(&mut self, observation: RepositoryObservation) {
        let slot = match observation.category() {
            Category::AlreadySynced => &mut self.already_synced,
            Category::NeedsReconnection => &mut self.needs_reconnection,
            Category::ReadyToPush => &mut self.ready_to_push,
            Category::NeedsCommits => &mut self.needs_commits,
            Category::Problems => &mut self.problems,
        };
        slot.push(observation);
    }

    /// Observations of one category
    pub fn get(&self, category: Category) -> &[RepositoryObservation] {
        match category {
            Category::AlreadySynced => &self.already_synced,
            Category::NeedsReconnection => &self.needs_reconnection,
            Category::ReadyToPush => &self.ready_to_push,
            Category::NeedsCommits => &self.needs_commits,
            Category::Problems => &self.problems,
        }
    }

    /// Total number of observations
    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    /// Number of repositories that need a hosted repository created
    pub fn creation_count(&self) -> usize {
        self.ready_to_push.len() + self.needs_commits.len()
    }

    /// Whether any remediation would happen
    pub fn has_work(&self) -> bool {
        !self.needs_reconnection.is_empty() || self.creation_count() > 0
    }
}
