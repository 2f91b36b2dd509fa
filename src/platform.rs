//! Hosted repository service abstraction
use std::{collections::HashSet, future::Future, path::PathBuf, pin::Pin};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::errors::ReconcileError;

/// Boxed future returned by the platform methods
pub type PlatformFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ReconcileError>> + Send + 'a>>;

/// Hosted repository service (the API client side of the reconciliation)
pub trait HostedPlatform: Sync + Send {
    /// List the names of the repositories owned by the authenticated user, at most `limit`.
    fn list_repository_names(&self, limit: usize) -> PlatformFuture<'_, Vec<String>>;

    /// Login of the authenticated user.
    fn get_authenticated_owner(&self) -> PlatformFuture<'_, String>;

    /// Create a hosted repository from a local working tree, set `origin` and push.
    fn create_repository(&self, request: CreateRepository) -> PlatformFuture<'_, ()>;

    /// Host name used in remote URLs (e.g. `github.com`)
    fn get_remote_url(&self) -> &str;
}

/// Visibility of a created repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Anyone can see the repository
    Public,

    /// Only the owner can see the repository
    #[default]
    Private,
}

impl Visibility {
    /// Whether the repository is private
    pub fn is_private(self) -> bool {
        self == Visibility::Private
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Everything needed to create and push one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRepository {
    /// Working tree to publish
    pub path: PathBuf,

    /// Name of the hosted repository
    pub name: String,

    /// Visibility of the hosted repository
    pub visibility: Visibility,
}

/// Snapshot of the hosted repository names, fetched once per run
#[derive(Debug, Clone, Default)]
pub struct HostedRepositoryIndex {
    /// Repository names, compared case-sensitively
    names: HashSet<String>,
}

impl HostedRepositoryIndex {
    /// Fetch the index from the platform
    /// # Errors
    /// Error if the platform can't list the repositories
    pub async fn fetch(
        platform: &dyn HostedPlatform,
        limit: usize,
    ) -> Result<Self, ReconcileError> {
        let names = platform.list_repository_names(limit).await?;
        log::debug!("Fetched {} hosted repository names", names.len());
        Ok(Self::from_names(names))
    }

    /// Build an index from known names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a hosted repository with exactly this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of hosted repositories
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
