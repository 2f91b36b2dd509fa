//! Error handling for the repo-reconcile crate.
use std::{error::Error as StdError, fmt};

/// Error type for the repo-reconcile crate.
#[derive(Debug)]
pub struct ReconcileError {
    /// Inner error.
    inner: Box<Inner>,
}

impl ReconcileError {
    /// Create a new error.
    pub(crate) fn new(kind: ReconcileErrorKind) -> Self {
        Self {
            inner: Box::new(Inner { kind, source: None }),
        }
    }

    /// Create a new error with a message and a source
    pub(crate) fn new_with_source<E>(text: &str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new(ReconcileErrorKind::Message).with_text(&format!("{text}: {source}"))
    }

    /// Attach a text source to the error.
    pub(crate) fn with_text(mut self, text: &str) -> Self {
        self.inner.source = Some(Box::new(std::io::Error::other(text.to_string())));
        self
    }

    /// Kind of the error
    pub fn kind(&self) -> &ReconcileErrorKind {
        &self.inner.kind
    }
}

/// Type alias for a boxed error.
pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Inner error type for the repo-reconcile crate.
#[derive(Debug)]
struct Inner {
    /// Error kind.
    kind: ReconcileErrorKind,

    /// Source error.
    source: Option<BoxError>,
}

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileErrorKind {
    /// Plain message.
    Message,

    /// The root folder is missing or not a directory.
    Environment,

    /// Error related to the configuration file.
    Config,

    /// Error related to the reqwest crate.
    Reqwest,

    /// Error related to serde.
    Serde,

    /// Error related to Git2.
    Git2,

    /// Error related to the filesystem.
    Io,

    /// Error related to the GetAllRepos func.
    GetAllRepos,

    /// Error related to the GetOwner func.
    GetOwner,

    /// Error related to the GetRepo func.
    GetRepo,

    /// Error related to the RepoCreation func.
    RepoCreation,

    /// Error related to pushing a branch.
    Push,

    /// The directory is not a usable working repository.
    NotARepository,
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.source {
            Some(source) if self.inner.kind == ReconcileErrorKind::Message => {
                write!(f, "{source}")
            }
            Some(source) => write!(f, "{:?}: {source}", self.inner.kind),
            None => write!(f, "{:?}", self.inner.kind),
        }
    }
}

impl StdError for ReconcileError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

/// Build an error of the given kind wrapping a source error
fn wrap<E>(kind: ReconcileErrorKind, e: E) -> ReconcileError
where
    E: StdError + Send + Sync + 'static,
{
    ReconcileError {
        inner: Box::new(Inner {
            kind,
            source: Some(Box::new(e)),
        }),
    }
}

impl From<reqwest::Error> for ReconcileError {
    fn from(e: reqwest::Error) -> Self {
        wrap(ReconcileErrorKind::Reqwest, e)
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(e: serde_json::Error) -> Self {
        wrap(ReconcileErrorKind::Serde, e)
    }
}

impl From<toml::de::Error> for ReconcileError {
    fn from(e: toml::de::Error) -> Self {
        wrap(ReconcileErrorKind::Config, e)
    }
}

impl From<toml::ser::Error> for ReconcileError {
    fn from(e: toml::ser::Error) -> Self {
        wrap(ReconcileErrorKind::Config, e)
    }
}

impl From<std::io::Error> for ReconcileError {
    fn from(e: std::io::Error) -> Self {
        wrap(ReconcileErrorKind::Io, e)
    }
}

impl From<git2::Error> for ReconcileError {
    fn from(e: git2::Error) -> Self {
        wrap(ReconcileErrorKind::Git2, e)
    }
}

impl From<&str> for ReconcileError {
    fn from(text: &str) -> Self {
        Self::new(ReconcileErrorKind::Message).with_text(text)
    }
}

impl From<String> for ReconcileError {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}
