//! Observation of one local repository against the hosted index
use std::path::Path;

use url::Url;

use crate::{
    category::RepositoryObservation,
    errors::{ReconcileError, ReconcileErrorKind},
    git::{Remote, VersionControl},
    platform::HostedRepositoryIndex,
};

/// Split a remote URL into its host and path.
///
/// Handles real URLs (`https://`, `ssh://`, ...) and the scp-like `user@host:path` form.
fn host_and_path(remote_url: &str) -> Option<(String, String)> {
    if let Ok(parsed) = Url::parse(remote_url) {
        let host = parsed.host_str()?.to_string();
        return Some((host, parsed.path().trim_start_matches('/').to_string()));
    }
    let (authority, path) = remote_url.split_once(':')?;
    let host = authority.rsplit('@').next()?;
    if host.is_empty() || host.contains('/') {
        return None;
    }
    Some((host.to_string(), path.trim_start_matches('/').to_string()))
}

/// Whether `remote_url` has the form `host[:/]<owner>/<repo_name>(.git)?`.
///
/// The owner is any single path segment and is not checked against the authenticated user.
pub fn matches_hosted_url(remote_url: &str, host: &str, repo_name: &str) -> bool {
    let Some((url_host, path)) = host_and_path(remote_url.trim()) else {
        return false;
    };
    if !url_host.eq_ignore_ascii_case(host) {
        return false;
    }
    let path = path.strip_suffix(".git").unwrap_or(&path);
    match path.split_once('/') {
        Some((owner, name)) => !owner.is_empty() && name == repo_name,
        None => false,
    }
}

/// Turns a repository path into a [`RepositoryObservation`]
pub struct RemoteResolver<'a> {
    /// Version-control commands
    vcs: &'a dyn VersionControl,

    /// Host of the hosted service, e.g. `github.com`
    host: &'a str,
}

impl<'a> RemoteResolver<'a> {
    /// Create a resolver
    pub fn new(vcs: &'a dyn VersionControl, host: &'a str) -> Self {
        Self { vcs, host }
    }

    /// Observe one repository.
    ///
    /// Failures to read commits or remotes count as "no commits" and "no remotes".
    /// # Errors
    /// Error if the directory is not a working repository anymore
    pub fn resolve(
        &self,
        path: &Path,
        name: &str,
        index: &HostedRepositoryIndex,
    ) -> Result<RepositoryObservation, ReconcileError> {
        if !self.vcs.is_repository(path) {
            return Err(ReconcileError::new(ReconcileErrorKind::NotARepository)
                .with_text(&path.display().to_string()));
        }
        let has_commits = match self.vcs.most_recent_commit(path) {
            Ok(commit) => commit.is_some(),
            Err(e) => {
                log::debug!("{name}: can't read history: {e}");
                false
            }
        };
        let remotes = self.vcs.list_remotes(path).unwrap_or_else(|e| {
            log::debug!("{name}: can't list remotes: {e}");
            vec![]
        });
        let hosted_exists = index.contains(name);
        let remote_working = hosted_exists && self.any_remote_working(path, name, &remotes);
        Ok(RepositoryObservation::new(
            name.to_string(),
            path.to_path_buf(),
            has_commits,
            remotes,
            hosted_exists,
            remote_working,
        ))
    }

    /// Probe matching remotes in order, stopping at the first reachable one
    fn any_remote_working(&self, path: &Path, name: &str, remotes: &[Remote]) -> bool {
        remotes
            .iter()
            .filter(|remote| matches_hosted_url(&remote.url, self.host, name))
            .any(|remote| {
                let reachable = self.vcs.probe_remote_reachable(path, &remote.name);
                log::debug!("{name}: remote '{}' reachable: {reachable}", remote.name);
                reachable
            })
    }
}
