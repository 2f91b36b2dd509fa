//! Version-control command interface
//!
//! Every operation names the repository it works on, so nothing here depends on the
//! process working directory.
use std::path::Path;

use git2::{
    Commit, ConfigLevel, Cred, CredentialType, Direction, IndexAddOption, PushOptions,
    RemoteCallbacks, Repository,
};

use crate::errors::{ReconcileError, ReconcileErrorKind};

/// Number of times libgit2 may ask for credentials before giving up
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// A configured remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    /// Name of the remote (e.g. `origin`)
    pub name: String,

    /// URL of the remote
    pub url: String,
}

impl Remote {
    /// Create a remote
    pub fn new<N: Into<String>, U: Into<String>>(name: N, url: U) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Operations the reconciliation needs from a version-control system
pub trait VersionControl {
    /// Whether the directory is itself the root of a (non-bare) working repository
    fn is_repository(&self, path: &Path) -> bool;

    /// Id of the commit HEAD points to, `None` if the history is empty
    /// # Errors
    /// Error if the repository can't be opened
    fn most_recent_commit(&self, path: &Path) -> Result<Option<String>, ReconcileError>;

    /// Configured remotes, in configuration order
    /// # Errors
    /// Error if the repository or its remotes can't be read
    fn list_remotes(&self, path: &Path) -> Result<Vec<Remote>, ReconcileError>;

    /// Remove a remote
    /// # Errors
    /// Error if the remote can't be removed
    fn remove_remote(&self, path: &Path, name: &str) -> Result<(), ReconcileError>;

    /// Add a remote
    /// # Errors
    /// Error if the remote can't be added
    fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), ReconcileError>;

    /// Whether the remote answers a ref listing that includes its HEAD
    fn probe_remote_reachable(&self, path: &Path, remote_name: &str) -> bool;

    /// Stage every file of the working tree
    /// # Errors
    /// Error if the index can't be updated
    fn stage_all(&self, path: &Path) -> Result<(), ReconcileError>;

    /// Commit the index, returning the new commit id
    /// # Errors
    /// Error if the commit can't be created
    fn commit(&self, path: &Path, message: &str) -> Result<String, ReconcileError>;

    /// Read a configuration value, as seen from the repository
    fn get_config(&self, path: &Path, key: &str) -> Option<String>;

    /// Write a configuration value into the repository configuration
    /// # Errors
    /// Error if the configuration can't be written
    fn set_config(&self, path: &Path, key: &str, value: &str) -> Result<(), ReconcileError>;

    /// Push the current branch to a remote and record it as upstream
    /// # Errors
    /// Error if the push fails or is rejected
    fn push_head(&self, path: &Path, remote_name: &str) -> Result<(), ReconcileError>;
}

/// [`VersionControl`] backed by libgit2
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Backend;

/// Credentials callbacks: ssh agent first, then git credential helpers
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;
    callbacks.credentials(move |url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("no usable credentials"));
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            let username = username_from_url.unwrap_or("git");
            return Cred::ssh_key_from_agent(username);
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let config = git2::Config::open_default()?;
            return Cred::credential_helper(&config, url, username_from_url);
        }
        Cred::default()
    });
    callbacks
}

impl Git2Backend {
    /// Open the repository at exactly this path (no upward search)
    fn open(path: &Path) -> Result<Repository, ReconcileError> {
        Ok(Repository::open(path)?)
    }

    /// Name of the branch HEAD points to, e.g. `refs/heads/main`
    fn head_ref_name(repo: &Repository) -> Result<String, ReconcileError> {
        let head = repo.head()?;
        match head.name() {
            Some(name) if head.is_branch() => Ok(name.to_string()),
            _ => Err(ReconcileError::new(ReconcileErrorKind::Push)
                .with_text("HEAD is not on a branch")),
        }
    }
}

impl VersionControl for Git2Backend {
    fn is_repository(&self, path: &Path) -> bool {
        match Repository::open(path) {
            Ok(repo) => !repo.is_bare(),
            Err(_) => false,
        }
    }

    fn most_recent_commit(&self, path: &Path) -> Result<Option<String>, ReconcileError> {
        let repo = Self::open(path)?;
        let commit = match repo.head() {
            Ok(head) => head.peel_to_commit().ok().map(|c| c.id().to_string()),
            Err(_) => None,
        };
        Ok(commit)
    }

    fn list_remotes(&self, path: &Path) -> Result<Vec<Remote>, ReconcileError> {
        let repo = Self::open(path)?;
        let names = repo.remotes()?;
        let mut remotes = Vec::with_capacity(names.len());
        for name in names.iter().flatten() {
            let remote = repo.find_remote(name)?;
            remotes.push(Remote::new(name, remote.url().unwrap_or_default()));
        }
        Ok(remotes)
    }

    fn remove_remote(&self, path: &Path, name: &str) -> Result<(), ReconcileError> {
        let repo = Self::open(path)?;
        repo.remote_delete(name)?;
        Ok(())
    }

    fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), ReconcileError> {
        let repo = Self::open(path)?;
        repo.remote(name, url)?;
        Ok(())
    }

    fn probe_remote_reachable(&self, path: &Path, remote_name: &str) -> bool {
        let probe = || -> Result<bool, ReconcileError> {
            let repo = Self::open(path)?;
            let mut remote = repo.find_remote(remote_name)?;
            let connection = remote.connect_auth(Direction::Fetch, Some(remote_callbacks()), None)?;
            let has_head = connection.list()?.iter().any(|head| head.name() == "HEAD");
            Ok(has_head)
        };
        match probe() {
            Ok(reachable) => reachable,
            Err(e) => {
                log::debug!("{}: remote '{remote_name}' unreachable: {e}", path.display());
                false
            }
        }
    }

    fn stage_all(&self, path: &Path) -> Result<(), ReconcileError> {
        let repo = Self::open(path)?;
        let mut index = repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, path: &Path, message: &str) -> Result<String, ReconcileError> {
        let repo = Self::open(path)?;
        let mut index = repo.index()?;
        let tree = repo.find_tree(index.write_tree()?)?;
        let signature = repo.signature()?;
        let parent: Option<Commit<'_>> = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(oid.to_string())
    }

    fn get_config(&self, path: &Path, key: &str) -> Option<String> {
        let repo = Repository::open(path).ok()?;
        let config = repo.config().ok()?;
        config.get_string(key).ok()
    }

    fn set_config(&self, path: &Path, key: &str, value: &str) -> Result<(), ReconcileError> {
        let repo = Self::open(path)?;
        let mut config = repo.config()?.open_level(ConfigLevel::Local)?;
        config.set_str(key, value)?;
        Ok(())
    }

    fn push_head(&self, path: &Path, remote_name: &str) -> Result<(), ReconcileError> {
        let repo = Self::open(path)?;
        let branch_ref = Self::head_ref_name(&repo)?;
        let mut remote = repo.find_remote(remote_name)?;
        let refspec = format!("{branch_ref}:{branch_ref}");

        let mut rejection: Option<String> = None;
        {
            let mut callbacks = remote_callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejection = Some(format!("{refname}: {message}"));
                }
                Ok(())
            });
            let mut opts = PushOptions::new();
            opts.remote_callbacks(callbacks);
            remote.push(&[refspec.as_str()], Some(&mut opts))?;
        }
        if let Some(message) = rejection {
            return Err(ReconcileError::new(ReconcileErrorKind::Push).with_text(&message));
        }

        if let Some(branch) = branch_ref.strip_prefix("refs/heads/") {
            let mut config = repo.config()?.open_level(ConfigLevel::Local)?;
            config.set_str(&format!("branch.{branch}.remote"), remote_name)?;
            config.set_str(&format!("branch.{branch}.merge"), &branch_ref)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        dir
    }

    #[test]
    fn detects_repositories() {
        let git = Git2Backend;
        let repo = init_repo();
        let plain = TempDir::new().unwrap();
        let nested = repo.path().join("src");
        fs::create_dir(&nested).unwrap();

        assert!(git.is_repository(repo.path()));
        assert!(!git.is_repository(plain.path()));
        assert!(!git.is_repository(&nested));
    }

    #[test]
    fn bare_repository_is_not_a_working_copy() {
        let dir = TempDir::new().unwrap();
        Repository::init_bare(dir.path()).unwrap();
        assert!(!Git2Backend.is_repository(dir.path()));
    }

    #[test]
    fn stage_and_commit() {
        let git = Git2Backend;
        let repo = init_repo();
        assert_eq!(git.most_recent_commit(repo.path()).unwrap(), None);

        fs::write(repo.path().join("README.md"), "hello").unwrap();
        git.stage_all(repo.path()).unwrap();
        let first = git.commit(repo.path(), "Initial commit").unwrap();
        assert_eq!(git.most_recent_commit(repo.path()).unwrap(), Some(first.clone()));

        fs::write(repo.path().join("other.txt"), "more").unwrap();
        git.stage_all(repo.path()).unwrap();
        let second = git.commit(repo.path(), "Second").unwrap();
        let opened = Repository::open(repo.path()).unwrap();
        let head = opened.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.id().to_string(), second);
        assert_eq!(head.parent(0).unwrap().id().to_string(), first);
    }

    #[test]
    fn remotes_are_listed_in_order_and_removed() {
        let git = Git2Backend;
        let repo = init_repo();
        git.add_remote(repo.path(), "origin", "git@github.com:me/a.git").unwrap();
        git.add_remote(repo.path(), "backup", "https://github.com/me/a").unwrap();

        let remotes = git.list_remotes(repo.path()).unwrap();
        assert_eq!(remotes.len(), 2);
        assert!(remotes.contains(&Remote::new("origin", "git@github.com:me/a.git")));
        assert!(remotes.contains(&Remote::new("backup", "https://github.com/me/a")));

        git.remove_remote(repo.path(), "origin").unwrap();
        let remotes = git.list_remotes(repo.path()).unwrap();
        assert_eq!(remotes, vec![Remote::new("backup", "https://github.com/me/a")]);
        assert!(git.remove_remote(repo.path(), "origin").is_err());
    }

    #[test]
    fn config_round_trip() {
        let git = Git2Backend;
        let repo = init_repo();
        git.set_config(repo.path(), "reconcile.marker", "on").unwrap();
        assert_eq!(git.get_config(repo.path(), "reconcile.marker"), Some("on".to_string()));
        assert_eq!(git.get_config(repo.path(), "reconcile.missing"), None);
    }

    #[test]
    fn push_to_local_remote_then_probe() {
        let git = Git2Backend;
        let repo = init_repo();
        let bare = TempDir::new().unwrap();
        Repository::init_bare(bare.path()).unwrap();
        let bare_url = bare.path().to_str().unwrap();

        fs::write(repo.path().join("README.md"), "hello").unwrap();
        git.stage_all(repo.path()).unwrap();
        git.commit(repo.path(), "Initial commit").unwrap();
        git.add_remote(repo.path(), "origin", bare_url).unwrap();

        git.push_head(repo.path(), "origin").unwrap();
        assert!(git.probe_remote_reachable(repo.path(), "origin"));

        let branch = Repository::open(repo.path())
            .unwrap()
            .head()
            .unwrap()
            .shorthand()
            .unwrap()
            .to_string();
        assert_eq!(
            git.get_config(repo.path(), &format!("branch.{branch}.remote")),
            Some("origin".to_string())
        );
    }

    #[test]
    fn probe_fails_for_missing_remote_target() {
        let git = Git2Backend;
        let repo = init_repo();
        let gone = TempDir::new().unwrap();
        let gone_path = gone.path().join("does-not-exist");
        git.add_remote(repo.path(), "origin", gone_path.to_str().unwrap()).unwrap();

        assert!(!git.probe_remote_reachable(repo.path(), "origin"));
        assert!(!git.probe_remote_reachable(repo.path(), "unknown"));
    }
}
