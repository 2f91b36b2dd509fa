//! In-memory fakes of the version-control and hosted platform interfaces
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tokio::time::Instant;

use crate::{
    errors::ReconcileError,
    git::{Remote, VersionControl},
    platform::{CreateRepository, HostedPlatform, PlatformFuture},
};

/// State of one fake repository
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRepo {
    /// Commit ids, oldest first
    pub(crate) commits: Vec<String>,

    /// Configured remotes, in order
    pub(crate) remotes: Vec<Remote>,

    /// Remote URLs answering a probe
    pub(crate) reachable: HashSet<String>,

    /// Local git config
    pub(crate) config: HashMap<String, String>,

    /// Whether `stage_all` ran
    pub(crate) staged: bool,

    /// Every read fails
    pub(crate) unreadable: bool,

    /// `commit` fails
    pub(crate) fail_commit: bool,

    /// `add_remote` fails
    pub(crate) fail_add_remote: bool,

    /// `remove_remote` fails
    pub(crate) fail_remove_remote: bool,
}

impl FakeRepo {
    /// Repository without commits nor remotes
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Repository with one commit
    pub(crate) fn with_commits() -> Self {
        Self {
            commits: vec!["c0".to_string()],
            ..Self::default()
        }
    }

    /// Add a remote, answering probes when `reachable`
    pub(crate) fn remote(mut self, name: &str, url: &str, reachable: bool) -> Self {
        self.remotes.push(Remote::new(name, url));
        if reachable {
            self.reachable.insert(url.to_string());
        }
        self
    }

    /// Set a local config value
    pub(crate) fn config(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    /// Make every read fail
    pub(crate) fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    /// Make `commit` fail
    pub(crate) fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Make `add_remote` fail
    pub(crate) fn failing_add_remote(mut self) -> Self {
        self.fail_add_remote = true;
        self
    }

    /// Make `remove_remote` fail
    pub(crate) fn failing_remove_remote(mut self) -> Self {
        self.fail_remove_remote = true;
        self
    }
}

/// Fake [`VersionControl`] recording every mutating call
#[derive(Debug, Default)]
pub(crate) struct FakeVcs {
    /// Repositories by path
    repos: Mutex<HashMap<PathBuf, FakeRepo>>,

    /// Mutating calls
    calls: Mutex<Vec<String>>,

    /// Probed remote names
    probed: Mutex<Vec<String>>,
}

impl FakeVcs {
    /// No repositories
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a repository at `path`
    pub(crate) fn with_repo(self, path: &str, repo: FakeRepo) -> Self {
        self.repos.lock().unwrap().insert(PathBuf::from(path), repo);
        self
    }

    /// Current state of a repository
    pub(crate) fn repo(&self, path: &str) -> FakeRepo {
        self.repos.lock().unwrap()[Path::new(path)].clone()
    }

    /// Make a remote URL of a repository answer probes
    pub(crate) fn mark_reachable(&self, path: &str, url: &str) {
        let mut repos = self.repos.lock().unwrap();
        if let Some(repo) = repos.get_mut(Path::new(path)) {
            repo.reachable.insert(url.to_string());
        }
    }

    /// Mutating calls, formatted as `<op> <path> <args>`
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Mutating calls on one repository
    pub(crate) fn calls_for(&self, path: &str) -> Vec<String> {
        let prefix = format!(" {path}");
        self.calls()
            .into_iter()
            .filter(|call| call.contains(&prefix))
            .collect()
    }

    /// Names of the remotes probed, in order
    pub(crate) fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }

    /// Record a mutating call
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// Run `f` on a readable repository
    fn with<T>(
        &self,
        path: &Path,
        f: impl FnOnce(&mut FakeRepo) -> Result<T, ReconcileError>,
    ) -> Result<T, ReconcileError> {
        let mut repos = self.repos.lock().unwrap();
        match repos.get_mut(path) {
            Some(repo) if !repo.unreadable => f(repo),
            _ => Err(format!("cannot open {}", path.display()).into()),
        }
    }
}

impl VersionControl for FakeVcs {
    fn is_repository(&self, path: &Path) -> bool {
        self.repos.lock().unwrap().contains_key(path)
    }

    fn most_recent_commit(&self, path: &Path) -> Result<Option<String>, ReconcileError> {
        self.with(path, |repo| Ok(repo.commits.last().cloned()))
    }

    fn list_remotes(&self, path: &Path) -> Result<Vec<Remote>, ReconcileError> {
        self.with(path, |repo| Ok(repo.remotes.clone()))
    }

    fn remove_remote(&self, path: &Path, name: &str) -> Result<(), ReconcileError> {
        self.record(format!("remove_remote {} {name}", path.display()));
        self.with(path, |repo| {
            if repo.fail_remove_remote {
                return Err("could not lock config".into());
            }
            let before = repo.remotes.len();
            repo.remotes.retain(|remote| remote.name != name);
            if repo.remotes.len() == before {
                return Err(format!("remote '{name}' does not exist").into());
            }
            Ok(())
        })
    }

    fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), ReconcileError> {
        self.record(format!("add_remote {} {name} {url}", path.display()));
        self.with(path, |repo| {
            if repo.fail_add_remote {
                return Err("could not write config".into());
            }
            repo.remotes.push(Remote::new(name, url));
            Ok(())
        })
    }

    fn probe_remote_reachable(&self, path: &Path, remote_name: &str) -> bool {
        self.probed.lock().unwrap().push(remote_name.to_string());
        self.with(path, |repo| {
            Ok(repo
                .remotes
                .iter()
                .find(|remote| remote.name == remote_name)
                .is_some_and(|remote| repo.reachable.contains(&remote.url)))
        })
        .unwrap_or(false)
    }

    fn stage_all(&self, path: &Path) -> Result<(), ReconcileError> {
        self.record(format!("stage_all {}", path.display()));
        self.with(path, |repo| {
            repo.staged = true;
            Ok(())
        })
    }

    fn commit(&self, path: &Path, message: &str) -> Result<String, ReconcileError> {
        self.record(format!("commit {} {message}", path.display()));
        self.with(path, |repo| {
            if repo.fail_commit {
                return Err("nothing to commit".into());
            }
            let id = format!("c{}", repo.commits.len());
            repo.commits.push(id.clone());
            Ok(id)
        })
    }

    fn get_config(&self, path: &Path, key: &str) -> Option<String> {
        self.with(path, |repo| Ok(repo.config.get(key).cloned()))
            .ok()
            .flatten()
    }

    fn set_config(&self, path: &Path, key: &str, value: &str) -> Result<(), ReconcileError> {
        self.record(format!("set_config {} {key} {value}", path.display()));
        self.with(path, |repo| {
            repo.config.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn push_head(&self, path: &Path, remote_name: &str) -> Result<(), ReconcileError> {
        self.record(format!("push_head {} {remote_name}", path.display()));
        self.with(path, |_| Ok(()))
    }
}

/// Fake [`HostedPlatform`]
#[derive(Debug, Default)]
pub(crate) struct FakePlatform {
    /// Hosted repository names
    names: Vec<String>,

    /// Authenticated owner, `None` when the lookup fails
    owner: Option<String>,

    /// Creation errors by repository name
    create_errors: HashMap<String, String>,

    /// Creation attempts
    created: Mutex<Vec<(CreateRepository, Instant)>>,

    /// Number of owner lookups
    owner_calls: Mutex<usize>,
}

impl FakePlatform {
    /// Platform hosting `names`, owned by `me`
    pub(crate) fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            owner: Some("me".to_string()),
            ..Self::default()
        }
    }

    /// Make the owner lookup fail
    pub(crate) fn without_owner(mut self) -> Self {
        self.owner = None;
        self
    }

    /// Make the creation of `name` fail with `message`
    pub(crate) fn failing_create(mut self, name: &str, message: &str) -> Self {
        self.create_errors.insert(name.to_string(), message.to_string());
        self
    }

    /// Every creation attempt, with the (virtual) time it happened
    pub(crate) fn created(&self) -> Vec<(CreateRepository, Instant)> {
        self.created.lock().unwrap().clone()
    }

    /// Names of the creation attempts, in order
    pub(crate) fn created_names(&self) -> Vec<String> {
        self.created().into_iter().map(|(req, _)| req.name).collect()
    }

    /// Number of owner lookups
    pub(crate) fn owner_calls(&self) -> usize {
        *self.owner_calls.lock().unwrap()
    }
}

impl HostedPlatform for FakePlatform {
    fn list_repository_names(&self, limit: usize) -> PlatformFuture<'_, Vec<String>> {
        let names: Vec<String> = self.names.iter().take(limit).cloned().collect();
        Box::pin(async move { Ok::<_, ReconcileError>(names) })
    }

    fn get_authenticated_owner(&self) -> PlatformFuture<'_, String> {
        *self.owner_calls.lock().unwrap() += 1;
        let owner = self.owner.clone();
        Box::pin(async move { owner.ok_or_else(|| ReconcileError::from("not logged in")) })
    }

    fn create_repository(&self, request: CreateRepository) -> PlatformFuture<'_, ()> {
        let error = self.create_errors.get(&request.name).cloned();
        self.created.lock().unwrap().push((request, Instant::now()));
        Box::pin(async move {
            match error {
                Some(message) => Err(ReconcileError::from(message)),
                None => Ok(()),
            }
        })
    }

    fn get_remote_url(&self) -> &str {
        "github.com"
    }
}
