//! Corrective actions for each category
use std::{path::Path, time::Duration};

use crate::{
    category::{Category, CategoryPartition, RepositoryObservation},
    git::VersionControl,
    platform::{CreateRepository, HostedPlatform, Visibility},
};

/// Message of the commit created for repositories without history
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// Name of the remote added on reconnection
const ORIGIN: &str = "origin";

/// Error text fragments that hint at an exhausted quota or rate limit
const RATE_LIMIT_HINTS: &[&str] = &[
    "rate limit",
    "ratelimit",
    "too many requests",
    "quota",
    "abuse",
    "secondary rate",
    "was submitted too quickly",
];

/// Whether an error message looks like a rate limit.
///
/// This is a guess over free text; the hosting service does not guarantee its wording.
pub fn looks_rate_limited(message: &str) -> bool {
    let message = message.to_lowercase();
    RATE_LIMIT_HINTS.iter().any(|hint| message.contains(hint))
}

/// Run settings for the remediation
#[derive(Debug, Clone)]
pub struct RemediationSettings {
    /// Visibility of created repositories
    pub visibility: Visibility,

    /// Pause between consecutive creation attempts
    pub delay: Duration,

    /// `user.name` used when a repository has none
    pub fallback_name: String,

    /// `user.email` used when a repository has none
    pub fallback_email: String,
}

/// What was done to a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing, the repository is in sync
    None,

    /// Remotes replaced by a fresh `origin`
    Reconnect,

    /// Hosted repository created and pushed
    CreateAndPush,
}

/// Terminal state of a repository after remediation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No work needed
    Skipped,

    /// Remediation completed
    Succeeded,

    /// Remediation attempted, did not complete
    Failed(String),
}

/// Result of the remediation of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationRecord {
    /// Repository name
    pub name: String,

    /// What was attempted
    pub action: Action,

    /// How it ended
    pub outcome: Outcome,

    /// The failure looks like a rate limit
    pub rate_limited: bool,
}

impl RemediationRecord {
    /// Record for a repository that needed nothing
    fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            action: Action::None,
            outcome: Outcome::Skipped,
            rate_limited: false,
        }
    }

    /// Record from the result of an action
    fn finished(name: &str, action: Action, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self {
                name: name.to_string(),
                action,
                outcome: Outcome::Succeeded,
                rate_limited: false,
            },
            Err(message) => Self {
                name: name.to_string(),
                action,
                rate_limited: looks_rate_limited(&message),
                outcome: Outcome::Failed(message),
            },
        }
    }
}

/// Outcomes of a whole remediation run
#[derive(Debug, Clone, Default)]
pub struct RemediationReport {
    /// One record per repository, in processing order
    pub records: Vec<RemediationRecord>,
}

impl RemediationReport {
    /// Number of records with this action and a success
    pub fn succeeded(&self, action: Action) -> usize {
        self.records
            .iter()
            .filter(|r| r.action == action && r.outcome == Outcome::Succeeded)
            .count()
    }

    /// Records that failed
    pub fn failures(&self) -> impl Iterator<Item = &RemediationRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
    }

    /// Whether any failure looked like a rate limit
    pub fn rate_limited(&self) -> bool {
        self.records.iter().any(|r| r.rate_limited)
    }
}

/// Applies the corrective actions, one repository at a time
pub struct Remediator<'a> {
    /// Version-control commands
    vcs: &'a dyn VersionControl,

    /// Hosted service client
    platform: &'a dyn HostedPlatform,

    /// Run settings
    settings: RemediationSettings,
}

impl<'a> Remediator<'a> {
    /// Create a remediator
    pub fn new(
        vcs: &'a dyn VersionControl,
        platform: &'a dyn HostedPlatform,
        settings: RemediationSettings,
    ) -> Self {
        Self {
            vcs,
            platform,
            settings,
        }
    }

    /// Reconnect every `NeedsReconnection` repository, then create and push every
    /// `ReadyToPush` and `NeedsCommits` one. `Problems` are left alone.
    pub async fn run(&self, partition: &CategoryPartition) -> RemediationReport {
        let mut report = RemediationReport::default();
        report.records.extend(
            partition
                .already_synced
                .iter()
                .map(|obs| RemediationRecord::skipped(&obs.name)),
        );

        if !partition.needs_reconnection.is_empty() {
            println!(
                "Reconnecting {} repositories",
                partition.needs_reconnection.len()
            );
            let mut owner: Option<Result<String, String>> = None;
            for obs in &partition.needs_reconnection {
                let result = self.reconnect(obs, &mut owner).await;
                report_line(&obs.name, "reconnected", &result);
                report
                    .records
                    .push(RemediationRecord::finished(&obs.name, Action::Reconnect, result));
            }
        }

        let queue: Vec<&RepositoryObservation> = partition
            .ready_to_push
            .iter()
            .chain(partition.needs_commits.iter())
            .collect();
        let total = queue.len();
        let mut attempted_creation = false;
        for (idx, obs) in queue.into_iter().enumerate() {
            println!("[{}/{}] {}", idx + 1, total, obs.name);
            let result = self.create_and_push(obs, &mut attempted_creation).await;
            report_line(&obs.name, "created and pushed", &result);
            let record = RemediationRecord::finished(&obs.name, Action::CreateAndPush, result);
            if record.rate_limited {
                println!(
                    "{}: this looks like a rate limit, consider a longer --delay",
                    obs.name
                );
            }
            report.records.push(record);
        }
        report
    }

    /// Replace every remote with `origin` pointing at the hosted repository.
    ///
    /// The owner is resolved once per run; a failed resolution is not retried.
    async fn reconnect(
        &self,
        obs: &RepositoryObservation,
        owner: &mut Option<Result<String, String>>,
    ) -> Result<(), String> {
        self.remove_all_remotes(&obs.path, &obs.name);

        if owner.is_none() {
            let resolved = self
                .platform
                .get_authenticated_owner()
                .await
                .map_err(|e| format!("can't determine the authenticated owner: {e}"));
            *owner = Some(resolved);
        }
        let owner = match owner.as_ref() {
            Some(Ok(owner)) => owner.as_str(),
            Some(Err(e)) => return Err(e.clone()),
            None => return Err("owner unavailable".to_string()),
        };

        let url = format!(
            "git@{}:{}/{}.git",
            self.platform.get_remote_url(),
            owner,
            obs.name
        );
        log::debug!("{}: adding {ORIGIN} -> {url}", obs.name);
        self.vcs
            .add_remote(&obs.path, ORIGIN, &url)
            .map_err(|e| format!("can't add remote {ORIGIN}: {e}"))
    }

    /// Commit if needed, clear remotes, then create and push the hosted repository
    async fn create_and_push(
        &self,
        obs: &RepositoryObservation,
        attempted_creation: &mut bool,
    ) -> Result<(), String> {
        if obs.category() == Category::NeedsCommits {
            self.initial_commit(&obs.path)
                .map_err(|e| format!("can't create the initial commit: {e}"))?;
        }
        self.remove_all_remotes(&obs.path, &obs.name);

        if *attempted_creation && !self.settings.delay.is_zero() {
            log::info!(
                "Waiting {}s before the next creation",
                self.settings.delay.as_secs()
            );
            tokio::time::sleep(self.settings.delay).await;
        }
        *attempted_creation = true;

        let request = CreateRepository {
            path: obs.path.clone(),
            name: obs.name.clone(),
            visibility: self.settings.visibility,
        };
        self.platform
            .create_repository(request)
            .await
            .map_err(|e| e.to_string())
    }

    /// Make sure a committer identity exists, stage everything and commit once
    fn initial_commit(&self, path: &Path) -> Result<(), String> {
        let identity = [
            ("user.name", self.settings.fallback_name.as_str()),
            ("user.email", self.settings.fallback_email.as_str()),
        ];
        for (key, fallback) in identity {
            if self.vcs.get_config(path, key).is_none() {
                self.vcs
                    .set_config(path, key, fallback)
                    .map_err(|e| e.to_string())?;
            }
        }
        self.vcs.stage_all(path).map_err(|e| e.to_string())?;
        let id = self
            .vcs
            .commit(path, INITIAL_COMMIT_MESSAGE)
            .map_err(|e| e.to_string())?;
        log::debug!("{}: created commit {id}", path.display());
        Ok(())
    }

    /// Remove every remote, logging failures
    fn remove_all_remotes(&self, path: &Path, name: &str) {
        let remotes = match self.vcs.list_remotes(path) {
            Ok(remotes) => remotes,
            Err(e) => {
                log::warn!("{name}: can't list remotes: {e}");
                return;
            }
        };
        for remote in remotes {
            if let Err(e) = self.vcs.remove_remote(path, &remote.name) {
                log::warn!("{name}: can't remove remote '{}': {e}", remote.name);
            }
        }
    }
}

/// Print the outcome of one action
fn report_line(name: &str, done: &str, result: &Result<(), String>) {
    match result {
        Ok(()) => println!("{name}: {done}"),
        Err(e) => println!("{name}: failed: {e}"),
    }
}
