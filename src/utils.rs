//! Utility functions and the main reconciliation flow
use std::time::Duration;

use crate::analysis::AnalysisEngine;
use crate::config::ReconcileConfig;
use crate::errors::{ReconcileError, ReconcileErrorKind};
use crate::git::Git2Backend;
use crate::github::config::GithubConfig;
use crate::platform::{HostedPlatform, HostedRepositoryIndex};
use crate::remediate::{RemediationSettings, Remediator};
use crate::report::{print_analysis, print_estimate, print_remediation};
use crate::walker::discover_repositories;

/// Exact answer required before changing anything
pub const CONFIRMATION: &str = "yes";

/// Main function to reconcile the repositories
/// # Errors
/// Error if the root folder is missing, or the hosted repositories can't be listed
pub async fn main_reconcile(config: ReconcileConfig) -> Result<(), ReconcileError> {
    let mut config = config;
    let root = match &config.cli_args.root {
        Some(root) if root.is_dir() => root.clone(),
        Some(root) => {
            return Err(ReconcileError::new(ReconcileErrorKind::Environment)
                .with_text(&format!("Root folder '{}' does not exist", root.display())))
        }
        None => return Err("No root folder given".into()),
    };
    let git = Git2Backend;

    println!("Scanning {}", root.display());
    let local_repos = discover_repositories(&root, &config.excludes(), &git);
    println!("Found {} local repositories", local_repos.len());

    let platform = GithubConfig::get_plateform(&mut config)?;
    let index = HostedRepositoryIndex::fetch(&platform, config.list_limit())
        .await
        .map_err(|e| format!("Error getting hosted repositories: {e}"))?;
    println!(
        "Number of repositories on {}: {}",
        platform.get_remote_url(),
        index.len()
    );

    let partition =
        AnalysisEngine::new(&git, platform.get_remote_url()).analyze(&local_repos, &index);
    print_analysis(&partition);

    if config.cli_args.analyze_only {
        println!("Analyze only, nothing changed");
        return Ok(());
    }
    if !partition.has_work() {
        println!("Nothing to do");
        return Ok(());
    }
    let delay = Duration::from_secs(config.cli_args.delay);
    print_estimate(&partition, delay);
    if !confirm_literal(
        &format!("Type '{CONFIRMATION}' to start the changes"),
        CONFIRMATION,
    )? {
        println!("Aborted, nothing changed");
        return Ok(());
    }

    let (fallback_name, fallback_email) = config.committer();
    let settings = RemediationSettings {
        visibility: config.cli_args.visibility,
        delay,
        fallback_name,
        fallback_email,
    };
    let report = Remediator::new(&git, &platform, settings)
        .run(&partition)
        .await;
    print_remediation(&report);
    Ok(())
}

/// Get input from the user
pub(crate) fn input() -> Result<String, ReconcileError> {
    use std::io::{stdin, stdout, Write};
    let mut s = String::new();
    let _ = stdout().flush();
    stdin()
        .read_line(&mut s)
        .map_err(|e| ReconcileError::new_with_source("Did not enter a correct string", e))?;
    Ok(trim_newline(s))
}

/// Remove the trailing line ending
fn trim_newline(mut s: String) -> String {
    if let Some('\n') = s.chars().next_back() {
        s.pop();
    }
    if let Some('\r') = s.chars().next_back() {
        s.pop();
    }
    s
}

/// Ask once; true only when the answer is exactly `literal`
pub(crate) fn confirm_literal(msg: &str, literal: &str) -> Result<bool, ReconcileError> {
    println!("{msg}");
    Ok(is_confirmation(&input()?, literal))
}

/// Whether the answer confirms
fn is_confirmation(answer: &str, literal: &str) -> bool {
    answer.trim() == literal
}

/// Get password from the user
pub(crate) fn get_password() -> Result<String, ReconcileError> {
    rpassword::read_password()
        .map_err(|e| ReconcileError::new_with_source("Error reading password", e))
}
