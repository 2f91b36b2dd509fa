//! # repo-reconcile
//!
//! Reconcile a tree of local git repositories with GitHub.
//!
//! Every repository below the root folder is classified as already synced, needing a
//! reconnection, ready to push, needing a first commit, or a problem to look at by hand.
//! Unless `--analyze-only` is given, and after an explicit confirmation, broken remotes
//! are reconnected and missing GitHub repositories are created and pushed.
//!
//! ## Usage
//!
//! ```txt
//! Usage: repo-reconcile [OPTIONS] <ROOT>
//!
//! Arguments:
//!   <ROOT>  Root folder containing the working copies
//!
//! Options:
//!   -p, --visibility <VISIBILITY>  Visibility of the repositories created on GitHub [default: private] [possible values: public, private]
//!   -d, --delay <DELAY>            Seconds to wait between two repository creations [default: 90]
//!   -a, --analyze-only             Only analyze, never change anything
//!   -e, --exclude <EXCLUDE>        Extra directory-name substring to skip (repeatable)
//!   -c, --config <CONFIG>          Custom configuration file path
//!       --show-config-path         Show the current config path
//!   -v, --verbose...               Verbose mode (-v, -vv)
//!   -h, --help                     Print help
//!   -V, --version                  Print version
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![deny(
    missing_docs,
    clippy::all,
    clippy::missing_docs_in_private_items,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![warn(clippy::multiple_crate_versions)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub(crate) mod analysis;
pub(crate) mod category;
pub(crate) mod cli;
pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod git;
pub(crate) mod macros;
pub(crate) mod platform;
pub(crate) mod remediate;
pub(crate) mod report;
pub(crate) mod resolver;
pub(crate) mod utils;
pub(crate) mod walker;
pub(crate) use macros::config_password_wrap;

mod github;

#[cfg(test)]
mod testing;

pub use analysis::AnalysisEngine;
pub use category::{classify, Category, CategoryPartition, RepositoryObservation};
pub use cli::{reconcile_main, ReconcileCli};
pub use config::ReconcileConfig;
pub use errors::{ReconcileError, ReconcileErrorKind};
pub use git::{Git2Backend, Remote, VersionControl};
pub use platform::{CreateRepository, HostedPlatform, HostedRepositoryIndex, Visibility};
pub use remediate::{
    looks_rate_limited, Action, Outcome, RemediationRecord, RemediationReport,
    RemediationSettings, Remediator,
};
pub use resolver::{matches_hosted_url, RemoteResolver};
pub use utils::main_reconcile;
pub use walker::discover_repositories;
