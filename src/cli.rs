//! Command line options for the repo-reconcile tool
use crate::{
    config::ReconcileConfig, errors::ReconcileError, platform::Visibility, utils::main_reconcile,
};
use clap::Parser;
use std::path::PathBuf;

/// repo-reconcile - Reconcile a tree of local git repositories with GitHub
#[derive(Parser, Default, Clone, Debug)]
#[command(version)]
pub struct ReconcileCli {
    /// Root folder containing the working copies
    #[arg(required_unless_present = "show_config_path")]
    pub root: Option<PathBuf>,

    /// Visibility of the repositories created on GitHub
    #[arg(short = 'p', long, value_enum, default_value_t = Visibility::Private)]
    pub visibility: Visibility,

    /// Seconds to wait between two repository creations
    #[arg(short, long, default_value_t = 90)]
    pub delay: u64,

    /// Only analyze, never change anything
    #[arg(short, long)]
    pub analyze_only: bool,

    /// Extra directory-name substring to skip (repeatable)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Custom configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show the current config path
    #[arg(long)]
    pub show_config_path: bool,

    /// Verbose mode (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl ReconcileCli {
    /// Log level matching the verbosity
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Run the repo-reconcile tool with the provided command line options
/// # Errors
/// Error if the configuration can't be loaded or the run fails
pub async fn reconcile_main(args: ReconcileCli) -> Result<(), ReconcileError> {
    let config = ReconcileConfig::try_new(args)?;
    if config.cli_args.show_config_path {
        println!("{}", config.config_path.display());
        return Ok(());
    }
    main_reconcile(config).await
}
