//! Configuration handling
use std::{
    fs::{create_dir_all, read_to_string, File},
    io::Write,
    path::PathBuf,
};

use home::home_dir;
use serde::{Deserialize, Serialize};

use crate::{
    cli::ReconcileCli, errors::ReconcileError, github::config::GithubConfig,
    walker::DEFAULT_EXCLUDES,
};

/// Default maximum number of hosted repositories fetched
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Smallest accepted `list_limit`: one page of the hosted listing
pub const MIN_LIST_LIMIT: usize = 100;

/// Default `user.name` for synthetic commits
const DEFAULT_COMMITTER_NAME: &str = "repo-reconcile";

/// Default `user.email` for synthetic commits
const DEFAULT_COMMITTER_EMAIL: &str = "repo-reconcile@localhost";

/// Configuration data
#[derive(Default, Clone, Debug)]
pub struct ReconcileConfig {
    /// path to the configuration file
    pub config_path: PathBuf,

    /// actual configuration data
    pub config_data: ConfigData,

    /// CLI arguments
    pub cli_args: ReconcileCli,
}

/// Content of the configuration file
#[derive(Deserialize, Serialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct ConfigData {
    /// Github configuration
    pub github: Option<GithubConfig>,

    /// Run settings
    pub settings: Option<SettingsConfig>,
}

/// Tunables of a run
#[derive(Deserialize, Serialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct SettingsConfig {
    /// Directory-name substrings to skip, replaces the default list
    pub exclude: Option<Vec<String>>,

    /// Maximum number of hosted repositories fetched
    pub list_limit: Option<usize>,

    /// Fallback `user.name` for synthetic commits
    pub committer_name: Option<String>,

    /// Fallback `user.email` for synthetic commits
    pub committer_email: Option<String>,
}

impl ReconcileConfig {
    /// Create a new Config object from the CLI arguments
    /// # Errors
    /// Error if the config file can't be opened or parsed
    pub fn try_new(cli_args: ReconcileCli) -> Result<Self, ReconcileError> {
        let config_path = match cli_args.config.clone() {
            Some(p) => p,
            None => Self::get_config_path()?,
        };
        let contents = read_to_string(&config_path)
            .map_err(|e| ReconcileError::new_with_source("Unable to open config file", e))?;
        let config_data = toml::from_str(&contents)?;
        Ok(ReconcileConfig {
            config_path,
            cli_args,
            config_data,
        })
    }

    /// Save the config data to the config file
    /// # Errors
    /// Error if the config file can't be created or written to
    pub fn save(&self) -> Result<(), ReconcileError> {
        let config_str = toml::to_string(&self.config_data)?;
        let mut file = File::create(&self.config_path)
            .map_err(|e| ReconcileError::new_with_source("Unable to create config file", e))?;
        file.write_all(config_str.as_bytes())
            .map_err(|e| ReconcileError::new_with_source("Unable to write to config file", e))
    }

    /// Get the path to the config file, creating an empty one when missing
    /// # Errors
    /// Error if the home directory can't be found
    pub fn get_config_path() -> Result<PathBuf, ReconcileError> {
        let home_dir = match home_dir() {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => return Err("Unable to get your home dir! home::home_dir() isn't working".into()),
        };
        let config_directory = home_dir.join(".config").join(".repo-reconcile");
        let config_path = config_directory.join("config.toml");
        create_dir_all(&config_directory)
            .map_err(|e| ReconcileError::new_with_source("Unable to create config dir", e))?;
        if !config_path.exists() {
            File::create(&config_path)
                .map_err(|e| ReconcileError::new_with_source("Unable to create config file", e))?;
        }
        Ok(config_path)
    }

    /// Update the config data and save it to the config file
    /// # Errors
    /// Error if fail to save config
    pub fn update(
        &mut self,
        updater_fn: impl FnOnce(&mut ConfigData),
    ) -> Result<(), ReconcileError> {
        updater_fn(&mut self.config_data);
        self.save()
    }

    /// Settings section, or the defaults
    fn settings(&self) -> SettingsConfig {
        self.config_data.settings.clone().unwrap_or_default()
    }

    /// Directory-name substrings to skip: the configured list (or the defaults),
    /// plus the ones given on the command line
    pub fn excludes(&self) -> Vec<String> {
        let mut excludes = self.settings().exclude.unwrap_or_else(|| {
            DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
        });
        excludes.extend(self.cli_args.exclude.iter().cloned());
        excludes
    }

    /// Maximum number of hosted repositories fetched, never below [`MIN_LIST_LIMIT`]
    pub fn list_limit(&self) -> usize {
        let limit = self.settings().list_limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if limit < MIN_LIST_LIMIT {
            log::warn!("list_limit {limit} is too small, using {MIN_LIST_LIMIT}");
            return MIN_LIST_LIMIT;
        }
        limit
    }

    /// Fallback committer identity, `(name, email)`
    pub fn committer(&self) -> (String, String) {
        let settings = self.settings();
        (
            settings
                .committer_name
                .unwrap_or_else(|| DEFAULT_COMMITTER_NAME.to_string()),
            settings
                .committer_email
                .unwrap_or_else(|| DEFAULT_COMMITTER_EMAIL.to_string()),
        )
    }
}
