//! Github configuration
use super::platform::GithubPlatform;
use serde::{Deserialize, Serialize};

use crate::{config::ReconcileConfig, config_password_wrap, errors::ReconcileError};

/// Environment variables holding a GitHub token, in lookup order
const TOKEN_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// Github configuration
#[derive(Deserialize, Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    /// Github token
    pub token: Option<String>,
}

/// Token from the environment, if any
fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|token| !token.trim().is_empty())
}

impl GithubConfig {
    /// Get the github platform
    /// # Errors
    /// Error if the token can't be read or saved
    pub fn get_plateform(config: &mut ReconcileConfig) -> Result<GithubPlatform, ReconcileError> {
        let token = match token_from_env() {
            Some(token) => token,
            None => config_password_wrap!(
                config,
                github,
                GithubConfig,
                token,
                "your github token (https://github.com/settings/personal-access-tokens)"
            ),
        };
        Ok(GithubPlatform::new(token))
    }
}
