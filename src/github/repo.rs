//! Github payloads
use serde::{Deserialize, Serialize};

/// Github Repo, as returned by the API
#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct RepoGithub {
    /// Repository ID
    pub id: u64,

    /// Repository name
    pub name: String,

    /// Repository private status
    pub private: bool,

    /// SSH clone URL
    pub ssh_url: String,
}

/// Body of a repository creation request
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateRepoGithub {
    /// Repository name
    pub name: String,

    /// Repository private status
    pub private: bool,
}

/// Authenticated user
#[derive(Deserialize, Debug, Clone)]
pub struct UserGithub {
    /// Login of the user
    pub login: String,
}
