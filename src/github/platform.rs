//! Github Platform
use super::{GITHUB_API_HEADER, GITHUB_API_URL, GITHUB_API_VERSION, GITHUB_PAGE_SIZE, GITHUB_URL};
use crate::{
    errors::{ReconcileError, ReconcileErrorKind},
    git::{Git2Backend, VersionControl},
    github::repo::{CreateRepoGithub, RepoGithub, UserGithub},
    platform::{CreateRepository, HostedPlatform, PlatformFuture},
};
use reqwest::{
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
    RequestBuilder,
};
use urlencoding::encode;

/// Name of the remote set on a created repository
const ORIGIN: &str = "origin";

/// Github Platform
#[derive(Default, Debug, Clone)]
pub struct GithubPlatform {
    /// Github token
    token: String,

    /// Reqwest client
    client: reqwest::Client,
}

impl GithubPlatform {
    /// Create a new GithubPlatform
    pub(crate) fn new(token: String) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Add the headers every GitHub API call needs
    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, env!("CARGO_PKG_NAME"))
            .header(GITHUB_API_HEADER, GITHUB_API_VERSION)
    }

    /// Get one repository of the owner
    async fn get_repo(&self, owner: &str, repo_name: &str) -> Result<RepoGithub, ReconcileError> {
        let url = format!(
            "https://{}/repos/{}/{}",
            GITHUB_API_URL,
            encode(owner),
            encode(repo_name)
        );
        let response = self.with_headers(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            let text = response.text().await?;
            return Err(ReconcileError::new(ReconcileErrorKind::GetRepo).with_text(&text));
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Create the repository, reusing it when it already exists for the owner
    async fn create_or_reuse(&self, body: &CreateRepoGithub) -> Result<RepoGithub, ReconcileError> {
        let url = format!("https://{GITHUB_API_URL}/user/repos");
        let response = self
            .with_headers(self.client.post(&url))
            .json(body)
            .send()
            .await?;
        if response.status().is_success() {
            let text = response.text().await?;
            return Ok(serde_json::from_str(&text)?);
        }
        let text = format!("{} {}", response.status(), response.text().await?);
        let owner = self.fetch_owner().await?;
        match self.get_repo(&owner, &body.name).await {
            Ok(existing) => {
                log::info!("{}: already exists on {GITHUB_URL}, reusing it", body.name);
                Ok(existing)
            }
            Err(e) => {
                log::debug!("{}: lookup after failed creation: {e}", body.name);
                Err(ReconcileError::new(ReconcileErrorKind::RepoCreation).with_text(&text))
            }
        }
    }

    /// Login of the token owner
    async fn fetch_owner(&self) -> Result<String, ReconcileError> {
        let url = format!("https://{GITHUB_API_URL}/user");
        let response = self.with_headers(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            let text = response.text().await?;
            return Err(ReconcileError::new(ReconcileErrorKind::GetOwner).with_text(&text));
        }
        let text = response.text().await?;
        let user: UserGithub = serde_json::from_str(&text)?;
        Ok(user.login)
    }
}

impl HostedPlatform for GithubPlatform {
    fn get_remote_url(&self) -> &str {
        GITHUB_URL
    }

    fn list_repository_names(&self, limit: usize) -> PlatformFuture<'_, Vec<String>> {
        Box::pin(async move {
            let url = format!("https://{GITHUB_API_URL}/user/repos");
            let mut page: usize = 1;
            let mut all_names = vec![];
            while all_names.len() < limit {
                let request = self.client.get(&url).query(&[
                    ("affiliation", "owner"),
                    ("per_page", &GITHUB_PAGE_SIZE.to_string()),
                    ("page", &page.to_string()),
                ]);
                let response = self.with_headers(request).send().await?;
                if !response.status().is_success() {
                    let text = response.text().await?;
                    return Err(
                        ReconcileError::new(ReconcileErrorKind::GetAllRepos).with_text(&text)
                    );
                }
                let text = response.text().await?;
                let repos: Vec<RepoGithub> = serde_json::from_str(&text)?;
                log::debug!("Requested github (page {}): {}", page, repos.len());
                let last_page = repos.len() < GITHUB_PAGE_SIZE;
                all_names.extend(repos.into_iter().map(|r| r.name));
                if last_page {
                    break;
                }
                page += 1;
            }
            all_names.truncate(limit);
            Ok(all_names)
        })
    }

    fn get_authenticated_owner(&self) -> PlatformFuture<'_, String> {
        Box::pin(self.fetch_owner())
    }

    fn create_repository(&self, request: CreateRepository) -> PlatformFuture<'_, ()> {
        Box::pin(async move {
            let body = CreateRepoGithub {
                name: request.name.clone(),
                private: request.visibility.is_private(),
            };
            let created = self.create_or_reuse(&body).await?;
            let git = Git2Backend;
            git.add_remote(&request.path, ORIGIN, &created.ssh_url)?;
            git.push_head(&request.path, ORIGIN)?;
            log::debug!("{}: pushed to {}", request.name, created.ssh_url);
            Ok(())
        })
    }
}
