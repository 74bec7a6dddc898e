//! HTTP collaborators: the compliance scoring API and the CI platforms'
//! own APIs (change sets and PR/MR comments).

pub mod compliance_api;
pub mod github_api;
pub mod gitlab_api;

use crate::context::platform::Platform;
use crate::context::CiEnvironment;
use crate::request::FileChange;
use anyhow::Result;
use github_api::GitHubClient;
use gitlab_api::GitLabClient;

/// What the pipeline needs from a CI platform's API.
#[allow(async_fn_in_trait)]
pub trait PlatformApi {
    /// Files changed by pull/merge request `number`.
    async fn changed_files(&self, number: u64) -> Result<Vec<FileChange>>;

    /// Post `body` as a comment on pull/merge request `number`.
    async fn post_comment(&self, number: u64, body: &str) -> Result<()>;
}

/// The platform API client for the detected CI system.
pub enum PlatformClient {
    GitHub(GitHubClient),
    GitLab(GitLabClient),
}

impl PlatformClient {
    /// Build a client from the platform's standard variables. Returns `None`
    /// when the platform has no supported API or no token is available.
    pub fn from_env(platform: Platform, env: &CiEnvironment) -> Option<Self> {
        let client = match platform {
            Platform::GitHub => {
                let token = env.get("GITHUB_TOKEN")?;
                let (owner, repo) = env.get("GITHUB_REPOSITORY")?.split_once('/')?;
                let base_url = env.get("GITHUB_API_URL").unwrap_or("https://api.github.com");
                GitHubClient::new(token, base_url, owner, repo).map(PlatformClient::GitHub)
            }
            Platform::GitLab => {
                let token = env.get("GITLAB_TOKEN")?;
                let api_url = env.get("CI_API_V4_URL")?;
                let project_id = env.get("CI_PROJECT_ID")?;
                GitLabClient::new(token, api_url, project_id).map(PlatformClient::GitLab)
            }
            Platform::Jenkins | Platform::Local => return None,
        };

        match client {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(platform = %platform, error = %e, "platform API client unavailable");
                None
            }
        }
    }
}

impl PlatformApi for PlatformClient {
    async fn changed_files(&self, number: u64) -> Result<Vec<FileChange>> {
        match self {
            PlatformClient::GitHub(client) => client.fetch_pull_request_files(number).await,
            PlatformClient::GitLab(client) => client.fetch_merge_request_changes(number).await,
        }
    }

    async fn post_comment(&self, number: u64, body: &str) -> Result<()> {
        match self {
            PlatformClient::GitHub(client) => client.post_issue_comment(number, body).await,
            PlatformClient::GitLab(client) => client.post_merge_request_note(number, body).await,
        }
    }
}
