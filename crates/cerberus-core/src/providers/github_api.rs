use crate::context::scan::MAX_FILES;
use crate::request::{ChangeKind, FileChange};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// GitHub REST client for pull request files and comments.
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
}

/// File entry from the pull request files API.
#[derive(Debug, Clone, Deserialize)]
struct PullRequestFile {
    filename: String,
    status: String,
}

#[derive(Debug, Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

impl GitHubClient {
    /// Create a client for `owner/repo`. `base_url` is the REST root,
    /// e.g. `https://api.github.com` or a GitHub Enterprise `/api/v3` URL.
    pub fn new(token: &str, base_url: &str, owner: &str, repo: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("cerberus-ci/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).context("Invalid GitHub token")?,
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// List the files changed by a pull request, up to the change-set cap.
    pub async fn fetch_pull_request_files(&self, number: u64) -> Result<Vec<FileChange>> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.base_url, self.owner, self.repo, number
        );

        let mut files = Vec::new();
        let mut page = 1;

        while files.len() < MAX_FILES {
            let batch: Vec<PullRequestFile> = self
                .client
                .get(&url)
                .query(&[("per_page", "100".to_string()), ("page", page.to_string())])
                .send()
                .await
                .context("Failed to fetch pull request files")?
                .error_for_status()
                .context("GitHub API returned error")?
                .json()
                .await
                .context("Failed to parse pull request files response")?;

            if batch.is_empty() {
                break;
            }

            let last_page = batch.len() < 100;
            files.extend(batch.into_iter().map(|f| FileChange {
                path: f.filename,
                kind: ChangeKind::from_status(&f.status),
                content: None,
            }));
            if last_page {
                break;
            }
            page += 1;
        }

        files.truncate(MAX_FILES);
        Ok(files)
    }

    /// Post a comment on a pull request (via the issues API).
    pub async fn post_issue_comment(&self, number: u64, body: &str) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base_url, self.owner, self.repo, number
        );

        self.client
            .post(&url)
            .json(&CommentBody { body })
            .send()
            .await
            .context("Failed to post pull request comment")?
            .error_for_status()
            .context("GitHub API returned error")?;

        Ok(())
    }
}
