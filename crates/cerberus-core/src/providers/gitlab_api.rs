use crate::context::scan::MAX_FILES;
use crate::request::{ChangeKind, FileChange};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// GitLab REST (v4) client for merge request diffs and notes.
pub struct GitLabClient {
    client: reqwest::Client,
    api_url: String,
    project_id: String,
}

/// Entry from the merge request diffs API.
#[derive(Debug, Clone, Deserialize)]
struct MergeRequestDiff {
    new_path: String,
    #[serde(default)]
    new_file: bool,
    #[serde(default)]
    renamed_file: bool,
    #[serde(default)]
    deleted_file: bool,
}

impl MergeRequestDiff {
    fn kind(&self) -> ChangeKind {
        if self.new_file {
            ChangeKind::Added
        } else if self.deleted_file {
            ChangeKind::Removed
        } else if self.renamed_file {
            ChangeKind::Renamed
        } else {
            ChangeKind::Modified
        }
    }
}

#[derive(Debug, Serialize)]
struct NoteBody<'a> {
    body: &'a str,
}

impl GitLabClient {
    /// `api_url` is the v4 root (`CI_API_V4_URL`); `project_id` the numeric id
    /// or URL-encoded path of the project.
    pub fn new(token: &str, api_url: &str, project_id: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("cerberus-ci/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "PRIVATE-TOKEN",
            HeaderValue::from_str(token).context("Invalid GitLab token")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
        })
    }

    /// List the files changed by a merge request, up to the change-set cap.
    pub async fn fetch_merge_request_changes(&self, iid: u64) -> Result<Vec<FileChange>> {
        let url = format!(
            "{}/projects/{}/merge_requests/{}/diffs",
            self.api_url, self.project_id, iid
        );

        let diffs: Vec<MergeRequestDiff> = self
            .client
            .get(&url)
            .query(&[("per_page", "100")])
            .send()
            .await
            .context("Failed to fetch merge request changes")?
            .error_for_status()
            .context("GitLab API returned error")?
            .json()
            .await
            .context("Failed to parse merge request changes response")?;

        Ok(diffs
            .into_iter()
            .take(MAX_FILES)
            .map(|d| FileChange {
                kind: d.kind(),
                path: d.new_path,
                content: None,
            })
            .collect())
    }

    /// Add a note (comment) to a merge request.
    pub async fn post_merge_request_note(&self, iid: u64, body: &str) -> Result<()> {
        let url = format!(
            "{}/projects/{}/merge_requests/{}/notes",
            self.api_url, self.project_id, iid
        );

        self.client
            .post(&url)
            .json(&NoteBody { body })
            .send()
            .await
            .context("Failed to post merge request note")?
            .error_for_status()
            .context("GitLab API returned error")?;

        Ok(())
    }
}
