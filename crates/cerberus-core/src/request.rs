use crate::error::RequestError;
use crate::model::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder for any context value that could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// How the server should treat the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Validate,
    Audit,
    Monitor,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Validate => "validate",
            Mode::Audit => "audit",
            Mode::Monitor => "monitor",
        }
    }
}

impl FromStr for Mode {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "validate" => Ok(Mode::Validate),
            "audit" => Ok(Mode::Audit),
            "monitor" => Ok(Mode::Monitor),
            _ => Err(RequestError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity from which the server flags a finding for human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumanReviewThreshold {
    Low,
    Medium,
    High,
}

impl HumanReviewThreshold {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(HumanReviewThreshold::Low),
            "medium" => Some(HumanReviewThreshold::Medium),
            "high" => Some(HumanReviewThreshold::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub severity_threshold: Severity,
    pub human_review_threshold: HumanReviewThreshold,
    pub include_suggestions: bool,
    pub include_evidence: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub default_branch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
    Renamed,
    Unknown,
}

impl ChangeKind {
    /// Map the status strings used by GitHub/GitLab/git onto a change kind.
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "added" | "a" | "new" => ChangeKind::Added,
            "modified" | "m" | "changed" => ChangeKind::Modified,
            "removed" | "deleted" | "d" => ChangeKind::Removed,
            "renamed" | "r" => ChangeKind::Renamed,
            _ => ChangeKind::Unknown,
        }
    }
}

/// One entry of the change set sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInfo {
    pub platform: String,
    pub name: String,
    pub run_id: String,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<u64>,
}

/// Repository and CI metadata describing what is being checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub repository: RepositoryInfo,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub commit: CommitInfo,
    pub changes: Vec<FileChange>,
    pub workflow: WorkflowInfo,
    pub timestamp: String,
}

/// The body of a compliance check call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRequest {
    pub context: RequestContext,
    pub frameworks: Vec<String>,
    pub mode: Mode,
    pub options: RequestOptions,
}

impl ComplianceRequest {
    /// Build a request, normalizing the framework list. Fails when no
    /// framework survives normalization.
    pub fn new(
        context: RequestContext,
        frameworks: &[String],
        mode: Mode,
        options: RequestOptions,
    ) -> Result<Self, RequestError> {
        let request = Self {
            context,
            frameworks: normalize_frameworks(frameworks),
            mode,
            options,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.frameworks.is_empty() {
            return Err(RequestError::EmptyFrameworks);
        }
        Ok(())
    }
}

/// Trim, lowercase and deduplicate framework identifiers, keeping first-seen order.
pub fn normalize_frameworks(frameworks: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for id in frameworks {
        let id = id.trim().to_lowercase();
        if !id.is_empty() && !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

/// Split a comma-separated framework list.
pub fn parse_framework_list(raw: &str) -> Vec<String> {
    normalize_frameworks(&raw.split(',').map(str::to_string).collect::<Vec<_>>())
}
