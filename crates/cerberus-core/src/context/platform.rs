use super::git;
use super::CiEnvironment;
use crate::error::{CollectionWarning, ConfigError};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// The CI system the client is running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    GitHub,
    GitLab,
    Jenkins,
    Local,
}

impl Platform {
    /// Detect the platform from well-known environment markers.
    pub fn detect(env: &CiEnvironment) -> Self {
        if env.get("GITHUB_ACTIONS") == Some("true") {
            Platform::GitHub
        } else if env.get("GITLAB_CI") == Some("true") {
            Platform::GitLab
        } else if env.get("JENKINS_URL").is_some() || env.get("JENKINS_HOME").is_some() {
            Platform::Jenkins
        } else {
            Platform::Local
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::GitHub => "github",
            Platform::GitLab => "gitlab",
            Platform::Jenkins => "jenkins",
            Platform::Local => "local",
        }
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "github" | "github-actions" => Ok(Platform::GitHub),
            "gitlab" | "gitlab-ci" => Ok(Platform::GitLab),
            "jenkins" => Ok(Platform::Jenkins),
            "local" => Ok(Platform::Local),
            _ => Err(ConfigError::InvalidValue {
                option: "platform",
                value: s.to_string(),
                expected: "auto, github, gitlab, jenkins, local",
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whatever a platform's environment says about the current run.
/// `None` means the platform did not provide the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformFacts {
    pub owner: Option<String>,
    pub name: Option<String>,
    pub default_branch: Option<String>,
    pub git_ref: Option<String>,
    pub sha: Option<String>,
    pub commit_message: Option<String>,
    pub commit_author: Option<String>,
    pub event: Option<String>,
    pub workflow_name: Option<String>,
    pub run_id: Option<String>,
    pub pull_request: Option<u64>,
}

/// Read the platform's environment variables into [`PlatformFacts`].
/// Problems reading auxiliary sources (e.g. the GitHub event payload) are
/// reported as warnings.
pub fn read_facts(platform: Platform, env: &CiEnvironment) -> (PlatformFacts, Vec<CollectionWarning>) {
    match platform {
        Platform::GitHub => github_facts(env),
        Platform::GitLab => (gitlab_facts(env), Vec::new()),
        Platform::Jenkins => (jenkins_facts(env), Vec::new()),
        Platform::Local => (local_facts(env), Vec::new()),
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn split_full_name(full_name: &str) -> (Option<String>, Option<String>) {
    match full_name.rsplit_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
            (Some(owner.to_string()), Some(name.to_string()))
        }
        _ => (None, None),
    }
}

static PULL_REQUEST_REF: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^refs/pull/(\d+)/"));

/// Pull request number from a GitHub ref such as `refs/pull/17/merge`.
pub fn pull_request_from_ref(git_ref: &str) -> Option<u64> {
    let re = PULL_REQUEST_REF.as_ref().ok()?;
    re.captures(git_ref)?.get(1)?.as_str().parse().ok()
}

fn github_facts(env: &CiEnvironment) -> (PlatformFacts, Vec<CollectionWarning>) {
    let mut warnings = Vec::new();
    let (owner, name) = env
        .get("GITHUB_REPOSITORY")
        .map(split_full_name)
        .unwrap_or((None, None));
    let git_ref = owned(env.get("GITHUB_REF"));

    let mut facts = PlatformFacts {
        owner: owned(env.get("GITHUB_REPOSITORY_OWNER")).or(owner),
        name,
        pull_request: git_ref.as_deref().and_then(pull_request_from_ref),
        git_ref,
        sha: owned(env.get("GITHUB_SHA")),
        event: owned(env.get("GITHUB_EVENT_NAME")),
        workflow_name: owned(env.get("GITHUB_WORKFLOW")),
        run_id: owned(env.get("GITHUB_RUN_ID")),
        ..Default::default()
    };

    if let Some(path) = env.get("GITHUB_EVENT_PATH") {
        match read_event_payload(path) {
            Ok(event) => apply_github_event(&mut facts, &event),
            Err(e) => warnings.push(CollectionWarning::new(
                "event",
                format!("could not read GitHub event payload {}: {}", path, e),
            )),
        }
    }

    (facts, warnings)
}

fn read_event_payload(path: &str) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn apply_github_event(facts: &mut PlatformFacts, event: &serde_json::Value) {
    if let Some(message) = event["head_commit"]["message"].as_str() {
        facts.commit_message = Some(message.to_string());
    }
    if let Some(author) = event["head_commit"]["author"]["name"].as_str() {
        facts.commit_author = Some(author.to_string());
    }
    if let Some(branch) = event["repository"]["default_branch"].as_str() {
        facts.default_branch = Some(branch.to_string());
    }
    if let Some(number) = event["pull_request"]["number"].as_u64() {
        facts.pull_request = Some(number);
    }
    if facts.commit_author.is_none() {
        if let Some(login) = event["pull_request"]["user"]["login"].as_str() {
            facts.commit_author = Some(login.to_string());
        }
    }
}

fn gitlab_facts(env: &CiEnvironment) -> PlatformFacts {
    let event = owned(env.get("CI_PIPELINE_SOURCE"));
    PlatformFacts {
        owner: owned(env.get("CI_PROJECT_NAMESPACE")),
        name: owned(env.get("CI_PROJECT_NAME")),
        default_branch: owned(env.get("CI_DEFAULT_BRANCH")),
        git_ref: owned(
            env.get("CI_MERGE_REQUEST_SOURCE_BRANCH_NAME")
                .or_else(|| env.get("CI_COMMIT_REF_NAME")),
        ),
        sha: owned(env.get("CI_COMMIT_SHA")),
        commit_message: owned(env.get("CI_COMMIT_MESSAGE")),
        commit_author: owned(env.get("CI_COMMIT_AUTHOR")),
        event,
        workflow_name: owned(env.get("CI_JOB_NAME")),
        run_id: owned(env.get("CI_PIPELINE_ID")),
        pull_request: env.get("CI_MERGE_REQUEST_IID").and_then(|v| v.parse().ok()),
    }
}

fn jenkins_facts(env: &CiEnvironment) -> PlatformFacts {
    let (owner, name) = env
        .get("GIT_URL")
        .and_then(git::parse_remote_url)
        .map(|(o, n)| (Some(o), Some(n)))
        .unwrap_or((None, None));
    let pull_request = env.get("CHANGE_ID").and_then(|v| v.parse().ok());

    PlatformFacts {
        owner,
        name,
        default_branch: None,
        git_ref: owned(env.get("CHANGE_BRANCH").or_else(|| env.get("GIT_BRANCH"))),
        sha: owned(env.get("GIT_COMMIT")),
        commit_message: None,
        commit_author: owned(env.get("CHANGE_AUTHOR")),
        event: Some(if pull_request.is_some() { "pull_request" } else { "push" }.to_string()),
        workflow_name: owned(env.get("JOB_NAME")),
        run_id: owned(env.get("BUILD_NUMBER")),
        pull_request,
    }
}

fn local_facts(env: &CiEnvironment) -> PlatformFacts {
    let repo = env.working_dir();
    let (owner, name) = git::origin_url(repo)
        .as_deref()
        .and_then(git::parse_remote_url)
        .map(|(o, n)| (Some(o), Some(n)))
        .unwrap_or((None, None));

    PlatformFacts {
        owner,
        name,
        git_ref: git::current_branch(repo),
        sha: git::head_sha(repo),
        event: Some("manual".to_string()),
        workflow_name: Some("local".to_string()),
        ..Default::default()
    }
}
