//! Context collection: turns the CI environment into a [`RequestContext`]
//! without touching the network. Missing values become `"Unknown"`.

pub mod git;
pub mod platform;
pub mod scan;

use crate::error::CollectionWarning;
use crate::request::{
    CommitInfo, FileChange, RepositoryInfo, RequestContext, WorkflowInfo, UNKNOWN,
};
use chrono::{DateTime, Utc};
use platform::{Platform, PlatformFacts};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Immutable snapshot of the environment a run executes in.
#[derive(Debug, Clone, Default)]
pub struct CiEnvironment {
    vars: HashMap<String, String>,
    working_dir: PathBuf,
}

impl CiEnvironment {
    /// Snapshot the current process environment and working directory.
    pub fn from_process() -> Self {
        let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_vars(std::env::vars(), working_dir)
    }

    pub fn from_vars<I>(vars: I, working_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            vars: vars.into_iter().collect(),
            working_dir: working_dir.into(),
        }
    }

    /// Value of a variable; empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

/// The collected context plus everything that had to be substituted.
#[derive(Debug, Clone)]
pub struct CollectedContext {
    pub context: RequestContext,
    pub warnings: Vec<CollectionWarning>,
}

/// Collect the request context for `platform`.
///
/// `changed_files` is the change set obtained from the platform API, if any;
/// without it the common source directories are scanned instead.
pub fn collect(
    env: &CiEnvironment,
    platform: Platform,
    changed_files: Option<Vec<FileChange>>,
) -> CollectedContext {
    collect_at(env, platform, changed_files, Utc::now())
}

pub fn collect_at(
    env: &CiEnvironment,
    platform: Platform,
    changed_files: Option<Vec<FileChange>>,
    now: DateTime<Utc>,
) -> CollectedContext {
    let (mut facts, mut warnings) = platform::read_facts(platform, env);
    fill_from_git(&mut facts, env.working_dir());

    let mut take = |value: Option<String>, field: &str| -> String {
        value.unwrap_or_else(|| {
            warnings.push(CollectionWarning::new(
                field,
                format!("{} unavailable, using '{}'", field, UNKNOWN),
            ));
            UNKNOWN.to_string()
        })
    };

    let owner = take(facts.owner, "repository.owner");
    let name = take(facts.name, "repository.name");
    let repository = RepositoryInfo {
        full_name: format!("{}/{}", owner, name),
        owner,
        name,
        default_branch: take(facts.default_branch, "repository.defaultBranch"),
    };
    let git_ref = take(facts.git_ref, "ref");
    let commit = CommitInfo {
        sha: take(facts.sha, "commit.sha"),
        message: take(facts.commit_message, "commit.message"),
        author: take(facts.commit_author, "commit.author"),
    };
    let workflow = WorkflowInfo {
        platform: platform.as_str().to_string(),
        name: take(facts.workflow_name, "workflow.name"),
        run_id: take(facts.run_id, "workflow.runId"),
        event: take(facts.event, "workflow.event"),
        pull_request: facts.pull_request,
    };

    let changes = match changed_files {
        Some(files) => with_local_content(files, env.working_dir()),
        None => scan::scan_source_tree(env.working_dir()),
    };

    for warning in &warnings {
        tracing::warn!(field = %warning.field, "{}", warning.message);
    }
    tracing::debug!(
        platform = %platform,
        files = changes.len(),
        "collected request context"
    );

    CollectedContext {
        context: RequestContext {
            repository,
            git_ref,
            commit,
            changes,
            workflow,
            timestamp: now.to_rfc3339(),
        },
        warnings,
    }
}

/// Fill gaps the platform left open from the local git checkout.
fn fill_from_git(facts: &mut PlatformFacts, repo: &Path) {
    if facts.sha.is_none() {
        facts.sha = git::head_sha(repo);
    }
    if facts.commit_message.is_none() {
        facts.commit_message = git::commit_message(repo, facts.sha.as_deref());
    }
    if facts.commit_author.is_none() {
        facts.commit_author = git::commit_author(repo, facts.sha.as_deref());
    }
}

/// Cap a platform-supplied change set and attach local content where the
/// file still exists in the checkout.
fn with_local_content(files: Vec<FileChange>, root: &Path) -> Vec<FileChange> {
    files
        .into_iter()
        .take(scan::MAX_FILES)
        .map(|mut change| {
            if change.content.is_none() && change.kind != crate::request::ChangeKind::Removed {
                change.content = scan::read_capped_content(&root.join(&change.path));
            }
            change
        })
        .collect()
}
