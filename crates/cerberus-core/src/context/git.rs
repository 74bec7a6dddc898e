use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

/// Run a read-only git query in `repo`, returning trimmed stdout on success.
fn git_output(repo: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .current_dir(repo)
        .args(args)
        .output()
        .ok()?;

    if !output.status.success() {
        tracing::debug!(
            args = ?args,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git query failed"
        );
        return None;
    }

    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

pub fn head_sha(repo: &Path) -> Option<String> {
    git_output(repo, &["rev-parse", "HEAD"])
}

pub fn current_branch(repo: &Path) -> Option<String> {
    git_output(repo, &["rev-parse", "--abbrev-ref", "HEAD"]).filter(|b| b != "HEAD")
}

pub fn commit_message(repo: &Path, sha: Option<&str>) -> Option<String> {
    git_output(repo, &["log", "-1", "--format=%B", sha.unwrap_or("HEAD")])
}

pub fn commit_author(repo: &Path, sha: Option<&str>) -> Option<String> {
    git_output(repo, &["log", "-1", "--format=%an", sha.unwrap_or("HEAD")])
}

pub fn origin_url(repo: &Path) -> Option<String> {
    git_output(repo, &["remote", "get-url", "origin"])
}

static REMOTE_URL: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://(?:[^@/]+@)?[^/]+/|[^@:/]+@[^:]+:)(.+?)/([^/]+?)(?:\.git)?/?$")
});

/// Split a git remote URL into `(owner, name)`.
///
/// Handles `https://host/owner/name(.git)` and `git@host:owner/name(.git)`.
/// For nested groups (GitLab), everything before the last segment is the owner.
pub fn parse_remote_url(url: &str) -> Option<(String, String)> {
    let re = REMOTE_URL.as_ref().ok()?;
    let caps = re.captures(url.trim())?;
    Some((caps[1].to_string(), caps[2].to_string()))
}
