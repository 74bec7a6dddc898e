use crate::model::{ComplianceResult, Severity, Violation};
use crate::request::{
    ChangeKind, CommitInfo, FileChange, RepositoryInfo, RequestContext, WorkflowInfo,
};

pub fn sample_context() -> RequestContext {
    RequestContext {
        repository: RepositoryInfo {
            owner: "acme".to_string(),
            name: "payments".to_string(),
            full_name: "acme/payments".to_string(),
            default_branch: "main".to_string(),
        },
        git_ref: "refs/heads/main".to_string(),
        commit: CommitInfo {
            sha: "abc123".to_string(),
            message: "Add audit logging".to_string(),
            author: "dev".to_string(),
        },
        changes: vec![FileChange {
            path: "src/audit.rs".to_string(),
            kind: ChangeKind::Added,
            content: None,
        }],
        workflow: WorkflowInfo {
            platform: "github".to_string(),
            name: "CI".to_string(),
            run_id: "42".to_string(),
            event: "push".to_string(),
            pull_request: None,
        },
        timestamp: "2026-01-01T00:00:00+00:00".to_string(),
    }
}

pub fn violation(index: usize, severity: &str) -> Violation {
    Violation {
        rule_id: format!("E8-{:02}", index),
        rule_name: format!("rule-{}", index),
        title: format!("Violation {}", index),
        description: format!("Description of violation {}", index),
        message: format!("Message for violation {}", index),
        severity: Severity::parse(severity),
        framework: "essential8".to_string(),
        category: "access-control".to_string(),
        file_path: Some(format!("src/module_{}.rs", index)),
        line_number: Some(10 + index as u64),
        remediation: Some(format!("Fix violation {}", index)),
    }
}

pub fn result_with(severities: &[&str]) -> ComplianceResult {
    ComplianceResult {
        compliance_score: 82.0,
        violations: severities
            .iter()
            .enumerate()
            .map(|(i, s)| violation(i + 1, s))
            .collect(),
        frameworks_checked: vec!["essential8".to_string(), "soc2".to_string()],
        human_review_required: false,
        report_url: Some("https://app.cerberus-ai.com/reports/r-1".to_string()),
        extra: Default::default(),
    }
}
