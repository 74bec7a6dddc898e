use super::format_score;
use crate::model::{ComplianceResult, Severity, Violation, SEVERITY_LEVELS};
use std::fmt::Write;

/// Maximum number of violations listed in a PR/MR comment.
pub const PR_COMMENT_DETAIL_LIMIT: usize = 5;

/// Badge color for a score: >= 90 green, >= 70 yellow, otherwise red.
pub fn score_color(score: f64) -> &'static str {
    if score >= 90.0 {
        "green"
    } else if score >= 70.0 {
        "yellow"
    } else {
        "red"
    }
}

fn score_badge(score: f64) -> String {
    format!(
        "![Compliance Score](https://img.shields.io/badge/Compliance%20Score-{}%25-{})",
        format_score(score),
        score_color(score)
    )
}

/// Full markdown report, written to `compliance-summary.md` and the job summary.
pub fn summary(result: &ComplianceResult) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Cerberus AI Compliance Report");
    let _ = writeln!(md);
    let _ = writeln!(
        md,
        "**Compliance Score:** {}/100",
        format_score(result.compliance_score)
    );
    let _ = writeln!(md, "**Frameworks Checked:** {}", result.frameworks_display());
    let _ = writeln!(md, "**Violations Found:** {}", result.violations.len());
    if let Some(url) = &result.report_url {
        let _ = writeln!(md, "**Full Report:** [{}]({})", url, url);
    }
    let _ = writeln!(md);

    if result.human_review_required {
        let _ = writeln!(
            md,
            "> ⚠️ **Human review required.** One or more findings need expert judgment beyond automated rules."
        );
        let _ = writeln!(md);
    }

    if result.violations.is_empty() {
        let _ = writeln!(md, "✅ No compliance violations found.");
        return md;
    }

    let _ = writeln!(md, "## Violations");
    let _ = writeln!(md);

    for violation in &result.violations {
        write_violation_section(&mut md, violation);
    }

    md
}

fn write_violation_section(md: &mut String, violation: &Violation) {
    let _ = writeln!(md, "### {} {}", violation.severity.icon(), violation.title);
    let _ = writeln!(md);
    let _ = writeln!(md, "- **Severity:** {}", violation.severity.label());
    let _ = writeln!(md, "- **Framework:** {}", violation.framework);
    if !violation.rule_id.is_empty() {
        let _ = writeln!(md, "- **Rule:** {} {}", violation.rule_id, violation.rule_name);
    }
    if let Some(location) = violation.location() {
        let _ = writeln!(md, "- **Location:** `{}`", location);
    }
    let _ = writeln!(md);
    if !violation.description.is_empty() {
        let _ = writeln!(md, "{}", violation.description);
        let _ = writeln!(md);
    }
    if let Some(remediation) = &violation.remediation {
        let _ = writeln!(md, "**Remediation:** {}", remediation);
        let _ = writeln!(md);
    }
}

fn bucket_line(severity: &Severity, count: usize) -> String {
    format!("- {} {}: {}", severity.icon(), severity.bucket_name(), count)
}

/// Condensed markdown body for a pull/merge request comment.
pub fn pr_comment(result: &ComplianceResult) -> String {
    let mut md = String::new();
    let counts = result.severity_counts();

    let _ = writeln!(md, "## 🛡️ Cerberus AI Compliance Check");
    let _ = writeln!(md);
    let _ = writeln!(md, "{}", score_badge(result.compliance_score));
    let _ = writeln!(md);

    let _ = writeln!(md, "| Metric | Value |");
    let _ = writeln!(md, "|--------|-------|");
    let _ = writeln!(
        md,
        "| Compliance Score | {}/100 |",
        format_score(result.compliance_score)
    );
    let _ = writeln!(md, "| Violations Found | {} |", result.violations.len());
    let _ = writeln!(md, "| Frameworks Checked | {} |", result.frameworks_display());
    let _ = writeln!(
        md,
        "| Human Review Required | {} |",
        if result.human_review_required { "Yes ⚠️" } else { "No" }
    );
    let _ = writeln!(md);

    if result.violations.is_empty() {
        let _ = writeln!(md, "✅ No compliance violations found.");
    } else {
        let _ = writeln!(md, "### Violations by Severity");
        let _ = writeln!(md);
        for severity in SEVERITY_LEVELS.iter().rev() {
            let _ = writeln!(md, "{}", bucket_line(severity, counts.get(severity)));
        }
        if counts.unknown > 0 {
            let _ = writeln!(md, "{}", bucket_line(&Severity::default(), counts.unknown));
        }
        let _ = writeln!(md);

        let _ = writeln!(md, "<details>");
        let _ = writeln!(md, "<summary>View violation details</summary>");
        let _ = writeln!(md);
        for violation in result.violations.iter().take(PR_COMMENT_DETAIL_LIMIT) {
            let _ = write!(
                md,
                "- {} **{}** ({}): {}",
                violation.severity.icon(),
                violation.title,
                violation.framework,
                violation.display_message()
            );
            if let Some(location) = violation.location() {
                let _ = write!(md, " `{}`", location);
            }
            let _ = writeln!(md);
        }
        let remaining = result
            .violations
            .len()
            .saturating_sub(PR_COMMENT_DETAIL_LIMIT);
        if remaining > 0 {
            let _ = writeln!(md);
            let _ = writeln!(md, "... and {} more violations.", remaining);
        }
        let _ = writeln!(md);
        let _ = writeln!(md, "</details>");
    }

    if let Some(url) = &result.report_url {
        let _ = writeln!(md);
        let _ = writeln!(md, "📊 [View full report]({})", url);
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::result_with;

    #[test]
    fn test_score_color_thresholds() {
        assert_eq!(score_color(100.0), "green");
        assert_eq!(score_color(90.0), "green");
        assert_eq!(score_color(89.9), "yellow");
        assert_eq!(score_color(70.0), "yellow");
        assert_eq!(score_color(69.0), "red");
        assert_eq!(score_color(0.0), "red");
    }

    #[test]
    fn test_summary_sections() {
        let mut result = result_with(&["critical", "low"]);
        result.human_review_required = true;
        result.violations[1].remediation = None;
        result.violations[1].file_path = None;
        let md = summary(&result);

        assert!(md.contains("**Compliance Score:** 82/100"));
        assert!(md.contains("essential8, soc2"));
        assert!(md.contains("Human review required"));
        assert!(md.contains("### 🔴 Violation 1"));
        assert!(md.contains("- **Severity:** CRITICAL"));
        assert!(md.contains("**Remediation:** Fix violation 1"));
        assert!(md.contains("`src/module_1.rs:11`"));
        assert!(md.contains("### 🔵 Violation 2"));
        assert!(!md.contains("Fix violation 2"));
        assert!(!md.contains("src/module_2.rs"));
    }

    #[test]
    fn test_summary_without_violations() {
        let md = summary(&result_with(&[]));
        assert!(md.contains("No compliance violations found"));
        assert!(!md.contains("## Violations"));
        assert!(!md.contains("Human review required"));
    }

    #[test]
    fn test_pr_comment_truncates_after_five() {
        let result = result_with(&["high", "high", "medium", "low", "critical", "medium"]);
        let md = pr_comment(&result);

        let details = md
            .lines()
            .filter(|l| l.starts_with("- ") && l.contains("**Violation "))
            .count();
        assert_eq!(details, 5);
        assert!(md.contains("... and 1 more violations."));
        assert!(!md.contains("Violation 6"));
    }

    #[test]
    fn test_pr_comment_no_suffix_when_not_truncated() {
        let md = pr_comment(&result_with(&["high", "low"]));
        assert!(!md.contains("more violations"));
        assert!(md.contains("<details>"));
    }

    #[test]
    fn test_pr_comment_metrics_and_counts() {
        let result = result_with(&["critical", "high", "high", "informational"]);
        let md = pr_comment(&result);

        assert!(md.contains("Compliance%20Score-82%25-yellow"));
        assert!(md.contains("| Violations Found | 4 |"));
        assert!(md.contains("| Frameworks Checked | essential8, soc2 |"));
        assert!(md.contains("| Human Review Required | No |"));
        assert!(md.contains("- 🔴 Critical: 1"));
        assert!(md.contains("- 🟠 High: 2"));
        assert!(md.contains("- 🟡 Medium: 0"));
        assert!(md.contains("- ⚪ Other: 1"));
        let critical = md.find("- 🔴 Critical").unwrap();
        let low = md.find("- 🔵 Low: 0").unwrap();
        assert!(critical < low);
        assert!(md.contains("[View full report](https://app.cerberus-ai.com/reports/r-1)"));
    }

    #[test]
    fn test_unknown_severity_uses_default_icon() {
        let result = result_with(&["informational"]);
        assert!(pr_comment(&result).contains("- ⚪ **Violation 1**"));
        assert!(summary(&result).contains("### ⚪ Violation 1"));
    }
}
