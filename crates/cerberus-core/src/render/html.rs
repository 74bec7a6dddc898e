use super::format_score;
use super::markdown::score_color;
use crate::model::{ComplianceResult, Severity, Violation, SEVERITY_LEVELS};

/// Generate a self-contained HTML compliance report.
///
/// All server-provided text is escaped; the page loads no external assets.
pub fn generate_html_report(result: &ComplianceResult) -> String {
    let counts = result.severity_counts();
    let breakdown = SEVERITY_LEVELS
        .iter()
        .rev()
        .chain(std::iter::once(&Severity::default()))
        .map(|severity| format!("{} {}", severity.icon(), counts.get(severity)))
        .collect::<Vec<_>>()
        .join(" · ");
    let violations_html = if result.violations.is_empty() {
        r#"<p class="empty">✅ No compliance violations found.</p>"#.to_string()
    } else {
        result
            .violations
            .iter()
            .map(violation_card)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let review_banner = if result.human_review_required {
        r#"<div class="banner">⚠️ <strong>Human review required.</strong> One or more findings need expert judgment beyond automated rules.</div>"#
    } else {
        ""
    };

    let report_link = match &result.report_url {
        Some(url) => format!(
            r#"<p class="report-link"><a href="{url}">View full report</a></p>"#,
            url = escape_html(url)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Cerberus AI Compliance Report</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}

        :root {{
            --bg-primary: #ffffff;
            --bg-secondary: #f8fafc;
            --text-primary: #1e293b;
            --text-secondary: #64748b;
            --border-color: #e2e8f0;
            --green: #22c55e;
            --yellow: #f59e0b;
            --red: #ef4444;
            --orange: #f97316;
            --blue: #3b82f6;
            --grey: #94a3b8;
            --shadow: 0 1px 3px rgba(0,0,0,0.1);
        }}

        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
            padding: 2rem;
        }}

        .container {{ max-width: 1100px; margin: 0 auto; }}

        h1 {{
            font-size: 2rem;
            margin-bottom: 1.5rem;
            padding-bottom: 1rem;
            border-bottom: 2px solid var(--border-color);
        }}

        .stats-grid {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
            gap: 1.5rem;
            margin-bottom: 2rem;
        }}

        .stat-card {{
            background: var(--bg-secondary);
            padding: 1.5rem;
            border-radius: 0.75rem;
            border: 1px solid var(--border-color);
            box-shadow: var(--shadow);
        }}

        .stat-label {{ font-size: 0.875rem; color: var(--text-secondary); }}
        .stat-value {{ font-size: 2rem; font-weight: 700; }}
        .score-green {{ color: var(--green); }}
        .score-yellow {{ color: var(--yellow); }}
        .score-red {{ color: var(--red); }}

        .banner {{
            padding: 1rem;
            margin-bottom: 2rem;
            border-radius: 0.5rem;
            background: #fef3c7;
            border: 1px solid var(--yellow);
        }}

        .violation {{
            padding: 1rem;
            margin-bottom: 1rem;
            border-left: 4px solid var(--grey);
            border-radius: 0.5rem;
            background: var(--bg-secondary);
        }}

        .violation.critical {{ border-color: var(--red); }}
        .violation.high {{ border-color: var(--orange); }}
        .violation.medium {{ border-color: var(--yellow); }}
        .violation.low {{ border-color: var(--blue); }}

        .violation-header {{
            display: flex;
            justify-content: space-between;
            align-items: center;
            margin-bottom: 0.5rem;
            font-weight: 600;
        }}

        .severity-badge {{
            padding: 0.25rem 0.75rem;
            border-radius: 1rem;
            font-size: 0.75rem;
            color: white;
            background: var(--grey);
        }}

        .severity-badge.critical {{ background: var(--red); }}
        .severity-badge.high {{ background: var(--orange); }}
        .severity-badge.medium {{ background: var(--yellow); }}
        .severity-badge.low {{ background: var(--blue); }}

        .meta {{ font-size: 0.875rem; color: var(--text-secondary); }}
        .remediation {{ margin-top: 0.75rem; font-size: 0.875rem; }}
        .empty, .report-link {{ color: var(--text-secondary); margin-top: 1rem; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>🛡️ Cerberus AI Compliance Report</h1>

        <div class="stats-grid">
            <div class="stat-card">
                <div class="stat-label">Compliance Score</div>
                <div class="stat-value score-{color}">{score}/100</div>
            </div>
            <div class="stat-card">
                <div class="stat-label">Violations</div>
                <div class="stat-value">{violation_count}</div>
            </div>
            <div class="stat-card">
                <div class="stat-label">Frameworks Checked</div>
                <div>{frameworks}</div>
            </div>
            <div class="stat-card">
                <div class="stat-label">By Severity</div>
                <div>{breakdown}</div>
            </div>
        </div>

        {review_banner}

        {violations_html}

        {report_link}
    </div>
</body>
</html>
"#,
        color = score_color(result.compliance_score),
        score = format_score(result.compliance_score),
        violation_count = result.violations.len(),
        frameworks = escape_html(&result.frameworks_display()),
        breakdown = breakdown,
        review_banner = review_banner,
        violations_html = violations_html,
        report_link = report_link,
    )
}

fn severity_class(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "critical",
        Severity::High => "high",
        Severity::Medium => "medium",
        Severity::Low => "low",
        Severity::Unknown(_) => "unknown",
    }
}

fn violation_card(violation: &Violation) -> String {
    let class = severity_class(&violation.severity);
    let location = violation
        .location()
        .map(|l| format!(" · <code>{}</code>", escape_html(&l)))
        .unwrap_or_default();
    let remediation = violation
        .remediation
        .as_ref()
        .map(|r| {
            format!(
                r#"<div class="remediation"><strong>💡 Remediation:</strong> {}</div>"#,
                escape_html(r)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="violation {class}">
            <div class="violation-header">
                <span>{icon} {title}</span>
                <span class="severity-badge {class}">{label}</span>
            </div>
            <div class="meta">{framework} · {rule}{location}</div>
            <p>{description}</p>
            {remediation}
        </div>"#,
        class = class,
        icon = violation.severity.icon(),
        title = escape_html(&violation.title),
        label = escape_html(&violation.severity.label()),
        framework = escape_html(&violation.framework),
        rule = escape_html(&violation.rule_id),
        location = location,
        description = escape_html(&violation.description),
        remediation = remediation,
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
