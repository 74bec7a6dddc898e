//! Report rendering. Every renderer is a pure function of the result.

pub mod html;
pub mod junit;
pub mod markdown;
pub mod sarif;

use crate::error::RenderError;
use crate::model::ComplianceResult;
use std::fmt;
use std::str::FromStr;

/// A single rendered representation of a compliance result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Json,
    Sarif,
    MarkdownSummary,
    PrComment,
    Html,
    Junit,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Sarif => "sarif",
            ReportFormat::MarkdownSummary => "markdown-summary",
            ReportFormat::PrComment => "pr-comment",
            ReportFormat::Html => "html",
            ReportFormat::Junit => "junit",
        }
    }

    /// File name used when the format is written to the output directory.
    /// The PR comment is never written to disk.
    pub fn file_name(&self) -> Option<&'static str> {
        match self {
            ReportFormat::Json => Some("compliance-report.json"),
            ReportFormat::Sarif => Some("compliance-results.sarif"),
            ReportFormat::MarkdownSummary => Some("compliance-summary.md"),
            ReportFormat::Html => Some("compliance-report.html"),
            ReportFormat::Junit => Some("compliance-junit.xml"),
            ReportFormat::PrComment => None,
        }
    }
}

impl FromStr for ReportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "sarif" => Ok(ReportFormat::Sarif),
            "markdown-summary" | "markdown" | "summary" | "md" => {
                Ok(ReportFormat::MarkdownSummary)
            }
            "pr-comment" | "comment" => Ok(ReportFormat::PrComment),
            "html" => Ok(ReportFormat::Html),
            "junit" | "xml" => Ok(ReportFormat::Junit),
            _ => Err(RenderError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a result in the given format.
pub fn render(result: &ComplianceResult, format: ReportFormat) -> Result<String, RenderError> {
    check_renderable(result)?;

    match format {
        ReportFormat::Json => {
            serde_json::to_string_pretty(result).map_err(|e| RenderError::Serialization {
                format: format.to_string(),
                reason: e.to_string(),
            })
        }
        ReportFormat::Sarif => {
            let doc = sarif::to_sarif(result);
            serde_json::to_string_pretty(&doc).map_err(|e| RenderError::Serialization {
                format: format.to_string(),
                reason: e.to_string(),
            })
        }
        ReportFormat::MarkdownSummary => Ok(markdown::summary(result)),
        ReportFormat::PrComment => Ok(markdown::pr_comment(result)),
        ReportFormat::Html => Ok(html::generate_html_report(result)),
        ReportFormat::Junit => junit::to_junit(result),
    }
}

fn check_renderable(result: &ComplianceResult) -> Result<(), RenderError> {
    let score = result.compliance_score;
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(RenderError::ScoreOutOfRange(score));
    }
    Ok(())
}

/// Score formatted for display: integral scores without decimals.
pub(crate) fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{:.1}", score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Severity, SEVERITY_LEVELS};
    use crate::test_support::result_with;

    #[test]
    fn test_json_round_trip() {
        let mut result = result_with(&["critical", "Low", "informational"]);
        result.violations[1].line_number = None;
        result.violations[1].file_path = None;
        result.violations[2].remediation = None;
        result
            .extra
            .insert("checkId".to_string(), serde_json::json!("chk-9"));

        let json = render(&result, ReportFormat::Json).unwrap();
        let parsed: ComplianceResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_out_of_range_score_is_rejected() {
        let mut result = result_with(&[]);
        result.compliance_score = 120.0;
        for format in [ReportFormat::Json, ReportFormat::Sarif, ReportFormat::PrComment] {
            assert!(matches!(
                render(&result, format),
                Err(RenderError::ScoreOutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("summary".parse::<ReportFormat>().unwrap(), ReportFormat::MarkdownSummary);
        assert_eq!("SARIF".parse::<ReportFormat>().unwrap(), ReportFormat::Sarif);
        assert_eq!("pr-comment".parse::<ReportFormat>().unwrap(), ReportFormat::PrComment);
        assert!("pdf".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_severity_mapping_consistent_across_renderers() {
        for level in SEVERITY_LEVELS.iter() {
            let mut capitalized = level.as_str().to_string();
            capitalized[..1].make_ascii_uppercase();

            for raw in [level.as_str().to_string(), level.label(), capitalized] {
                let result = result_with(&[raw.as_str()]);
                let severity = Severity::parse(&raw);
                assert_eq!(&severity, level);

                let sarif: serde_json::Value =
                    serde_json::from_str(&render(&result, ReportFormat::Sarif).unwrap()).unwrap();
                assert_eq!(sarif["runs"][0]["results"][0]["level"], level.sarif_level());

                let summary = render(&result, ReportFormat::MarkdownSummary).unwrap();
                assert!(summary.contains(level.icon()));
                assert!(summary.contains(&level.label()));

                let comment = render(&result, ReportFormat::PrComment).unwrap();
                assert!(comment.contains(level.icon()));

                let html = render(&result, ReportFormat::Html).unwrap();
                assert!(html.contains(&level.label()));
            }
        }
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(85.0), "85");
        assert_eq!(format_score(85.4), "85.4");
    }
}
