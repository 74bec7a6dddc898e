use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Violation severity as reported by the compliance server.
///
/// Input is case-insensitive and always stored lowercase. Anything outside
/// the four known levels is kept as `Unknown` so it can still be rendered,
/// and a `null` severity is the default `Unknown("unknown")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Unknown(String),
}

/// The known severities in ascending order.
pub const SEVERITY_LEVELS: [Severity; 4] = [
    Severity::Low,
    Severity::Medium,
    Severity::High,
    Severity::Critical,
];

impl Severity {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Unknown(normalized),
        }
    }

    /// Position in the fixed ranking `[low, medium, high, critical]`, `-1` if unknown.
    pub fn ordinal(&self) -> i8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
            Severity::Unknown(_) => -1,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown(raw) => raw,
        }
    }

    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Bucket name used in severity breakdowns; all unknown levels share "Other".
    pub fn bucket_name(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Unknown(_) => "Other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::High => "🟠",
            Severity::Medium => "🟡",
            Severity::Low => "🔵",
            Severity::Unknown(_) => "⚪",
        }
    }

    pub fn sarif_level(&self) -> &'static str {
        match self {
            Severity::Critical | Severity::High => "error",
            Severity::Medium => "warning",
            Severity::Low => "note",
            Severity::Unknown(_) => "warning",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Severity::Unknown(_))
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        Severity::parse(&raw)
    }
}

impl From<Option<String>> for Severity {
    fn from(raw: Option<String>) -> Self {
        raw.map(Severity::from).unwrap_or_default()
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Unknown("unknown".to_string())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single finding returned by the compliance server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Violation {
    #[serde(deserialize_with = "null_as_default")]
    pub rule_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub rule_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    pub severity: Severity,
    #[serde(deserialize_with = "null_as_default")]
    pub framework: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Violation {
    /// Line to report for this violation; `1` when absent or not positive.
    pub fn line(&self) -> u64 {
        self.line_number.filter(|n| *n > 0).unwrap_or(1)
    }

    /// `file:line` when the server attached a file path.
    pub fn location(&self) -> Option<String> {
        self.file_path
            .as_ref()
            .map(|path| format!("{}:{}", path, self.line()))
    }

    /// Text used where a single-line message is needed.
    pub fn display_message(&self) -> &str {
        if !self.message.is_empty() {
            &self.message
        } else if !self.description.is_empty() {
            &self.description
        } else {
            &self.title
        }
    }
}

/// The scoring response. Absent or `null` fields take their defaults, unknown
/// fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub compliance_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub violations: Vec<Violation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frameworks_checked: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub human_review_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Violation counts bucketed by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl SeverityCounts {
    /// Count for the bucket `severity` falls into.
    pub fn get(&self, severity: &Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unknown(_) => self.unknown,
        }
    }
}

impl ComplianceResult {
    /// Score as published in step outputs: rounded and clamped to 0-100.
    pub fn score_percent(&self) -> u8 {
        if !self.compliance_score.is_finite() {
            return 0;
        }
        self.compliance_score.round().clamp(0.0, 100.0) as u8
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for violation in &self.violations {
            match violation.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Unknown(_) => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn frameworks_display(&self) -> String {
        if self.frameworks_checked.is_empty() {
            "none".to_string()
        } else {
            self.frameworks_checked.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        for raw in ["critical", "CRITICAL", "Critical", " cRiTiCaL "] {
            assert_eq!(Severity::parse(raw), Severity::Critical);
        }
        assert_eq!(Severity::parse("Low"), Severity::Low);
        assert_eq!(Severity::parse("MEDIUM"), Severity::Medium);
        assert_eq!(Severity::parse("hIgH"), Severity::High);
    }

    #[test]
    fn test_unknown_severity_is_normalized() {
        let severity = Severity::parse("Informational");
        assert_eq!(severity, Severity::Unknown("informational".to_string()));
        assert_eq!(severity.ordinal(), -1);
        assert_eq!(severity.icon(), "⚪");
        assert_eq!(severity.sarif_level(), "warning");
        assert_eq!(severity.label(), "INFORMATIONAL");
    }

    #[test]
    fn test_severity_ordinals_ascend() {
        let ordinals: Vec<i8> = SEVERITY_LEVELS.iter().map(|s| s.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_severity_table() {
        assert_eq!(Severity::Critical.icon(), "🔴");
        assert_eq!(Severity::High.icon(), "🟠");
        assert_eq!(Severity::Medium.icon(), "🟡");
        assert_eq!(Severity::Low.icon(), "🔵");
        assert_eq!(Severity::Critical.sarif_level(), "error");
        assert_eq!(Severity::High.sarif_level(), "error");
        assert_eq!(Severity::Medium.sarif_level(), "warning");
        assert_eq!(Severity::Low.sarif_level(), "note");
    }

    #[test]
    fn test_violation_deserializes_with_missing_fields() {
        let v: Violation =
            serde_json::from_str(r#"{"ruleId":"E8-01","severity":"HIGH","filePath":"src/a.rs"}"#)
                .unwrap();
        assert_eq!(v.rule_id, "E8-01");
        assert_eq!(v.severity, Severity::High);
        assert_eq!(v.line(), 1);
        assert_eq!(v.location().as_deref(), Some("src/a.rs:1"));
        assert!(v.remediation.is_none());
    }

    #[test]
    fn test_zero_line_number_falls_back_to_one() {
        let v = Violation {
            line_number: Some(0),
            ..Default::default()
        };
        assert_eq!(v.line(), 1);
    }

    #[test]
    fn test_result_defaults_when_fields_absent() {
        let result: ComplianceResult = serde_json::from_str(r#"{"violations":[]}"#).unwrap();
        assert_eq!(result.compliance_score, 0.0);
        assert!(result.frameworks_checked.is_empty());
        assert!(!result.human_review_required);
        assert!(result.report_url.is_none());
    }

    #[test]
    fn test_result_keeps_unknown_fields() {
        let result: ComplianceResult =
            serde_json::from_str(r#"{"complianceScore":88,"checkId":"abc-123"}"#).unwrap();
        assert_eq!(result.extra["checkId"], "abc-123");
        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["checkId"], "abc-123");
    }

    #[test]
    fn test_null_fields_read_as_absent() {
        let result: ComplianceResult = serde_json::from_str(
            r#"{"complianceScore":null,"frameworksChecked":null,"humanReviewRequired":null,
                "violations":[{"ruleId":"X","title":null,"severity":null,"lineNumber":null}]}"#,
        )
        .unwrap();
        assert_eq!(result.compliance_score, 0.0);
        assert!(result.frameworks_checked.is_empty());
        assert!(!result.human_review_required);
        assert_eq!(result.violations[0].rule_id, "X");
        assert_eq!(result.violations[0].title, "");
        assert_eq!(result.violations[0].severity, Severity::default());
        assert_eq!(result.violations[0].line(), 1);

        let result: ComplianceResult = serde_json::from_str(r#"{"violations":null}"#).unwrap();
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_counts_lookup_by_bucket() {
        let counts = SeverityCounts {
            critical: 1,
            high: 2,
            unknown: 3,
            ..Default::default()
        };
        assert_eq!(counts.get(&Severity::High), 2);
        assert_eq!(counts.get(&Severity::parse("info")), 3);
        assert_eq!(Severity::parse("info").bucket_name(), "Other");
    }

    #[test]
    fn test_score_percent_rounds_and_clamps() {
        let mut result = ComplianceResult {
            compliance_score: 87.6,
            ..Default::default()
        };
        assert_eq!(result.score_percent(), 88);
        result.compliance_score = 140.0;
        assert_eq!(result.score_percent(), 100);
        result.compliance_score = -3.0;
        assert_eq!(result.score_percent(), 0);
    }

    #[test]
    fn test_severity_counts() {
        let result = ComplianceResult {
            violations: ["critical", "high", "HIGH", "low", "informational"]
                .iter()
                .map(|s| Violation {
                    severity: Severity::parse(s),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };
        let counts = result.severity_counts();
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.high, 2);
        assert_eq!(counts.medium, 0);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.unknown, 1);
    }
}
