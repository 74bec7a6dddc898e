use crate::model::{ComplianceResult, Severity};
use serde::{Deserialize, Serialize};

/// Settings that decide whether a check fails the CI job.
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub fail_on_violations: bool,
    pub severity_threshold: Severity,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            fail_on_violations: true,
            severity_threshold: Severity::Medium,
        }
    }
}

/// Pass/fail verdict for the job. Derived from a result, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub should_fail: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GateDecision {
    fn pass() -> Self {
        Self {
            should_fail: false,
            reason: None,
        }
    }
}

/// Decide whether the job fails.
///
/// Fails only when `fail_on_violations` is set and at least one violation
/// ranks at or above the threshold. Unknown severities rank `-1` and so can
/// never trip the gate.
pub fn decide(result: &ComplianceResult, config: &GateConfig) -> GateDecision {
    if !config.fail_on_violations || result.violations.is_empty() {
        return GateDecision::pass();
    }

    let threshold = config.severity_threshold.ordinal();
    let blocking = result
        .violations
        .iter()
        .filter(|v| v.severity.ordinal() >= threshold)
        .count();

    if blocking == 0 {
        return GateDecision::pass();
    }

    GateDecision {
        should_fail: true,
        reason: Some(format!(
            "Found {} violation(s) at or above '{}' severity (score {}/100)",
            blocking,
            config.severity_threshold,
            result.score_percent()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SEVERITY_LEVELS;
    use crate::test_support::result_with;

    fn config(threshold: &str, fail_on_violations: bool) -> GateConfig {
        GateConfig {
            fail_on_violations,
            severity_threshold: Severity::parse(threshold),
        }
    }

    #[test]
    fn test_high_violation_fails_medium_threshold() {
        let decision = decide(&result_with(&["high"]), &config("medium", true));
        assert!(decision.should_fail);
        assert!(decision.reason.unwrap().contains("1 violation(s)"));
    }

    #[test]
    fn test_critical_threshold_ignores_lower_severities() {
        let decision = decide(&result_with(&["high", "medium"]), &config("critical", true));
        assert!(!decision.should_fail);
        assert!(decision.reason.is_none());
    }

    #[test]
    fn test_disabled_gate_never_fails() {
        let decision = decide(&result_with(&["critical"]), &config("low", false));
        assert!(!decision.should_fail);
    }

    #[test]
    fn test_no_violations_never_fails() {
        for threshold in SEVERITY_LEVELS.iter() {
            let gate = GateConfig {
                fail_on_violations: true,
                severity_threshold: threshold.clone(),
            };
            assert!(!decide(&result_with(&[]), &gate).should_fail);
        }
    }

    #[test]
    fn test_unknown_severity_never_trips() {
        for threshold in SEVERITY_LEVELS.iter() {
            let gate = GateConfig {
                fail_on_violations: true,
                severity_threshold: threshold.clone(),
            };
            assert!(!decide(&result_with(&["informational"]), &gate).should_fail);
        }
    }

    #[test]
    fn test_threshold_matrix() {
        for threshold in SEVERITY_LEVELS.iter() {
            for severity in SEVERITY_LEVELS.iter() {
                let gate = GateConfig {
                    fail_on_violations: true,
                    severity_threshold: threshold.clone(),
                };
                let upper = severity.as_str().to_uppercase();
                let decision = decide(&result_with(&[upper.as_str()]), &gate);
                assert_eq!(
                    decision.should_fail,
                    severity.ordinal() >= threshold.ordinal(),
                    "severity {} vs threshold {}",
                    severity,
                    threshold
                );
            }
        }
    }

    #[test]
    fn test_reason_counts_only_blocking_violations() {
        let decision = decide(
            &result_with(&["low", "critical", "high", "informational"]),
            &config("high", true),
        );
        assert!(decision.should_fail);
        assert!(decision.reason.unwrap().starts_with("Found 2 violation(s)"));
    }
}
