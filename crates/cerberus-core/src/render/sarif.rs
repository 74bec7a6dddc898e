use crate::model::{ComplianceResult, Violation};
use serde_json::json;

pub const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json";

/// Generate a SARIF 2.1.0 document from a compliance result.
///
/// Rules are emitted one per violation, in violation order, so a rule id
/// that fires on several files appears several times. Code-scanning
/// consumers accept the repetition.
pub fn to_sarif(result: &ComplianceResult) -> serde_json::Value {
    let rules: Vec<serde_json::Value> = result.violations.iter().map(sarif_rule).collect();

    let results: Vec<serde_json::Value> = result
        .violations
        .iter()
        .enumerate()
        .map(|(i, v)| sarif_result(i, v))
        .collect();

    json!({
        "$schema": SARIF_SCHEMA,
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "Cerberus AI",
                    "version": env!("CARGO_PKG_VERSION"),
                    "informationUri": "https://cerberus-ai.com",
                    "rules": rules,
                }
            },
            "results": results,
            "properties": {
                "complianceScore": result.compliance_score,
                "frameworksChecked": result.frameworks_checked,
                "humanReviewRequired": result.human_review_required,
            }
        }]
    })
}

fn rule_id(violation: &Violation) -> String {
    format!("cerberus-{}", violation.rule_id)
}

fn sarif_rule(violation: &Violation) -> serde_json::Value {
    let mut rule = json!({
        "id": rule_id(violation),
        "name": violation.rule_name,
        "shortDescription": {
            "text": violation.title,
        },
        "fullDescription": {
            "text": violation.description,
        },
        "defaultConfiguration": {
            "level": violation.severity.sarif_level(),
        },
        "properties": {
            "framework": violation.framework,
            "category": violation.category,
            "severity": violation.severity.as_str(),
        }
    });

    if let Some(remediation) = &violation.remediation {
        rule["help"] = json!({ "text": remediation });
    }

    rule
}

fn sarif_result(index: usize, violation: &Violation) -> serde_json::Value {
    json!({
        "ruleId": rule_id(violation),
        "ruleIndex": index,
        "level": violation.severity.sarif_level(),
        "message": {
            "text": violation.display_message(),
        },
        "locations": [{
            "physicalLocation": {
                "artifactLocation": {
                    "uri": violation.file_path.as_deref().unwrap_or("unknown"),
                },
                "region": {
                    "startLine": violation.line(),
                }
            }
        }],
    })
}
