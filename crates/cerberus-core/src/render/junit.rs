use crate::error::RenderError;
use crate::model::{ComplianceResult, Violation};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TestSuites {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@tests")]
    tests: usize,
    #[serde(rename = "@failures")]
    failures: usize,
    testsuite: Vec<TestSuite>,
}

#[derive(Debug, Serialize)]
struct TestSuite {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@tests")]
    tests: usize,
    #[serde(rename = "@failures")]
    failures: usize,
    testcase: Vec<TestCase>,
}

#[derive(Debug, Serialize)]
struct TestCase {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@classname")]
    classname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<Failure>,
}

#[derive(Debug, Serialize)]
struct Failure {
    #[serde(rename = "@message")]
    message: String,
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "$text")]
    body: String,
}

/// Render the result as JUnit XML, one suite per framework.
///
/// A clean result still produces one passing test case so that test-result
/// publishers do not treat the report as empty.
pub fn to_junit(result: &ComplianceResult) -> Result<String, RenderError> {
    let mut suites: Vec<TestSuite> = Vec::new();

    for violation in &result.violations {
        let suite_name = if violation.framework.is_empty() {
            "compliance".to_string()
        } else {
            violation.framework.clone()
        };
        let case = failing_case(violation, &suite_name);

        match suites.iter_mut().find(|s| s.name == suite_name) {
            Some(suite) => {
                suite.tests += 1;
                suite.failures += 1;
                suite.testcase.push(case);
            }
            None => suites.push(TestSuite {
                name: suite_name,
                tests: 1,
                failures: 1,
                testcase: vec![case],
            }),
        }
    }

    if suites.is_empty() {
        suites.push(TestSuite {
            name: "compliance".to_string(),
            tests: 1,
            failures: 0,
            testcase: vec![TestCase {
                name: format!("compliance check ({})", result.frameworks_display()),
                classname: "cerberus".to_string(),
                failure: None,
            }],
        });
    }

    let doc = TestSuites {
        name: "Cerberus AI Compliance".to_string(),
        tests: suites.iter().map(|s| s.tests).sum(),
        failures: suites.iter().map(|s| s.failures).sum(),
        testsuite: suites,
    };

    let xml = quick_xml::se::to_string_with_root("testsuites", &doc).map_err(|e| {
        RenderError::Serialization {
            format: "junit".to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n", xml))
}

fn failing_case(violation: &Violation, suite_name: &str) -> TestCase {
    let mut body = violation.description.clone();
    if let Some(location) = violation.location() {
        body.push_str(&format!("\nLocation: {}", location));
    }
    if let Some(remediation) = &violation.remediation {
        body.push_str(&format!("\nRemediation: {}", remediation));
    }

    TestCase {
        name: format!("{}: {}", violation.rule_id, violation.title),
        classname: format!("cerberus.{}", suite_name),
        failure: Some(Failure {
            message: violation.display_message().to_string(),
            kind: violation.severity.label(),
            body,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::result_with;

    #[test]
    fn test_junit_groups_by_framework() {
        let mut result = result_with(&["critical", "low", "high"]);
        result.violations[1].framework = "soc2".to_string();
        let xml = to_junit(&result).unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<testsuites name="Cerberus AI Compliance" tests="3" failures="3">"#));
        assert!(xml.contains(r#"<testsuite name="essential8" tests="2" failures="2">"#));
        assert!(xml.contains(r#"<testsuite name="soc2" tests="1" failures="1">"#));
        assert!(xml.contains(r#"type="CRITICAL""#));
        assert!(xml.contains("Location: src/module_1.rs:11"));
    }

    #[test]
    fn test_junit_clean_result_has_passing_case() {
        let xml = to_junit(&result_with(&[])).unwrap();
        assert!(xml.contains(r#"tests="1" failures="0""#));
        assert!(xml.contains("compliance check (essential8, soc2)"));
        assert!(!xml.contains("<failure"));
    }

    #[test]
    fn test_junit_escapes_text() {
        let mut result = result_with(&["medium"]);
        result.violations[0].description = "a < b & c".to_string();
        let xml = to_junit(&result).unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
    }
}
