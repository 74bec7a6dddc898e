//! Output publishing: report files in the output directory and step
//! outputs in the CI platform's own convention.

use crate::context::platform::Platform;
use crate::context::CiEnvironment;
use crate::error::{PipelineError, PublishWarning};
use crate::model::ComplianceResult;
use crate::render::ReportFormat;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const GITLAB_DOTENV_FILE: &str = "compliance.env";
pub const JENKINS_PROPERTIES_FILE: &str = "compliance.properties";

/// A report rendered in memory, ready to be written.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub format: ReportFormat,
    pub content: String,
}

/// Values exposed to later CI steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StepOutputs {
    pub violations_found: usize,
    pub frameworks_checked: String,
    pub compliance_score: u8,
    pub human_review_required: bool,
    pub report_url: String,
}

impl StepOutputs {
    pub fn from_result(result: &ComplianceResult) -> Self {
        Self {
            violations_found: result.violations.len(),
            frameworks_checked: result.frameworks_checked.join(","),
            compliance_score: result.score_percent(),
            human_review_required: result.human_review_required,
            report_url: result.report_url.clone().unwrap_or_default(),
        }
    }

    /// Outputs as `(key, value)` pairs with kebab-case keys, in a fixed order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("violations-found", self.violations_found.to_string()),
            ("frameworks-checked", self.frameworks_checked.clone()),
            ("compliance-score", self.compliance_score.to_string()),
            ("human-review-required", self.human_review_required.to_string()),
            ("report-url", self.report_url.clone()),
        ]
    }
}

/// Write every report file into `output_dir`, creating it if missing.
/// Any failure is fatal; reports without a file name are skipped.
pub fn write_reports(
    output_dir: &Path,
    reports: &[RenderedReport],
) -> Result<Vec<PathBuf>, PipelineError> {
    fs::create_dir_all(output_dir).map_err(|source| PipelineError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for report in reports {
        let Some(file_name) = report.format.file_name() else {
            continue;
        };
        let path = output_dir.join(file_name);
        fs::write(&path, &report.content).map_err(|source| PipelineError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), format = %report.format, "report written");
        written.push(path);
    }

    Ok(written)
}

/// Files written and problems met while publishing step outputs.
#[derive(Debug, Clone, Default)]
pub struct StepOutputReport {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<PublishWarning>,
}

/// Publish step outputs for `platform`. Never fails the run; problems come
/// back as warnings.
pub fn write_step_outputs(
    platform: Platform,
    env: &CiEnvironment,
    output_dir: &Path,
    outputs: &StepOutputs,
    summary_markdown: Option<&str>,
) -> StepOutputReport {
    let mut report = StepOutputReport::default();

    let mut record = |target: &str, result: std::io::Result<PathBuf>| match result {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "step outputs written");
            report.files.push(path);
        }
        Err(e) => {
            tracing::warn!(output = target, error = %e, "failed to write step outputs");
            report
                .warnings
                .push(PublishWarning::new(target, e.to_string()));
        }
    };

    match platform {
        Platform::GitHub => {
            if let Some(path) = env.get("GITHUB_OUTPUT") {
                record(
                    "GITHUB_OUTPUT",
                    append_lines(Path::new(path), &key_value_lines(outputs, |k| k.to_string())),
                );
            }
            if let (Some(path), Some(summary)) = (env.get("GITHUB_STEP_SUMMARY"), summary_markdown)
            {
                record("GITHUB_STEP_SUMMARY", append_lines(Path::new(path), summary));
            }
        }
        Platform::GitLab => {
            let path = output_dir.join(GITLAB_DOTENV_FILE);
            record(
                GITLAB_DOTENV_FILE,
                write_file(&path, &key_value_lines(outputs, upper_snake)),
            );
        }
        Platform::Jenkins => {
            let path = output_dir.join(JENKINS_PROPERTIES_FILE);
            record(
                JENKINS_PROPERTIES_FILE,
                write_file(&path, &key_value_lines(outputs, |k| k.to_string())),
            );
        }
        Platform::Local => {}
    }

    report
}

/// One `key=value` line per output. Server-supplied values may not break
/// the line, so `\r` and `\n` become spaces.
fn key_value_lines(outputs: &StepOutputs, key: impl Fn(&str) -> String) -> String {
    outputs
        .pairs()
        .into_iter()
        .map(|(k, v)| format!("{}={}\n", key(k), v.replace(['\r', '\n'], " ")))
        .collect()
}

/// `compliance-score` -> `COMPLIANCE_SCORE`
pub fn upper_snake(key: &str) -> String {
    key.replace('-', "_").to_uppercase()
}

fn append_lines(path: &Path, content: &str) -> std::io::Result<PathBuf> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    Ok(path.to_path_buf())
}

fn write_file(path: &Path, content: &str) -> std::io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::result_with;

    fn env_with(vars: &[(&str, String)], dir: &Path) -> CiEnvironment {
        CiEnvironment::from_vars(
            vars.iter().map(|(k, v)| (k.to_string(), v.clone())),
            dir,
        )
    }

    #[test]
    fn test_step_outputs_from_result() {
        let mut result = result_with(&["high", "low"]);
        result.compliance_score = 82.6;
        let outputs = StepOutputs::from_result(&result);

        assert_eq!(outputs.violations_found, 2);
        assert_eq!(outputs.frameworks_checked, "essential8,soc2");
        assert_eq!(outputs.compliance_score, 83);
        assert!(!outputs.human_review_required);
        assert_eq!(outputs.report_url, "https://app.cerberus-ai.com/reports/r-1");
    }

    #[test]
    fn test_report_url_empty_when_absent() {
        let mut result = result_with(&[]);
        result.report_url = None;
        let outputs = StepOutputs::from_result(&result);
        assert_eq!(outputs.report_url, "");
        assert!(outputs.pairs().contains(&("report-url", String::new())));
    }

    #[test]
    fn test_write_reports_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports/compliance");
        let reports = vec![
            RenderedReport {
                format: ReportFormat::Json,
                content: "{}".to_string(),
            },
            RenderedReport {
                format: ReportFormat::PrComment,
                content: "comment".to_string(),
            },
        ];

        let written = write_reports(&out, &reports).unwrap();
        assert_eq!(written, vec![out.join("compliance-report.json")]);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "{}");
    }

    #[test]
    fn test_write_reports_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let reports = vec![RenderedReport {
            format: ReportFormat::Sarif,
            content: "{}".to_string(),
        }];

        let err = write_reports(&blocker, &reports).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn test_github_outputs_appended() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("gh_output");
        let summary = dir.path().join("gh_summary");
        fs::write(&output, "previous=1\n").unwrap();
        let env = env_with(
            &[
                ("GITHUB_OUTPUT", output.display().to_string()),
                ("GITHUB_STEP_SUMMARY", summary.display().to_string()),
            ],
            dir.path(),
        );

        let outputs = StepOutputs::from_result(&result_with(&["critical"]));
        let report =
            write_step_outputs(Platform::GitHub, &env, dir.path(), &outputs, Some("# Report"));

        assert!(report.warnings.is_empty());
        let content = fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("previous=1\n"));
        assert!(content.contains("violations-found=1\n"));
        assert!(content.contains("compliance-score=82\n"));
        assert!(content.contains("human-review-required=false\n"));
        assert_eq!(fs::read_to_string(&summary).unwrap(), "# Report\n");
    }

    #[test]
    fn test_gitlab_dotenv_keys_are_upper_snake() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with(&[], dir.path());
        let outputs = StepOutputs::from_result(&result_with(&["medium"]));

        let report = write_step_outputs(Platform::GitLab, &env, dir.path(), &outputs, None);
        assert_eq!(report.files, vec![dir.path().join(GITLAB_DOTENV_FILE)]);

        let content = fs::read_to_string(dir.path().join(GITLAB_DOTENV_FILE)).unwrap();
        assert!(content.contains("COMPLIANCE_SCORE=82\n"));
        assert!(content.contains("FRAMEWORKS_CHECKED=essential8,soc2\n"));
        assert!(!content.contains("compliance-score"));
    }

    #[test]
    fn test_line_breaks_in_values_cannot_add_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("github_output");
        let env = env_with(&[("GITHUB_OUTPUT", output.display().to_string())], dir.path());
        let mut result = result_with(&[]);
        result.frameworks_checked = vec!["soc2\nhuman-review-required=true".to_string()];
        result.report_url = Some("https://example.test/r\r\ncompliance-score=100".to_string());
        let outputs = StepOutputs::from_result(&result);

        write_step_outputs(Platform::GitHub, &env, dir.path(), &outputs, None);
        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content.lines().count(), 5);
        assert!(content.contains("frameworks-checked=soc2 human-review-required=true\n"));
        assert!(content.contains("human-review-required=false\n"));
        assert!(!content.lines().any(|l| l == "compliance-score=100"));

        write_step_outputs(Platform::GitLab, &env, dir.path(), &outputs, None);
        let dotenv = fs::read_to_string(dir.path().join(GITLAB_DOTENV_FILE)).unwrap();
        assert_eq!(dotenv.lines().count(), 5);
    }

    #[test]
    fn test_jenkins_properties_written() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with(&[], dir.path());
        let outputs = StepOutputs::from_result(&result_with(&[]));

        write_step_outputs(Platform::Jenkins, &env, dir.path(), &outputs, None);
        let content = fs::read_to_string(dir.path().join(JENKINS_PROPERTIES_FILE)).unwrap();
        assert!(content.contains("violations-found=0\n"));
    }

    #[test]
    fn test_unwritable_output_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with(
            &[(
                "GITHUB_OUTPUT",
                dir.path().join("missing/dir/out").display().to_string(),
            )],
            dir.path(),
        );
        let outputs = StepOutputs::from_result(&result_with(&[]));

        let report = write_step_outputs(Platform::GitHub, &env, dir.path(), &outputs, None);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].target, "GITHUB_OUTPUT");
    }

    #[test]
    fn test_local_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with(&[], dir.path());
        let outputs = StepOutputs::from_result(&result_with(&[]));
        let report = write_step_outputs(Platform::Local, &env, dir.path(), &outputs, None);
        assert!(report.files.is_empty());
        assert!(report.warnings.is_empty());
    }
}
