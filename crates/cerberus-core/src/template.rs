//! Ready-to-use CI snippets that run `cerberus check`.

use crate::publish::GITLAB_DOTENV_FILE;
use crate::render::ReportFormat;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

const INSTALL_COMMAND: &str = "cargo install --locked cerberus-cli";

fn check_command(post_comment: bool) -> String {
    let mut cmd = "cerberus check --output-format all".to_string();
    if post_comment {
        cmd.push_str(" --post-comment");
    }
    cmd
}

fn report_files() -> Vec<String> {
    [
        ReportFormat::Json,
        ReportFormat::Sarif,
        ReportFormat::MarkdownSummary,
        ReportFormat::Html,
        ReportFormat::Junit,
    ]
    .iter()
    .filter_map(|f| f.file_name())
    .map(str::to_string)
    .collect()
}

#[derive(Serialize)]
struct GitHubWorkflow {
    name: String,
    on: Value,
    permissions: BTreeMap<&'static str, &'static str>,
    jobs: BTreeMap<&'static str, GitHubJob>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct GitHubJob {
    runs_on: String,
    steps: Vec<GitHubStep>,
}

#[derive(Serialize, Default)]
struct GitHubStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    with: BTreeMap<&'static str, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<&'static str, String>,
}

/// GitHub Actions workflow running the check on pull requests and pushes
/// to the default branch, uploading SARIF to code scanning.
pub fn github_actions(frameworks: &[String]) -> Result<String, serde_yaml::Error> {
    let mut on = Mapping::new();
    on.insert("pull_request".into(), Value::Mapping(Mapping::new()));
    let mut push = Mapping::new();
    push.insert("branches".into(), Value::Sequence(vec!["main".into()]));
    on.insert("push".into(), Value::Mapping(push));

    let mut env = BTreeMap::new();
    env.insert("CERBERUS_API_KEY", "${{ secrets.CERBERUS_API_KEY }}".to_string());
    env.insert("CERBERUS_FRAMEWORKS", frameworks.join(","));
    env.insert("GITHUB_TOKEN", "${{ secrets.GITHUB_TOKEN }}".to_string());

    let steps = vec![
        GitHubStep {
            uses: Some("actions/checkout@v4".to_string()),
            ..Default::default()
        },
        GitHubStep {
            name: Some("Install cerberus".to_string()),
            run: Some(INSTALL_COMMAND.to_string()),
            ..Default::default()
        },
        GitHubStep {
            name: Some("Compliance check".to_string()),
            id: Some("compliance".to_string()),
            run: Some(check_command(true)),
            env,
            ..Default::default()
        },
        GitHubStep {
            name: Some("Upload SARIF".to_string()),
            condition: Some("always()".to_string()),
            uses: Some("github/codeql-action/upload-sarif@v3".to_string()),
            with: BTreeMap::from([(
                "sarif_file",
                ReportFormat::Sarif.file_name().unwrap_or_default().to_string(),
            )]),
            ..Default::default()
        },
    ];

    let workflow = GitHubWorkflow {
        name: "Compliance".to_string(),
        on: Value::Mapping(on),
        permissions: BTreeMap::from([
            ("contents", "read"),
            ("pull-requests", "write"),
            ("security-events", "write"),
        ]),
        jobs: BTreeMap::from([(
            "compliance",
            GitHubJob {
                runs_on: "ubuntu-latest".to_string(),
                steps,
            },
        )]),
    };

    serde_yaml::to_string(&workflow)
}

#[derive(Serialize)]
struct GitLabJob {
    stage: String,
    image: String,
    variables: BTreeMap<&'static str, String>,
    script: Vec<String>,
    artifacts: GitLabArtifacts,
    rules: Vec<BTreeMap<&'static str, String>>,
}

#[derive(Serialize)]
struct GitLabArtifacts {
    when: String,
    paths: Vec<String>,
    reports: BTreeMap<&'static str, String>,
}

/// GitLab CI job for merge requests and the default branch. Step outputs
/// are exported through the dotenv report.
pub fn gitlab_ci(frameworks: &[String]) -> Result<String, serde_yaml::Error> {
    let job = GitLabJob {
        stage: "test".to_string(),
        image: "rust:latest".to_string(),
        variables: BTreeMap::from([("CERBERUS_FRAMEWORKS", frameworks.join(","))]),
        script: vec![INSTALL_COMMAND.to_string(), check_command(true)],
        artifacts: GitLabArtifacts {
            when: "always".to_string(),
            paths: report_files(),
            reports: BTreeMap::from([
                ("dotenv", GITLAB_DOTENV_FILE.to_string()),
                (
                    "junit",
                    ReportFormat::Junit.file_name().unwrap_or_default().to_string(),
                ),
            ]),
        },
        rules: vec![
            BTreeMap::from([("if", "$CI_PIPELINE_SOURCE == \"merge_request_event\"".to_string())]),
            BTreeMap::from([("if", "$CI_COMMIT_BRANCH == $CI_DEFAULT_BRANCH".to_string())]),
        ],
    };

    serde_yaml::to_string(&BTreeMap::from([("compliance", job)]))
}

/// Declarative Jenkinsfile stage. The API key is expected as a Jenkins
/// secret-text credential with id `cerberus-api-key`.
pub fn jenkinsfile(frameworks: &[String]) -> String {
    let mut out = String::new();
    out.push_str("pipeline {\n");
    out.push_str("    agent any\n");
    out.push_str("    environment {\n");
    out.push_str("        CERBERUS_API_KEY = credentials('cerberus-api-key')\n");
    out.push_str(&format!(
        "        CERBERUS_FRAMEWORKS = '{}'\n",
        frameworks.join(",")
    ));
    out.push_str("    }\n");
    out.push_str("    stages {\n");
    out.push_str("        stage('Compliance') {\n");
    out.push_str("            steps {\n");
    out.push_str(&format!("                sh '{}'\n", INSTALL_COMMAND));
    out.push_str(&format!("                sh '{}'\n", check_command(false)));
    out.push_str("            }\n");
    out.push_str("            post {\n");
    out.push_str("                always {\n");
    out.push_str(&format!(
        "                    junit allowEmptyResults: true, testResults: '{}'\n",
        ReportFormat::Junit.file_name().unwrap_or_default()
    ));
    out.push_str(&format!(
        "                    archiveArtifacts artifacts: '{}', allowEmptyArchive: true\n",
        report_files().join(",")
    ));
    out.push_str("                }\n");
    out.push_str("            }\n");
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frameworks() -> Vec<String> {
        vec!["essential8".to_string(), "soc2".to_string()]
    }

    #[test]
    fn test_github_template_is_valid_workflow() {
        let yaml = github_actions(&frameworks()).unwrap();
        let doc: Value = serde_yaml::from_str(&yaml).unwrap();

        let steps = doc["jobs"]["compliance"]["steps"].as_sequence().unwrap();
        assert_eq!(steps.len(), 4);
        assert_eq!(
            steps[2]["run"].as_str(),
            Some("cerberus check --output-format all --post-comment")
        );
        assert_eq!(
            steps[2]["env"]["CERBERUS_FRAMEWORKS"].as_str(),
            Some("essential8,soc2")
        );
        assert_eq!(
            steps[3]["with"]["sarif_file"].as_str(),
            Some("compliance-results.sarif")
        );
        assert_eq!(doc["jobs"]["compliance"]["runs-on"].as_str(), Some("ubuntu-latest"));
        assert!(yaml.contains("secrets.CERBERUS_API_KEY"));
    }

    #[test]
    fn test_gitlab_template_exports_dotenv() {
        let yaml = gitlab_ci(&frameworks()).unwrap();
        let doc: Value = serde_yaml::from_str(&yaml).unwrap();
        let job = &doc["compliance"];

        assert_eq!(job["artifacts"]["reports"]["dotenv"].as_str(), Some("compliance.env"));
        assert_eq!(
            job["artifacts"]["reports"]["junit"].as_str(),
            Some("compliance-junit.xml")
        );
        assert_eq!(job["artifacts"]["paths"].as_sequence().unwrap().len(), 5);
        assert_eq!(job["variables"]["CERBERUS_FRAMEWORKS"].as_str(), Some("essential8,soc2"));
        // The API key must come from masked project variables, not the file.
        assert!(!yaml.contains("CERBERUS_API_KEY"));
    }

    #[test]
    fn test_jenkinsfile_publishes_junit() {
        let jenkinsfile = jenkinsfile(&frameworks());
        assert!(jenkinsfile.contains("credentials('cerberus-api-key')"));
        assert!(jenkinsfile.contains("CERBERUS_FRAMEWORKS = 'essential8,soc2'"));
        assert!(jenkinsfile.contains("testResults: 'compliance-junit.xml'"));
        assert!(jenkinsfile.contains("sh 'cerberus check --output-format all'"));
    }
}
