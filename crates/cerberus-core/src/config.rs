use crate::context::platform::Platform;
use crate::error::ConfigError;
use crate::gate::GateConfig;
use crate::model::Severity;
use crate::render::ReportFormat;
use crate::request::{parse_framework_list, HumanReviewThreshold, Mode, RequestOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_SERVER_URL: &str = "https://api.cerberus-ai.com";
pub const DEFAULT_FRAMEWORKS: &str = "essential8";
pub const DEFAULT_CONFIG_PATH: &str = ".cerberus/config.toml";

/// Which report files a run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Sarif,
    Summary,
    Html,
    Junit,
    All,
}

impl OutputFormat {
    pub fn report_formats(&self) -> Vec<ReportFormat> {
        match self {
            OutputFormat::Json => vec![ReportFormat::Json],
            OutputFormat::Sarif => vec![ReportFormat::Sarif],
            OutputFormat::Summary => vec![ReportFormat::MarkdownSummary],
            OutputFormat::Html => vec![ReportFormat::Html],
            OutputFormat::Junit => vec![ReportFormat::Junit],
            OutputFormat::All => vec![
                ReportFormat::Json,
                ReportFormat::Sarif,
                ReportFormat::MarkdownSummary,
                ReportFormat::Html,
                ReportFormat::Junit,
            ],
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            "summary" => Ok(OutputFormat::Summary),
            "html" => Ok(OutputFormat::Html),
            "junit" => Ok(OutputFormat::Junit),
            "all" => Ok(OutputFormat::All),
            _ => Err(ConfigError::InvalidValue {
                option: "output-format",
                value: s.to_string(),
                expected: "json, sarif, summary, html, junit, all",
            }),
        }
    }
}

/// One layer of optional settings. Used both for the TOML config file and
/// for command-line overrides; later layers win.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLayer {
    pub server_url: Option<String>,
    pub frameworks: Option<String>,
    pub severity_threshold: Option<String>,
    pub mode: Option<String>,
    pub output_format: Option<String>,
    pub fail_on_violations: Option<bool>,
    pub human_review_threshold: Option<String>,
    pub include_suggestions: Option<bool>,
    pub include_evidence: Option<bool>,
    pub output_dir: Option<PathBuf>,
    pub post_comment: Option<bool>,
    pub platform: Option<String>,
}

impl ConfigLayer {
    /// Overlay `other` on top of `self`.
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            server_url: other.server_url.or(self.server_url),
            frameworks: other.frameworks.or(self.frameworks),
            severity_threshold: other.severity_threshold.or(self.severity_threshold),
            mode: other.mode.or(self.mode),
            output_format: other.output_format.or(self.output_format),
            fail_on_violations: other.fail_on_violations.or(self.fail_on_violations),
            human_review_threshold: other.human_review_threshold.or(self.human_review_threshold),
            include_suggestions: other.include_suggestions.or(self.include_suggestions),
            include_evidence: other.include_evidence.or(self.include_evidence),
            output_dir: other.output_dir.or(self.output_dir),
            post_comment: other.post_comment.or(self.post_comment),
            platform: other.platform.or(self.platform),
        }
    }
}

/// Load a config layer from a TOML file.
pub fn load_config_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::File {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load `explicit` if given, otherwise `.cerberus/config.toml` under `root` when it exists.
pub fn discover_config_file(
    explicit: Option<&Path>,
    root: &Path,
) -> Result<Option<ConfigLayer>, ConfigError> {
    if let Some(path) = explicit {
        return load_config_file(path).map(Some);
    }
    let default_path = root.join(DEFAULT_CONFIG_PATH);
    if default_path.is_file() {
        return load_config_file(&default_path).map(Some);
    }
    Ok(None)
}

/// Fully resolved, immutable settings for one check run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub server_url: String,
    pub api_key: String,
    pub frameworks: Vec<String>,
    pub severity_threshold: Severity,
    pub mode: Mode,
    pub output_format: OutputFormat,
    pub fail_on_violations: bool,
    pub human_review_threshold: HumanReviewThreshold,
    pub include_suggestions: bool,
    pub include_evidence: bool,
    pub output_dir: PathBuf,
    pub post_comment: bool,
    pub platform: Option<Platform>,
}

impl CheckConfig {
    /// Resolve defaults, then the merged layer, into a validated config.
    /// The API key is taken only from `api_key`, never from a file.
    pub fn resolve(layer: ConfigLayer, api_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing("api-key"))?;

        let frameworks = parse_framework_list(
            layer.frameworks.as_deref().unwrap_or(DEFAULT_FRAMEWORKS),
        );
        if frameworks.is_empty() {
            return Err(crate::error::RequestError::EmptyFrameworks.into());
        }

        let severity_threshold =
            parse_severity_threshold(layer.severity_threshold.as_deref().unwrap_or("medium"))?;

        let mode: Mode = layer.mode.as_deref().unwrap_or("validate").parse()?;

        let output_format: OutputFormat =
            layer.output_format.as_deref().unwrap_or("summary").parse()?;

        let review_raw = layer.human_review_threshold.as_deref().unwrap_or("high");
        let human_review_threshold =
            HumanReviewThreshold::parse(review_raw).ok_or_else(|| ConfigError::InvalidValue {
                option: "human-review-threshold",
                value: review_raw.to_string(),
                expected: "low, medium, high",
            })?;

        let platform = match layer.platform.as_deref() {
            None | Some("auto") => None,
            Some(raw) => Some(Platform::from_str(raw)?),
        };

        let server_url = layer
            .server_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        Ok(Self {
            server_url,
            api_key,
            frameworks,
            severity_threshold,
            mode,
            output_format,
            fail_on_violations: layer.fail_on_violations.unwrap_or(true),
            human_review_threshold,
            include_suggestions: layer.include_suggestions.unwrap_or(true),
            include_evidence: layer.include_evidence.unwrap_or(true),
            output_dir: layer.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            post_comment: layer.post_comment.unwrap_or(false),
            platform,
        })
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            fail_on_violations: self.fail_on_violations,
            severity_threshold: self.severity_threshold.clone(),
        }
    }

    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            severity_threshold: self.severity_threshold.clone(),
            human_review_threshold: self.human_review_threshold,
            include_suggestions: self.include_suggestions,
            include_evidence: self.include_evidence,
        }
    }
}

/// Parse a gate threshold; only the four known severities are accepted.
pub fn parse_severity_threshold(raw: &str) -> Result<Severity, ConfigError> {
    let severity = Severity::parse(raw);
    if severity.is_known() {
        Ok(severity)
    } else {
        Err(ConfigError::InvalidValue {
            option: "severity-threshold",
            value: raw.to_string(),
            expected: "low, medium, high, critical",
        })
    }
}
