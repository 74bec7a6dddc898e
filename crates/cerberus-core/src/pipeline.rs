//! One compliance check run, end to end.

use crate::config::CheckConfig;
use crate::context::platform::{self, Platform};
use crate::context::{self, CiEnvironment};
use crate::error::{CollectionWarning, PipelineError, PublishWarning};
use crate::frameworks;
use crate::gate::{self, GateDecision};
use crate::model::ComplianceResult;
use crate::providers::compliance_api::ComplianceClient;
use crate::providers::PlatformApi;
use crate::publish::{self, RenderedReport, StepOutputs};
use crate::render::{self, ReportFormat};
use crate::request::ComplianceRequest;
use std::path::PathBuf;

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub platform: Platform,
    pub result: ComplianceResult,
    pub decision: GateDecision,
    /// Report files plus any step-output files, in write order.
    pub written: Vec<PathBuf>,
    pub outputs: StepOutputs,
    pub comment_posted: bool,
    pub collection_warnings: Vec<CollectionWarning>,
    pub publish_warnings: Vec<PublishWarning>,
}

/// Run a full check.
///
/// Nothing is written unless the API call and every render succeed. Failures
/// to look up changed files, write step outputs, or post the comment are
/// warnings in the returned outcome.
pub async fn run<P: PlatformApi>(
    config: &CheckConfig,
    env: &CiEnvironment,
    client: &ComplianceClient,
    platform_api: Option<&P>,
) -> Result<RunOutcome, PipelineError> {
    let platform = config.platform.unwrap_or_else(|| Platform::detect(env));
    tracing::info!(platform = %platform, "running compliance check");

    let mut collection_warnings = Vec::new();
    for unknown in frameworks::check_frameworks(&config.frameworks) {
        tracing::warn!("{}", unknown);
        collection_warnings.push(CollectionWarning::new("frameworks", unknown.to_string()));
    }

    let pull_request = platform::read_facts(platform, env).0.pull_request;

    let changed_files = match (platform_api, pull_request) {
        (Some(api), Some(number)) => match api.changed_files(number).await {
            Ok(files) => {
                tracing::debug!(pull_request = number, files = files.len(), "fetched changed files");
                Some(files)
            }
            Err(e) => {
                tracing::warn!(error = %e, "changed-file lookup failed, scanning source tree");
                collection_warnings.push(CollectionWarning::new("changes", format!("{:#}", e)));
                None
            }
        },
        _ => None,
    };

    let collected = context::collect(env, platform, changed_files);
    collection_warnings.extend(collected.warnings);

    let request = ComplianceRequest::new(
        collected.context,
        &config.frameworks,
        config.mode,
        config.request_options(),
    )?;

    let result = client.check(&request).await?;
    tracing::info!(
        score = result.compliance_score,
        violations = result.violations.len(),
        human_review = result.human_review_required,
        "compliance check completed"
    );

    let mut reports = Vec::new();
    for format in config.output_format.report_formats() {
        reports.push(RenderedReport {
            format,
            content: render::render(&result, format)?,
        });
    }
    let summary = render::render(&result, ReportFormat::MarkdownSummary)?;
    let comment = if config.post_comment {
        Some(render::render(&result, ReportFormat::PrComment)?)
    } else {
        None
    };

    let decision = gate::decide(&result, &config.gate_config());

    let mut written = publish::write_reports(&config.output_dir, &reports)?;

    let outputs = StepOutputs::from_result(&result);
    let step_report =
        publish::write_step_outputs(platform, env, &config.output_dir, &outputs, Some(&summary));
    written.extend(step_report.files);
    let mut publish_warnings = step_report.warnings;

    let mut comment_posted = false;
    if let Some(body) = comment {
        match (platform_api, pull_request) {
            (Some(api), Some(number)) => match api.post_comment(number, &body).await {
                Ok(()) => {
                    tracing::info!(pull_request = number, "compliance comment posted");
                    comment_posted = true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to post compliance comment");
                    publish_warnings.push(PublishWarning::new("comment", format!("{:#}", e)));
                }
            },
            (None, _) => publish_warnings.push(PublishWarning::new(
                "comment",
                format!("no API client available for platform '{}'", platform),
            )),
            (_, None) => publish_warnings.push(PublishWarning::new(
                "comment",
                "run is not associated with a pull/merge request",
            )),
        }
    }

    Ok(RunOutcome {
        platform,
        result,
        decision,
        written,
        outputs,
        comment_posted,
        collection_warnings,
        publish_warnings,
    })
}
