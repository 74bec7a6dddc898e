mod display;
mod telemetry;

use anyhow::{Context, Result};
use cerberus_core::config::{self, ConfigLayer};
use cerberus_core::providers::compliance_api::{ComplianceClient, DEFAULT_TIMEOUT};
use cerberus_core::{
    gate, pipeline, render, template, CheckConfig, CiEnvironment, ComplianceResult, GateConfig,
    PlatformClient, Platform, ReportFormat,
};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;

const EXIT_GATE_FAILED: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(
    name = "cerberus",
    version,
    about = "Cerberus AI: CI compliance client",
    long_about = "Collect CI context, send it to the Cerberus AI compliance API, publish SARIF/Markdown/JUnit reports, and gate the build on the violations found."
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a compliance check against the current CI job
    Check(CheckArgs),

    /// Render a saved compliance result in another format
    Render {
        /// Path to a compliance result JSON file
        result: PathBuf,

        /// Report format (json, sarif, markdown-summary, pr-comment, html, junit)
        #[arg(short, long, default_value = "markdown-summary")]
        format: String,

        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate the pass/fail gate for a saved compliance result
    Gate {
        /// Path to a compliance result JSON file
        result: PathBuf,

        /// Minimum severity that fails the gate (low, medium, high, critical)
        #[arg(long, default_value = "medium")]
        severity_threshold: String,

        /// Fail when violations at or above the threshold are found
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        fail_on_violations: bool,
    },

    /// List the built-in compliance framework catalog
    Frameworks,

    /// Print a CI configuration snippet that runs `cerberus check`
    Template {
        /// Target CI system
        target: TemplateTarget,

        /// Comma-separated frameworks to check
        #[arg(long, default_value = config::DEFAULT_FRAMEWORKS)]
        frameworks: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TemplateTarget {
    Github,
    Gitlab,
    Jenkins,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Compliance API base URL
    #[arg(long, env = "CERBERUS_SERVER_URL")]
    server_url: Option<String>,

    /// API key for the compliance server (required)
    #[arg(long, env = "CERBERUS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Comma-separated framework identifiers
    #[arg(long, env = "CERBERUS_FRAMEWORKS")]
    frameworks: Option<String>,

    /// Minimum severity that fails the gate (low, medium, high, critical)
    #[arg(long)]
    severity_threshold: Option<String>,

    /// Check mode (validate, audit, monitor)
    #[arg(long)]
    mode: Option<String>,

    /// Report files to write (json, sarif, summary, html, junit, all)
    #[arg(long)]
    output_format: Option<String>,

    /// Fail the job when violations at or above the threshold are found
    #[arg(long, value_name = "BOOL")]
    fail_on_violations: Option<bool>,

    /// Severity at which the server flags results for human review (low, medium, high)
    #[arg(long)]
    human_review_threshold: Option<String>,

    /// Ask the server for remediation suggestions
    #[arg(long, value_name = "BOOL")]
    include_suggestions: Option<bool>,

    /// Ask the server for supporting evidence
    #[arg(long, value_name = "BOOL")]
    include_evidence: Option<bool>,

    /// Directory for report files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Post the results as a pull/merge request comment
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    post_comment: Option<bool>,

    /// CI platform (auto, github, gitlab, jenkins, local)
    #[arg(long)]
    platform: Option<String>,

    /// Config file (defaults to .cerberus/config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,
}

impl CheckArgs {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            server_url: self.server_url.clone(),
            frameworks: self.frameworks.clone(),
            severity_threshold: self.severity_threshold.clone(),
            mode: self.mode.clone(),
            output_format: self.output_format.clone(),
            fail_on_violations: self.fail_on_violations,
            human_review_threshold: self.human_review_threshold.clone(),
            include_suggestions: self.include_suggestions,
            include_evidence: self.include_evidence,
            output_dir: self.output_dir.clone(),
            post_comment: self.post_comment,
            platform: self.platform.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    telemetry::init_tracing(
        cli.log_json,
        if cli.verbose { Level::DEBUG } else { Level::INFO },
    );

    let outcome = match cli.command {
        Commands::Check(args) => cmd_check(args).await,
        Commands::Render { result, format, output } => {
            cmd_render(&result, &format, output.as_deref())
        }
        Commands::Gate {
            result,
            severity_threshold,
            fail_on_violations,
        } => cmd_gate(&result, &severity_threshold, fail_on_violations),
        Commands::Frameworks => {
            display::print_frameworks();
            Ok(true)
        }
        Commands::Template { target, frameworks } => cmd_template(target, &frameworks),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "cerberus", &mut std::io::stdout());
            Ok(true)
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_GATE_FAILED),
        Err(e) => {
            tracing::error!("{:#}", e);
            display::print_fatal(&e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Returns `Ok(false)` when the gate fails the job.
async fn cmd_check(args: CheckArgs) -> Result<bool> {
    let env = CiEnvironment::from_process();

    let file_layer = config::discover_config_file(args.config.as_deref(), env.working_dir())?
        .unwrap_or_default();
    let config = CheckConfig::resolve(file_layer.merge(args.layer()), args.api_key.clone())?;

    let client = ComplianceClient::with_timeout(
        &config.server_url,
        &config.api_key,
        Duration::from_secs(args.timeout),
    )?;

    let platform = config.platform.unwrap_or_else(|| Platform::detect(&env));
    let platform_api = PlatformClient::from_env(platform, &env);

    let outcome = pipeline::run(&config, &env, &client, platform_api.as_ref()).await?;

    display::print_run_outcome(&outcome, &config);
    Ok(!outcome.decision.should_fail)
}

fn load_result(path: &Path) -> Result<ComplianceResult> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse compliance result {}", path.display()))
}

fn cmd_render(path: &Path, format: &str, output: Option<&Path>) -> Result<bool> {
    let result = load_result(path)?;
    let format: ReportFormat = format.parse()?;
    let rendered = render::render(&result, format)?;

    match output {
        Some(out_path) => {
            std::fs::write(out_path, &rendered)
                .with_context(|| format!("Failed to write {}", out_path.display()))?;
            println!("{} report written to {}", format, out_path.display());
        }
        None => {
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(true)
}

fn cmd_gate(path: &Path, severity_threshold: &str, fail_on_violations: bool) -> Result<bool> {
    let result = load_result(path)?;
    let gate_config = GateConfig {
        fail_on_violations,
        severity_threshold: config::parse_severity_threshold(severity_threshold)?,
    };

    let decision = gate::decide(&result, &gate_config);
    display::print_gate_decision(&result, &decision, &gate_config);
    Ok(!decision.should_fail)
}

fn cmd_template(target: TemplateTarget, frameworks: &str) -> Result<bool> {
    let frameworks = cerberus_core::request::parse_framework_list(frameworks);
    if frameworks.is_empty() {
        anyhow::bail!("At least one framework is required");
    }

    let snippet = match target {
        TemplateTarget::Github => template::github_actions(&frameworks)?,
        TemplateTarget::Gitlab => template::gitlab_ci(&frameworks)?,
        TemplateTarget::Jenkins => template::jenkinsfile(&frameworks),
    };
    print!("{}", snippet);
    Ok(true)
}
