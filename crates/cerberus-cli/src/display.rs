use cerberus_core::frameworks::FRAMEWORKS;
use cerberus_core::pipeline::RunOutcome;
use cerberus_core::{CheckConfig, ComplianceResult, GateConfig, GateDecision, Platform, Severity};
use colored::*;

fn severity_tag(severity: &Severity) -> String {
    let label = format!(" {} ", severity.label());
    match severity {
        Severity::Critical => label.on_red().white().bold().to_string(),
        Severity::High => label.on_yellow().black().bold().to_string(),
        Severity::Medium => label.yellow().bold().to_string(),
        Severity::Low => label.blue().to_string(),
        Severity::Unknown(_) => label.dimmed().to_string(),
    }
}

fn colored_score(result: &ComplianceResult) -> ColoredString {
    let score = format!("{}/100", result.score_percent());
    match result.score_percent() {
        90..=100 => score.green().bold(),
        70..=89 => score.yellow().bold(),
        _ => score.red().bold(),
    }
}

/// Print the result of a full check run, ending with the status line.
pub fn print_run_outcome(outcome: &RunOutcome, config: &CheckConfig) {
    let result = &outcome.result;

    println!();
    println!(
        "{}",
        format!(
            " Cerberus AI v{}: Compliance Check ({})",
            env!("CARGO_PKG_VERSION"),
            outcome.platform
        )
        .bold()
    );
    println!();

    print_result_summary(result);

    if !outcome.written.is_empty() {
        println!(" {}", "Outputs".bold().underline());
        for path in &outcome.written {
            println!(" {} {}", "|-".dimmed(), path.display());
        }
        if outcome.comment_posted {
            println!(" {} pull request comment posted", "|-".dimmed());
        }
        println!();
    }

    // Step outputs have nowhere else to go when running locally.
    if outcome.platform == Platform::Local {
        println!(" {}", "Step Outputs".bold().underline());
        for (key, value) in outcome.outputs.pairs() {
            println!(" {} {}={}", "|-".dimmed(), key, value);
        }
        println!();
    }

    let warnings = outcome.collection_warnings.len() + outcome.publish_warnings.len();
    if warnings > 0 {
        println!(
            " {} {} warning(s) during the run, see log for details",
            " WARN ".on_yellow().black().bold(),
            warnings
        );
        println!();
    }

    print_status_line(&outcome.decision, &config.gate_config(), result);
}

/// Print an offline gate evaluation.
pub fn print_gate_decision(result: &ComplianceResult, decision: &GateDecision, config: &GateConfig) {
    println!();
    print_result_summary(result);
    print_status_line(decision, config, result);
}

fn print_result_summary(result: &ComplianceResult) {
    println!(" {}", "Summary".bold().underline());
    println!(" {} Compliance score: {}", "|-".dimmed(), colored_score(result));
    println!(
        " {} Frameworks:       {}",
        "|-".dimmed(),
        result.frameworks_display().cyan()
    );

    let counts = result.severity_counts();
    println!(
        " {} Violations:       {} ({} critical, {} high, {} medium, {} low)",
        "|-".dimmed(),
        result.violations.len(),
        if counts.critical > 0 {
            counts.critical.to_string().red().bold().to_string()
        } else {
            "0".to_string()
        },
        if counts.high > 0 {
            counts.high.to_string().yellow().bold().to_string()
        } else {
            "0".to_string()
        },
        counts.medium,
        counts.low,
    );
    if result.human_review_required {
        println!(
            " {} {}",
            "|-".dimmed(),
            "Human review required".magenta().bold()
        );
    }
    if let Some(url) = &result.report_url {
        println!(" {} Report: {}", "|-".dimmed(), url.underline());
    }
    println!();

    if result.violations.is_empty() {
        println!(" {} No compliance violations found.", "OK".green().bold());
        println!();
        return;
    }

    for violation in &result.violations {
        print!(
            " {} [{}] {}",
            severity_tag(&violation.severity),
            violation.rule_id.dimmed(),
            violation.title
        );
        if let Some(loc) = violation.location() {
            print!(" ({})", loc.dimmed());
        }
        println!();
        if let Some(fix) = &violation.remediation {
            println!("   {} {}", "Fix:".dimmed(), fix.cyan());
        }
    }
    println!();
}

fn print_status_line(decision: &GateDecision, config: &GateConfig, result: &ComplianceResult) {
    if decision.should_fail {
        println!(
            " {} {}",
            " FAIL ".on_red().white().bold(),
            decision.reason.as_deref().unwrap_or("compliance gate failed")
        );
    } else if result.violations.is_empty() {
        println!(
            " {} Compliance check passed (score {}/100)",
            " PASS ".on_green().black().bold(),
            result.score_percent()
        );
    } else {
        println!(
            " {} {} violation(s) below the '{}' gate threshold (score {}/100)",
            " PASS ".on_green().black().bold(),
            result.violations.len(),
            config.severity_threshold,
            result.score_percent()
        );
    }
}

/// Single status line for a run that could not complete.
pub fn print_fatal(error: &anyhow::Error) {
    eprintln!(" {} {}", " ERROR ".on_red().white().bold(), error);
}

pub fn print_frameworks() {
    println!();
    println!(" {}", "Built-in Frameworks".bold().underline());
    for framework in FRAMEWORKS {
        println!(
            " {} {:<14} {}",
            "|-".dimmed(),
            framework.id.cyan(),
            framework.name
        );
    }
    println!();
    println!(
        " {}",
        "Other identifiers are passed through to the server unchanged.".dimmed()
    );
}
