use colored::*;
use scrub_core::{Severity, ValidationReport};
use scrub_runner::{CleanerOutcome, DiscoveryReport, RunSummary};
use serde_json::json;

pub fn print_run_summary(summary: &RunSummary, format: &str) {
    match format {
        "json" => print_json_summary(summary),
        _ => print_text_summary(summary),
    }
}

fn print_text_summary(summary: &RunSummary) {
    println!("\n{}", "═".repeat(60));
    println!("{}", "  PIPELINE RUN".bold());
    println!("{}", "═".repeat(60));

    for (name, outcome) in &summary.outcomes {
        match outcome {
            CleanerOutcome::Completed { report, output } => {
                if report.passed() {
                    println!("\n{} {}", "✓".green().bold(), name.green().bold());
                } else {
                    println!("\n{} {}", "✗".red().bold(), name.red().bold());
                }
                print_report_body(report);
                match output {
                    Some(path) => println!("  output: {}", path.display()),
                    None => println!("  output: {}", "not persisted".yellow()),
                }
            }
            CleanerOutcome::Failed { error } => {
                println!("\n{} {}", "✗".red().bold(), name.red().bold());
                println!("  {}", error.to_string().red());
            }
            CleanerOutcome::TimedOut { seconds } => {
                println!("\n{} {}", "✗".red().bold(), name.red().bold());
                println!("  {}", format!("timed out after {seconds}s").red());
            }
            CleanerOutcome::Blocked { missing, install } => {
                println!("\n{} {}", "✗".red().bold(), name.red().bold());
                println!(
                    "  {}",
                    format!("blocked by missing dependencies: [{}]", missing.join(", ")).red()
                );
                println!("  install with: {}", install.yellow());
            }
        }
    }

    println!("\n{}", "Summary:".bold());
    println!("  Succeeded: {}", summary.succeeded());
    println!("  Failed:    {}", summary.failed());
    println!("{}", "═".repeat(60));
}

fn print_report_body(report: &ValidationReport) {
    for verdict in report.verdicts().iter().filter(|v| !v.passed) {
        let line = format!("{} [{}]: {}", verdict.rule, verdict.severity, verdict.message);
        match verdict.severity {
            Severity::Error => println!("  {}", line.red()),
            Severity::Warning => println!("  {}", line.yellow()),
        }
    }
    println!(
        "  rules: {} passed, {} errors, {} warnings",
        report.passed_count(),
        report.failed_errors(),
        report.failed_warnings()
    );
}

fn print_json_summary(summary: &RunSummary) {
    let outcomes: Vec<serde_json::Value> = summary
        .outcomes
        .iter()
        .map(|(name, outcome)| match outcome {
            CleanerOutcome::Completed { report, output } => json!({
                "cleaner": name,
                "status": if report.passed() { "passed" } else { "failed" },
                "output": output.as_ref().map(|p| p.display().to_string()),
                "rules": {
                    "total": report.total(),
                    "passed": report.passed_count(),
                    "errors": report.failed_errors(),
                    "warnings": report.failed_warnings(),
                },
                "verdicts": report.verdicts(),
            }),
            CleanerOutcome::Failed { error } => json!({
                "cleaner": name,
                "status": "error",
                "message": error.to_string(),
            }),
            CleanerOutcome::TimedOut { seconds } => json!({
                "cleaner": name,
                "status": "timeout",
                "seconds": seconds,
            }),
            CleanerOutcome::Blocked { missing, install } => json!({
                "cleaner": name,
                "status": "blocked",
                "missing": missing,
                "install": install,
            }),
        })
        .collect();

    let output = json!({
        "succeeded": summary.succeeded(),
        "failed": summary.failed(),
        "cleaners": outcomes,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_default()
    );
}

pub fn print_discovery(report: &DiscoveryReport, format: &str) {
    if format == "json" {
        let output = json!({
            "cleaners": &report.descriptors,
            "non_conformant": report
                .non_conformant
                .iter()
                .map(|(name, reason)| json!({ "name": name, "reason": reason }))
                .collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return;
    }

    println!("{}", "Registered cleaners:".bold());
    for descriptor in &report.descriptors {
        if descriptor.is_runnable() {
            println!("  {} {}", "✓".green().bold(), descriptor.name);
        } else {
            println!(
                "  {} {} {}",
                "✗".red().bold(),
                descriptor.name,
                "(blocked)".yellow()
            );
        }
    }
    if !report.non_conformant.is_empty() {
        println!("\n{}", "Excluded:".yellow().bold());
        for (name, reason) in &report.non_conformant {
            println!("  {} {name}: {reason}", "−".yellow());
        }
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
