use anyhow::{Result, anyhow};
use scrub_rules::RuleRegistry;
use scrub_runner::{ExecutionMode, Orchestrator, PluginLoader, RunOptions};
use std::time::Duration;
use tracing::info;

use crate::commands::cleaner_registry;
use crate::output;

pub struct Options {
    pub all: bool,
    pub test: bool,
    pub disk: bool,
    pub parallel: Option<usize>,
    pub timeout: Option<u64>,
    pub output_dir: String,
    pub format: String,
}

pub async fn execute(root: &str, names: Vec<String>, options: Options) -> Result<()> {
    let registry = cleaner_registry();
    let names = if options.all {
        registry.names().iter().map(|s| s.to_string()).collect()
    } else if names.is_empty() {
        return Err(anyhow!("no cleaners named; pass names or use --all"));
    } else {
        names
    };
    info!("Running {} cleaner(s)", names.len());

    let mut run_options = RunOptions::new(&options.output_dir);
    run_options.test_only = options.test;
    run_options.disk_mode = options.disk;
    run_options.timeout = options.timeout.map(Duration::from_secs);
    if let Some(limit) = options.parallel {
        run_options.mode = ExecutionMode::Concurrent { limit };
    }
    if options.test {
        output::print_info("Test-only mode: validating without persisting");
    }

    let orchestrator = Orchestrator::new(
        registry,
        RuleRegistry::with_builtins(),
        PluginLoader::new(root),
        run_options,
    );
    let summary = orchestrator.run(&names).await?;

    output::print_run_summary(&summary, &options.format);

    if !summary.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
