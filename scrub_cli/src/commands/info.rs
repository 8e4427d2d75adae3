use anyhow::{Context, Result};
use colored::*;
use scrub_runner::PluginLoader;

use crate::commands::cleaner_registry;
use crate::output;

pub fn execute(root: &str, name: &str) -> Result<()> {
    let registry = cleaner_registry();
    let cleaner = registry
        .instantiate(name)
        .with_context(|| format!("unknown cleaner '{name}'"))?;

    let metadata = cleaner.describe();
    println!("{}", name.bold());
    println!("  source:      {}", metadata.source);
    println!("  description: {}", metadata.description);
    if let Some(freq) = &metadata.update_frequency {
        println!("  updates:     {freq}");
    }
    if let Some(url) = &metadata.url {
        println!("  url:         {url}");
    }

    let capabilities = cleaner.capabilities();
    let mut modes = Vec::new();
    if capabilities.in_memory {
        modes.push("in-memory");
    }
    if capabilities.path_based {
        modes.push("path-based");
    }
    println!("  modes:       {}", modes.join(", "));

    let dependencies = cleaner.dependencies();
    if !dependencies.is_empty() {
        println!("\n{}", "Dependencies:".bold());
        for dep in &dependencies {
            println!("  {} (install: {})", dep.name, dep.install_hint);
        }
    }

    let extra = cleaner.extra_rules();
    if !extra.is_empty() {
        println!("\n{}", "Cleaner-declared rules:".bold());
        for spec in &extra {
            println!("  {} [{}] ({})", spec.name, spec.severity, spec.rule_type);
        }
    }

    let report = PluginLoader::new(root).discover(&registry);
    match report.descriptor(name) {
        Some(descriptor) if descriptor.is_runnable() => {
            output::print_success("runnable");
        }
        Some(descriptor) => {
            output::print_error(&format!(
                "blocked; install with: {}",
                descriptor.install_hints().join(" && ")
            ));
        }
        None => {
            let reason = report
                .non_conformant
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, reason)| reason.as_str())
                .unwrap_or("not discovered");
            output::print_error(reason);
        }
    }
    Ok(())
}
