use anyhow::Result;
use colored::*;
use scrub_rules::{RuleRegistry, standard_rules};

pub fn execute() -> Result<()> {
    println!("{}", "Built-in rules (run for every cleaner):".bold());
    for (spec, _) in standard_rules() {
        println!("  {} [{}]", spec.name, spec.severity);
    }

    println!("\n{}", "Rule types available in rule documents:".bold());
    for name in RuleRegistry::with_builtins().names() {
        println!("  {name}");
    }
    Ok(())
}
