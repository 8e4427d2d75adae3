use anyhow::{Context, Result, anyhow};
use scrub_runner::{PluginLoader, install_dependencies};

use crate::commands::cleaner_registry;
use crate::output;

pub fn execute(root: &str, name: &str) -> Result<()> {
    let registry = cleaner_registry();
    let report = PluginLoader::new(root).discover(&registry);
    let descriptor = report
        .descriptor(name)
        .ok_or_else(|| anyhow!("no discoverable cleaner named '{name}'"))?;

    if descriptor.is_runnable() {
        output::print_info("all dependencies already present");
        return Ok(());
    }

    install_dependencies(descriptor)
        .with_context(|| format!("installing dependencies for '{name}'"))?;

    // re-probe: the cleaner is only eligible once the tools actually resolve
    let report = PluginLoader::new(root).discover(&registry);
    match report.descriptor(name) {
        Some(d) if d.is_runnable() => output::print_success("dependencies installed"),
        _ => output::print_error("install commands ran but dependencies still unresolved"),
    }
    Ok(())
}
