use anyhow::Result;
use scrub_runner::PluginLoader;

use crate::commands::cleaner_registry;
use crate::output;

pub fn execute(root: &str, format: &str) -> Result<()> {
    let registry = cleaner_registry();
    let report = PluginLoader::new(root).discover(&registry);
    output::print_discovery(&report, format);
    Ok(())
}
