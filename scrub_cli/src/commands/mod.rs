pub mod info;
pub mod install;
pub mod list;
pub mod rules;
pub mod run;

use scrub_runner::CleanerRegistry;
use scrub_runner::demo::SyntheticCleaner;

/// The cleaners this binary ships with. New cleaners register here.
pub fn cleaner_registry() -> CleanerRegistry {
    let mut registry = CleanerRegistry::new();
    registry.register("synthetic", SyntheticCleaner::new);
    registry
}
