//! # Scrub Runner
//!
//! Plugin discovery and execution orchestration for the Scrub pipeline.
//!
//! - [`loader`]: cleaner registration, side-effect-free discovery passes,
//!   dependency probing and remediation
//! - [`orchestrator`]: serial or bounded-concurrent batch execution with
//!   per-cleaner timeouts and failure containment
//! - [`persist`]: atomic CSV persistence of validated outputs
//! - [`demo`]: a seeded synthetic cleaner exercising every hook

pub mod demo;
pub mod loader;
pub mod orchestrator;
pub mod persist;

pub use loader::{CleanerRegistry, DiscoveryReport, PluginLoader, install_dependencies};
pub use orchestrator::{CleanerOutcome, ExecutionMode, Orchestrator, RunOptions, RunSummary};
