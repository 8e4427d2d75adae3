//! The cleaner capability contract.
//!
//! A cleaner is a plugin unit implementing acquire/transform/describe for one
//! dataset. The trait has a small required surface (metadata, capabilities)
//! and per-mode acquisition/transform operations that default to
//! [`StageError::Unsupported`]; a plugin conforms by overriding at least one
//! complete mode, which the loader checks structurally at discovery time.

use crate::{DataSet, RuleFn, RuleSpec, StageError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Metadata describing a cleaner's data source.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    /// Where the data comes from
    pub source: String,

    /// What the data contains
    pub description: String,

    /// How often the source updates (e.g. "daily", "annual")
    pub update_frequency: Option<String>,

    /// Source URL
    pub url: Option<String>,
}

impl Metadata {
    pub fn new(source: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            description: description.into(),
            update_frequency: None,
            url: None,
        }
    }

    pub fn with_update_frequency(mut self, freq: impl Into<String>) -> Self {
        self.update_frequency = Some(freq.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Which acquisition/transform modes a cleaner implements.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Capabilities {
    /// `acquire` + `transform` (whole dataset in memory)
    pub in_memory: bool,

    /// `acquire_to_path` + `transform_from_path` (plugin-managed chunking)
    pub path_based: bool,
}

impl Capabilities {
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            path_based: false,
        }
    }

    pub fn path_based() -> Self {
        Self {
            in_memory: false,
            path_based: true,
        }
    }

    pub fn both() -> Self {
        Self {
            in_memory: true,
            path_based: true,
        }
    }

    /// True if at least one complete acquire/transform mode is declared.
    pub fn has_complete_mode(&self) -> bool {
        self.in_memory || self.path_based
    }
}

/// An external tool a cleaner needs, with its remediation command.
#[derive(Debug, Clone, Serialize)]
pub struct Dependency {
    /// Executable name probed on PATH
    pub name: String,

    /// Command that installs the dependency
    pub install_hint: String,
}

impl Dependency {
    pub fn new(name: impl Into<String>, install_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            install_hint: install_hint.into(),
        }
    }
}

/// Explicit per-run context passed into every stage call.
///
/// Carries the cleaner identity and its private scratch/output directories;
/// there is no instance-bound "current cleaner" state anywhere in the core.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Name of the cleaner being run
    pub cleaner: String,

    /// Scratch directory private to this cleaner run
    pub scratch_dir: PathBuf,

    /// Output directory private to this cleaner
    pub output_dir: PathBuf,
}

impl ExecutionContext {
    pub fn new(
        cleaner: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cleaner: cleaner.into(),
            scratch_dir: scratch_dir.into(),
            output_dir: output_dir.into(),
        }
    }
}

/// The plugin contract consumed by the loader and orchestrator.
///
/// Required operations: [`describe`](Cleaner::describe) and
/// [`capabilities`](Cleaner::capabilities). Acquisition and transform come in
/// two overridable variants matching the declared capabilities; calling an
/// unimplemented variant yields [`StageError::Unsupported`] rather than a
/// panic. All remaining operations are optional.
pub trait Cleaner: Send + Sync {
    /// Metadata about this cleaner's data source.
    fn describe(&self) -> Metadata;

    /// Which acquire/transform modes this cleaner implements.
    fn capabilities(&self) -> Capabilities;

    /// External tools this cleaner needs at run time.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// Acquires the raw dataset into memory.
    fn acquire(&self, _ctx: &ExecutionContext) -> Result<DataSet, StageError> {
        Err(StageError::Unsupported("acquire"))
    }

    /// Acquires raw data onto disk under `scratch`, returning the written path.
    /// File layout and chunk size are entirely the plugin's business.
    fn acquire_to_path(
        &self,
        _ctx: &ExecutionContext,
        _scratch: &Path,
    ) -> Result<PathBuf, StageError> {
        Err(StageError::Unsupported("acquire_to_path"))
    }

    /// Transforms an in-memory raw dataset into the cleaned dataset.
    fn transform(&self, _ctx: &ExecutionContext, _raw: DataSet) -> Result<DataSet, StageError> {
        Err(StageError::Unsupported("transform"))
    }

    /// Transforms raw data from a path, consuming it in plugin-chosen chunks,
    /// and materializes the cleaned dataset.
    fn transform_from_path(
        &self,
        _ctx: &ExecutionContext,
        _path: &Path,
    ) -> Result<DataSet, StageError> {
        Err(StageError::Unsupported("transform_from_path"))
    }

    /// Extra rule specifications to validate this cleaner's output with,
    /// appended after the declared document rules.
    fn extra_rules(&self) -> Vec<RuleSpec> {
        Vec::new()
    }

    /// Custom rule functions registered for this cleaner's run only.
    /// A name colliding with a built-in replaces it for that run.
    fn custom_rule_fns(&self) -> Vec<(String, RuleFn)> {
        Vec::new()
    }
}

/// Whether a discovered cleaner can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CleanerStatus {
    Runnable,
    /// Declared dependencies are not installed; lists the missing names.
    Blocked { missing: Vec<String> },
}

/// Descriptor built for each qualifying cleaner during a discovery pass.
///
/// Re-created on every pass; there is no persistent registry state.
#[derive(Debug, Clone, Serialize)]
pub struct CleanerDescriptor {
    pub name: String,

    /// Per-cleaner directory under the discovery root (rule documents live here)
    pub dir: PathBuf,

    pub dependencies: Vec<Dependency>,
    pub capabilities: Capabilities,
    pub status: CleanerStatus,
}

impl CleanerDescriptor {
    pub fn is_runnable(&self) -> bool {
        self.status == CleanerStatus::Runnable
    }

    /// Install commands for the missing dependencies, in declaration order.
    pub fn install_hints(&self) -> Vec<&str> {
        match &self.status {
            CleanerStatus::Runnable => Vec::new(),
            CleanerStatus::Blocked { missing } => self
                .dependencies
                .iter()
                .filter(|d| missing.contains(&d.name))
                .map(|d| d.install_hint.as_str())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalCleaner;

    impl Cleaner for MinimalCleaner {
        fn describe(&self) -> Metadata {
            Metadata::new("nowhere", "nothing")
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::default()
        }
    }

    #[test]
    fn test_default_operations_are_unsupported() {
        let cleaner = MinimalCleaner;
        let ctx = ExecutionContext::new("min", "/tmp/scratch", "/tmp/out");

        assert!(matches!(
            cleaner.acquire(&ctx),
            Err(StageError::Unsupported("acquire"))
        ));
        assert!(matches!(
            cleaner.transform(&ctx, DataSet::empty()),
            Err(StageError::Unsupported("transform"))
        ));
        assert!(cleaner.extra_rules().is_empty());
        assert!(cleaner.custom_rule_fns().is_empty());
    }

    #[test]
    fn test_capabilities_complete_mode() {
        assert!(!Capabilities::default().has_complete_mode());
        assert!(Capabilities::in_memory().has_complete_mode());
        assert!(Capabilities::path_based().has_complete_mode());
        assert!(Capabilities::both().has_complete_mode());
    }

    #[test]
    fn test_install_hints_follow_missing_set() {
        let descriptor = CleanerDescriptor {
            name: "d".into(),
            dir: "cleaners/d".into(),
            dependencies: vec![
                Dependency::new("curl", "apt-get install curl"),
                Dependency::new("jq", "apt-get install jq"),
            ],
            capabilities: Capabilities::in_memory(),
            status: CleanerStatus::Blocked {
                missing: vec!["jq".into()],
            },
        };

        assert!(!descriptor.is_runnable());
        assert_eq!(descriptor.install_hints(), vec!["apt-get install jq"]);
    }
}
