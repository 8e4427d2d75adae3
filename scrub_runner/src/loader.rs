//! Cleaner registration and discovery.
//!
//! Cleaners are registered explicitly in a [`CleanerRegistry`]; a discovery
//! pass builds fresh [`CleanerDescriptor`]s by interrogating each registered
//! cleaner and its directory under the discovery root. Discovery is
//! side-effect-free: it probes dependencies and parses rule documents but
//! never runs a stage or touches the network.

use scrub_core::{Cleaner, CleanerDescriptor, CleanerStatus, PipelineError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info, warn};

type CleanerFactory = Arc<dyn Fn() -> Box<dyn Cleaner> + Send + Sync>;

/// Maps cleaner names to factories producing fresh plugin instances.
///
/// Registration is last-write-wins: a duplicate name replaces the previous
/// factory and logs a warning.
#[derive(Clone, Default)]
pub struct CleanerRegistry {
    factories: HashMap<String, CleanerFactory>,
}

impl CleanerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`. Returns `true` if a previous
    /// registration was replaced.
    pub fn register<F, C>(&mut self, name: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Cleaner + 'static,
    {
        let name = name.into();
        let boxed: CleanerFactory = Arc::new(move || Box::new(factory()));
        let replaced = self.factories.insert(name.clone(), boxed).is_some();
        if replaced {
            warn!(cleaner = %name, "cleaner re-registered, replacing previous factory");
        }
        replaced
    }

    /// Instantiates a fresh plugin for `name`.
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn Cleaner>> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| PipelineError::UnknownCleaner(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered cleaner names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Outcome of one discovery pass. Descriptors are rebuilt every pass; nothing
/// is cached between passes.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Qualifying cleaners, sorted by name
    pub descriptors: Vec<CleanerDescriptor>,

    /// Excluded candidates with the reason each was excluded
    pub non_conformant: Vec<(String, String)>,
}

impl DiscoveryReport {
    pub fn descriptor(&self, name: &str) -> Option<&CleanerDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn runnable(&self) -> impl Iterator<Item = &CleanerDescriptor> {
        self.descriptors.iter().filter(|d| d.is_runnable())
    }
}

/// Builds descriptors for every registered cleaner.
pub struct PluginLoader {
    root: PathBuf,
}

impl PluginLoader {
    /// `root` is the directory holding one subdirectory per cleaner (rule
    /// documents live there).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs a discovery pass over `registry`.
    ///
    /// A cleaner that declares no complete acquire/transform mode, or whose
    /// rule document is present but malformed, is excluded and listed as
    /// non-conformant; the pass continues with the rest.
    pub fn discover(&self, registry: &CleanerRegistry) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for name in registry.names() {
            let cleaner = match registry.instantiate(name) {
                Ok(c) => c,
                Err(e) => {
                    report.non_conformant.push((name.to_string(), e.to_string()));
                    continue;
                }
            };

            let capabilities = cleaner.capabilities();
            if !capabilities.has_complete_mode() {
                let reason =
                    "declares no complete acquire/transform mode (in-memory or path-based)";
                warn!(cleaner = name, reason, "excluding non-conformant cleaner");
                report
                    .non_conformant
                    .push((name.to_string(), reason.to_string()));
                continue;
            }

            let dir = self.root.join(name);
            if let Err(e) = scrub_parser::load_for_cleaner(&dir) {
                let reason = format!("malformed rule document: {e}");
                warn!(cleaner = name, %reason, "excluding non-conformant cleaner");
                report.non_conformant.push((name.to_string(), reason));
                continue;
            }

            let dependencies = cleaner.dependencies();
            let missing: Vec<String> = dependencies
                .iter()
                .filter(|d| !tool_on_path(&d.name))
                .map(|d| d.name.clone())
                .collect();
            let status = if missing.is_empty() {
                CleanerStatus::Runnable
            } else {
                debug!(cleaner = name, missing = ?missing, "cleaner blocked by missing dependencies");
                CleanerStatus::Blocked { missing }
            };

            report.descriptors.push(CleanerDescriptor {
                name: name.to_string(),
                dir,
                dependencies,
                capabilities,
                status,
            });
        }

        info!(
            qualifying = report.descriptors.len(),
            excluded = report.non_conformant.len(),
            "discovery pass complete"
        );
        report
    }
}

/// Probes for an executable on PATH.
fn tool_on_path(name: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| dir.join(name).is_file())
}

/// Runs the install commands for a cleaner's missing dependencies, in
/// declaration order. Stops at the first command that fails.
pub fn install_dependencies(descriptor: &CleanerDescriptor) -> Result<()> {
    let CleanerStatus::Blocked { missing } = &descriptor.status else {
        info!(cleaner = %descriptor.name, "no missing dependencies");
        return Ok(());
    };

    for dep in descriptor.dependencies.iter().filter(|d| missing.contains(&d.name)) {
        info!(cleaner = %descriptor.name, dependency = %dep.name, command = %dep.install_hint, "installing dependency");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&dep.install_hint)
            .status()
            .map_err(|e| {
                PipelineError::discovery(
                    descriptor.name.clone(),
                    format!("failed to spawn install command for '{}': {e}", dep.name),
                )
            })?;
        if !status.success() {
            return Err(PipelineError::discovery(
                descriptor.name.clone(),
                format!("install command for '{}' exited with {status}", dep.name),
            ));
        }
    }
    Ok(())
}

/// Missing-dependency error for a blocked descriptor, naming the remediation.
pub fn blocked_error(descriptor: &CleanerDescriptor) -> Option<PipelineError> {
    match &descriptor.status {
        CleanerStatus::Runnable => None,
        CleanerStatus::Blocked { missing } => Some(PipelineError::MissingDependency {
            cleaner: descriptor.name.clone(),
            missing: missing.clone(),
            install: descriptor.install_hints().join(" && "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scrub_core::{Capabilities, DataSet, Dependency, ExecutionContext, Metadata, StageError};

    struct StubCleaner {
        capabilities: Capabilities,
        dependencies: Vec<Dependency>,
    }

    impl Cleaner for StubCleaner {
        fn describe(&self) -> Metadata {
            Metadata::new("stub", "stub data")
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        fn dependencies(&self) -> Vec<Dependency> {
            self.dependencies.clone()
        }

        fn acquire(&self, _ctx: &ExecutionContext) -> std::result::Result<DataSet, StageError> {
            Ok(DataSet::empty())
        }

        fn transform(
            &self,
            _ctx: &ExecutionContext,
            raw: DataSet,
        ) -> std::result::Result<DataSet, StageError> {
            Ok(raw)
        }
    }

    fn registry_with(name: &str, capabilities: Capabilities, deps: Vec<Dependency>) -> CleanerRegistry {
        let mut registry = CleanerRegistry::new();
        registry.register(name, move || StubCleaner {
            capabilities,
            dependencies: deps.clone(),
        });
        registry
    }

    #[test]
    fn test_discover_builds_runnable_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with("stub", Capabilities::in_memory(), Vec::new());
        let report = PluginLoader::new(dir.path()).discover(&registry);

        assert_eq!(report.descriptors.len(), 1);
        assert!(report.non_conformant.is_empty());
        let descriptor = report.descriptor("stub").unwrap();
        assert!(descriptor.is_runnable());
        assert_eq!(descriptor.dir, dir.path().join("stub"));
    }

    #[test]
    fn test_no_complete_mode_is_non_conformant() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with("broken", Capabilities::default(), Vec::new());
        let report = PluginLoader::new(dir.path()).discover(&registry);

        assert!(report.descriptors.is_empty());
        assert_eq!(report.non_conformant.len(), 1);
        assert_eq!(report.non_conformant[0].0, "broken");
        assert!(report.non_conformant[0].1.contains("complete"));
    }

    #[test]
    fn test_malformed_rule_document_is_non_conformant() {
        let dir = tempfile::tempdir().unwrap();
        let cleaner_dir = dir.path().join("stub");
        std::fs::create_dir_all(&cleaner_dir).unwrap();
        std::fs::write(cleaner_dir.join("rules.yaml"), "rules:\n  - name: [broken").unwrap();

        let registry = registry_with("stub", Capabilities::in_memory(), Vec::new());
        let report = PluginLoader::new(dir.path()).discover(&registry);

        assert!(report.descriptors.is_empty());
        assert!(report.non_conformant[0].1.contains("malformed rule document"));
    }

    #[test]
    fn test_missing_dependency_blocks_with_remediation() {
        let dir = tempfile::tempdir().unwrap();
        let deps = vec![Dependency::new(
            "definitely_not_a_real_tool_9f2",
            "apt-get install definitely_not_a_real_tool_9f2",
        )];
        let registry = registry_with("needy", Capabilities::in_memory(), deps);
        let report = PluginLoader::new(dir.path()).discover(&registry);

        let descriptor = report.descriptor("needy").unwrap();
        assert!(!descriptor.is_runnable());

        let err = blocked_error(descriptor).unwrap();
        let msg = err.to_string();
        assert!(msg.contains("needy"));
        assert!(msg.contains("definitely_not_a_real_tool_9f2"));
        assert!(msg.contains("apt-get install"));
    }

    #[test]
    fn test_present_dependency_is_runnable() {
        let dir = tempfile::tempdir().unwrap();
        // sh is present on any unix PATH this suite runs on
        let deps = vec![Dependency::new("sh", "install sh")];
        let registry = registry_with("shelly", Capabilities::in_memory(), deps);
        let report = PluginLoader::new(dir.path()).discover(&registry);

        assert!(report.descriptor("shelly").unwrap().is_runnable());
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let mut registry = CleanerRegistry::new();
        registry.register("dup", || StubCleaner {
            capabilities: Capabilities::in_memory(),
            dependencies: Vec::new(),
        });
        let replaced = registry.register("dup", || StubCleaner {
            capabilities: Capabilities::path_based(),
            dependencies: Vec::new(),
        });

        assert!(replaced);
        assert_eq!(registry.len(), 1);
        let cleaner = registry.instantiate("dup").unwrap();
        assert!(cleaner.capabilities().path_based);
    }

    #[test]
    fn test_unknown_cleaner() {
        let registry = CleanerRegistry::new();
        assert!(matches!(
            registry.instantiate("ghost"),
            Err(PipelineError::UnknownCleaner(_))
        ));
    }
}
