//! Execution orchestrator: drives cleaner runs through acquire, transform,
//! validate, and persist.
//!
//! Each cleaner run executes on a blocking worker under an optional
//! per-cleaner timeout. Failures are contained per cleaner: one failing,
//! panicking, or timed-out cleaner never disturbs the others in the batch,
//! and previously persisted outputs stay intact because persistence is
//! atomic and happens only after validation passes.

use crate::loader::{CleanerRegistry, DiscoveryReport, PluginLoader, blocked_error};
use crate::persist;
use scrub_core::{
    Cleaner, CleanerDescriptor, CleanerStatus, DataSet, ExecutionContext, PipelineError, Result,
    RuleSpec, Stage, StageError, ValidationReport,
};
use scrub_rules::{RuleRegistry, ValidationEngine};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How the batch schedules cleaner runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One cleaner at a time, in input order.
    Serial,
    /// Up to `limit` cleaners at once.
    Concurrent { limit: usize },
}

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: ExecutionMode,

    /// Validate only, never persist.
    pub test_only: bool,

    /// Prefer the path-based acquire/transform mode where a cleaner offers it.
    pub disk_mode: bool,

    /// Per-cleaner wall-clock budget covering acquire through persist.
    pub timeout: Option<Duration>,

    /// Root for persisted outputs.
    pub output_dir: PathBuf,

    /// Root for per-run scratch directories. Defaults to the system temp dir.
    pub scratch_root: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: ExecutionMode::Serial,
            test_only: false,
            disk_mode: false,
            timeout: None,
            output_dir: output_dir.into(),
            scratch_root: None,
        }
    }
}

/// The terminal state of one cleaner in a batch.
#[derive(Debug)]
pub enum CleanerOutcome {
    /// Ran to completion; `output` is the persisted path, absent in test-only
    /// mode or when validation blocked persistence.
    Completed {
        report: ValidationReport,
        output: Option<PathBuf>,
    },

    /// A stage failed or the cleaner was excluded; contains the error.
    Failed { error: PipelineError },

    /// Exceeded the per-cleaner timeout.
    TimedOut { seconds: u64 },

    /// Blocked by missing dependencies before any stage ran.
    Blocked {
        missing: Vec<String>,
        install: String,
    },
}

impl CleanerOutcome {
    /// True for a completed run whose validation passed.
    pub fn is_success(&self) -> bool {
        matches!(self, CleanerOutcome::Completed { report, .. } if report.passed())
    }
}

/// Per-cleaner outcomes for one batch, in input order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(String, CleanerOutcome)>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&CleanerOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| o)
    }
}

/// Drives batches of cleaner runs.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<CleanerRegistry>,
    rules: Arc<RuleRegistry>,
    loader: Arc<PluginLoader>,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(
        registry: CleanerRegistry,
        rules: RuleRegistry,
        loader: PluginLoader,
        options: RunOptions,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            rules: Arc::new(rules),
            loader: Arc::new(loader),
            options,
        }
    }

    pub fn discover(&self) -> DiscoveryReport {
        self.loader.discover(&self.registry)
    }

    /// Runs every registered cleaner.
    pub async fn run_all(&self) -> Result<RunSummary> {
        let names: Vec<String> = self.registry.names().iter().map(|s| s.to_string()).collect();
        self.run(&names).await
    }

    /// Runs the named cleaners. Outcomes come back in input order regardless
    /// of scheduling.
    pub async fn run(&self, names: &[String]) -> Result<RunSummary> {
        let discovery = self.discover();
        let scratch_root = self.create_scratch_root()?;
        info!(
            cleaners = names.len(),
            mode = ?self.options.mode,
            test_only = self.options.test_only,
            "starting batch"
        );

        let summary = match self.options.mode {
            ExecutionMode::Serial => {
                let mut summary = RunSummary::default();
                for name in names {
                    let outcome = self.dispatch(name, &discovery, &scratch_root).await;
                    summary.outcomes.push((name.clone(), outcome));
                }
                summary
            }
            ExecutionMode::Concurrent { limit } => {
                let semaphore = Arc::new(Semaphore::new(limit.max(1)));
                let mut set = JoinSet::new();
                for (index, name) in names.iter().enumerate() {
                    let this = self.clone();
                    let name = name.clone();
                    let discovery_entry = discovery.descriptor(&name).cloned();
                    let excluded = discovery
                        .non_conformant
                        .iter()
                        .find(|(n, _)| n == &name)
                        .cloned();
                    let scratch = scratch_root.clone();
                    let semaphore = Arc::clone(&semaphore);
                    set.spawn(async move {
                        // a closed semaphore cannot happen; treat it as a fatal task error
                        let _permit = semaphore.acquire_owned().await;
                        let outcome = this
                            .run_resolved(&name, discovery_entry, excluded, &scratch)
                            .await;
                        (index, name, outcome)
                    });
                }

                let mut slots: Vec<Option<(String, CleanerOutcome)>> =
                    names.iter().map(|_| None).collect();
                while let Some(joined) = set.join_next().await {
                    match joined {
                        Ok((index, name, outcome)) => slots[index] = Some((name, outcome)),
                        Err(e) => error!(error = %e, "cleaner task join failed"),
                    }
                }
                // a lost task still gets a recorded failure, never silence
                let outcomes = slots
                    .into_iter()
                    .enumerate()
                    .map(|(index, slot)| {
                        slot.unwrap_or_else(|| {
                            (
                                names[index].clone(),
                                CleanerOutcome::Failed {
                                    error: PipelineError::Worker(
                                        "cleaner task could not be joined".into(),
                                    ),
                                },
                            )
                        })
                    })
                    .collect();
                RunSummary { outcomes }
            }
        };

        if let Err(e) = std::fs::remove_dir_all(&scratch_root) {
            debug!(path = %scratch_root.display(), error = %e, "scratch cleanup failed");
        }
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "batch complete"
        );
        Ok(summary)
    }

    fn create_scratch_root(&self) -> Result<PathBuf> {
        let base = self
            .options
            .scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let run_id = format!(
            "scrub-{}-{}",
            std::process::id(),
            chrono::Utc::now().format("%Y%m%dT%H%M%S%f")
        );
        let root = base.join(run_id);
        std::fs::create_dir_all(&root)
            .map_err(|e| PipelineError::Scratch(format!("{}: {e}", root.display())))?;
        Ok(root)
    }

    async fn dispatch(
        &self,
        name: &str,
        discovery: &DiscoveryReport,
        scratch_root: &Path,
    ) -> CleanerOutcome {
        let descriptor = discovery.descriptor(name).cloned();
        let excluded = discovery
            .non_conformant
            .iter()
            .find(|(n, _)| n == name)
            .cloned();
        self.run_resolved(name, descriptor, excluded, scratch_root)
            .await
    }

    async fn run_resolved(
        &self,
        name: &str,
        descriptor: Option<CleanerDescriptor>,
        excluded: Option<(String, String)>,
        scratch_root: &Path,
    ) -> CleanerOutcome {
        let descriptor = match descriptor {
            Some(d) => d,
            None => {
                let error = match excluded {
                    Some((_, reason)) => PipelineError::discovery(name, reason),
                    None => PipelineError::UnknownCleaner(name.to_string()),
                };
                warn!(cleaner = name, error = %error, "cleaner cannot run");
                return CleanerOutcome::Failed { error };
            }
        };

        // dependency gate: fail fast with the exact remediation
        if let CleanerStatus::Blocked { missing } = &descriptor.status {
            let error = blocked_error(&descriptor);
            warn!(cleaner = name, error = ?error, "cleaner blocked");
            return CleanerOutcome::Blocked {
                missing: missing.clone(),
                install: descriptor.install_hints().join(" && "),
            };
        }

        let declared = match scrub_parser::load_for_cleaner(&descriptor.dir) {
            Ok(doc) => doc.map(|d| d.rules).unwrap_or_default(),
            Err(e) => {
                return CleanerOutcome::Failed {
                    error: PipelineError::discovery(name, e.to_string()),
                };
            }
        };

        let ctx = ExecutionContext::new(
            name,
            scratch_root.join(name),
            self.options.output_dir.clone(),
        );
        let registry = Arc::clone(&self.registry);
        let rules = Arc::clone(&self.rules);
        let options = self.options.clone();
        let name_owned = name.to_string();
        // a blocking worker cannot be aborted mid-stage; the flag stops it at
        // the next stage boundary, before it can touch the output directory
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);
        let task = tokio::task::spawn_blocking(move || {
            let cleaner = registry.instantiate(&name_owned)?;
            execute_stages(
                cleaner.as_ref(),
                &descriptor,
                &ctx,
                &rules,
                declared,
                &options,
                &worker_cancelled,
            )
        });

        let joined = match self.options.timeout {
            Some(budget) => match tokio::time::timeout(budget, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    let seconds = budget.as_secs();
                    cancelled.store(true, Ordering::Release);
                    warn!(cleaner = name, seconds, "cleaner timed out");
                    return CleanerOutcome::TimedOut { seconds };
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok((report, output))) => CleanerOutcome::Completed { report, output },
            Ok(Err(error)) => {
                error!(cleaner = name, error = %error, "cleaner failed");
                CleanerOutcome::Failed { error }
            }
            Err(e) => CleanerOutcome::Failed {
                error: PipelineError::Worker(e.to_string()),
            },
        }
    }
}

/// Runs acquire, transform, validate, and persist for one cleaner on the
/// current thread. A panic inside acquire or transform is contained to a
/// stage failure.
fn execute_stages(
    cleaner: &dyn Cleaner,
    descriptor: &CleanerDescriptor,
    ctx: &ExecutionContext,
    base_rules: &RuleRegistry,
    declared: Vec<RuleSpec>,
    options: &RunOptions,
    cancelled: &AtomicBool,
) -> Result<(ValidationReport, Option<PathBuf>)> {
    bail_if_cancelled(cancelled, options)?;
    std::fs::create_dir_all(&ctx.scratch_dir)
        .map_err(|e| PipelineError::Scratch(format!("{}: {e}", ctx.scratch_dir.display())))?;

    let use_path_mode = if options.disk_mode && descriptor.capabilities.path_based {
        true
    } else {
        !descriptor.capabilities.in_memory
    };

    let cleaned: DataSet = if use_path_mode {
        let raw_path = run_stage(Stage::Acquire, || {
            cleaner.acquire_to_path(ctx, &ctx.scratch_dir)
        })?;
        debug!(cleaner = %ctx.cleaner, path = %raw_path.display(), "acquired to path");
        run_stage(Stage::Transform, || {
            cleaner.transform_from_path(ctx, &raw_path)
        })?
    } else {
        let raw = run_stage(Stage::Acquire, || cleaner.acquire(ctx))?;
        debug!(cleaner = %ctx.cleaner, rows = raw.len(), "acquired in memory");
        run_stage(Stage::Transform, || cleaner.transform(ctx, raw))?
    };

    bail_if_cancelled(cancelled, options)?;

    // per-run registry: custom rules live and die with this cleaner's run
    let mut registry = base_rules.clone();
    for (rule_name, rule_fn) in cleaner.custom_rule_fns() {
        registry.register(rule_name, rule_fn);
    }
    let mut rules = declared;
    rules.extend(cleaner.extra_rules());

    let engine = ValidationEngine::new(registry);
    let report = run_stage(Stage::Validate, || {
        Ok(engine.validate(&ctx.cleaner, &cleaned, &rules))
    })?;

    if options.test_only {
        info!(cleaner = %ctx.cleaner, passed = report.passed(), "test-only run, skipping persist");
        return Ok((report, None));
    }
    if !report.passed() {
        warn!(
            cleaner = %ctx.cleaner,
            failed_errors = report.failed_errors(),
            "validation blocked persistence"
        );
        return Ok((report, None));
    }

    bail_if_cancelled(cancelled, options)?;
    let output = run_stage(Stage::Persist, || {
        persist::write_atomic(&ctx.output_dir, &ctx.cleaner, &cleaned)
    })?;
    Ok((report, Some(output)))
}

/// Abandoned workers must never persist after their timeout fired.
fn bail_if_cancelled(cancelled: &AtomicBool, options: &RunOptions) -> Result<()> {
    if cancelled.load(Ordering::Acquire) {
        let seconds = options.timeout.map_or(0, |t| t.as_secs());
        return Err(PipelineError::Timeout { seconds });
    }
    Ok(())
}

fn run_stage<T>(stage: Stage, f: impl FnOnce() -> std::result::Result<T, StageError>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(|e| PipelineError::stage(stage, e)),
        Err(payload) => {
            let reason = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(PipelineError::stage(
                stage,
                StageError::failed(format!("panicked: {reason}")),
            ))
        }
    }
}
