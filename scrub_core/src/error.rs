//! Error types for pipeline execution.
//!
//! Failures are contained at two granularities: per rule inside validation
//! (downgraded to failed verdicts, never surfaced here) and per cleaner inside
//! a batch ([`PipelineError`] recorded against that cleaner's outcome). Only
//! orchestrator-level faults abort a whole run.

use std::fmt;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// An error raised inside one cleaner stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// The cleaner does not implement this operation variant
    #[error("operation not supported by this cleaner: {0}")]
    Unsupported(&'static str),

    /// I/O failure inside the stage
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Plugin-reported failure
    #[error("{0}")]
    Failed(String),
}

impl StageError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// The four stages of one cleaner run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquire,
    Transform,
    Validate,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Acquire => write!(f, "acquire"),
            Stage::Transform => write!(f, "transform"),
            Stage::Validate => write!(f, "validate"),
            Stage::Persist => write!(f, "persist"),
        }
    }
}

/// Errors attributed to one cleaner or to the run itself.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A discovery candidate was malformed; it is excluded and the pass continues
    #[error("discovery failed for candidate '{name}': {reason}")]
    Discovery { name: String, reason: String },

    /// Declared dependencies are missing; names the exact remediation
    #[error(
        "cleaner '{cleaner}' is blocked by missing dependencies [{}]; install with: {install}",
        missing.join(", ")
    )]
    MissingDependency {
        cleaner: String,
        missing: Vec<String>,
        install: String,
    },

    /// A stage of one cleaner failed; isolates to that cleaner
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: StageError,
    },

    /// The cleaner exceeded the configured per-cleaner timeout
    #[error("cleaner timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The worker task backing a cleaner run was lost before any stage
    /// could be attributed
    #[error("worker task failed: {0}")]
    Worker(String),

    /// No cleaner run can proceed; fatal to the whole batch
    #[error("scratch directory unavailable: {0}")]
    Scratch(String),

    /// The requested cleaner is not registered
    #[error("no cleaner registered under '{0}'")]
    UnknownCleaner(String),
}

impl PipelineError {
    pub fn stage(stage: Stage, source: StageError) -> Self {
        Self::Stage { stage, source }
    }

    pub fn discovery(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Discovery {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_names_remediation() {
        let err = PipelineError::MissingDependency {
            cleaner: "census".into(),
            missing: vec!["curl".into(), "jq".into()],
            install: "apt-get install curl jq".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("census"));
        assert!(msg.contains("curl, jq"));
        assert!(msg.contains("apt-get install curl jq"));
    }

    #[test]
    fn test_stage_error_display() {
        let err = PipelineError::stage(Stage::Transform, StageError::failed("bad rows"));
        assert_eq!(err.to_string(), "transform stage failed: bad rows");

        let err = PipelineError::stage(Stage::Validate, StageError::failed("report lost"));
        assert_eq!(err.to_string(), "validate stage failed: report lost");
    }

    #[test]
    fn test_worker_error_display() {
        let err = PipelineError::Worker("cancelled".into());
        assert_eq!(err.to_string(), "worker task failed: cancelled");
    }
}
