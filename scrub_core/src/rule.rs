//! Rule specifications, verdicts, and validation reports.
//!
//! A [`RuleSpec`] names a rule type and its parameters; evaluating it against a
//! dataset produces a [`RuleOutcome`], which the validation engine combines with
//! the spec's severity into an immutable [`Verdict`]. Verdicts for one cleaner
//! run are aggregated into a [`ValidationReport`].

use crate::DataSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Parameter mapping for one rule: column names, bounds, allow-sets, pattern
/// or expression strings.
pub type RuleParams = BTreeMap<String, serde_json::Value>;

/// Severity attached to a rule specification.
///
/// `Error` blocks persistence of the cleaned output; `Warning` is recorded but
/// never flips the overall result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A named, declarative rule: type tag, parameter mapping, and severity.
///
/// The type tag must resolve to a registered rule function; specs naming an
/// unknown type are reported as failed verdicts, never evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Name of this rule instance, used in reports
    pub name: String,

    /// Rule-type tag resolved through the rule registry
    #[serde(rename = "type")]
    pub rule_type: String,

    /// Free-form parameters, validated by the rule function at evaluation time
    #[serde(default)]
    pub params: RuleParams,

    /// Severity applied to the resulting verdict
    #[serde(default)]
    pub severity: Severity,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>, rule_type: impl Into<String>, severity: Severity) -> Self {
        Self {
            name: name.into(),
            rule_type: rule_type.into(),
            params: RuleParams::new(),
            severity,
        }
    }

    /// Adds one parameter. `value` must serialize to JSON.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// What a rule function returns: pass/fail, a message, and structured details.
///
/// Severity is attached later by the validation engine from the spec.
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub passed: bool,
    pub message: String,
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl RuleOutcome {
    /// Creates a passing outcome.
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: serde_json::Map::new(),
        }
    }

    /// Creates a failing outcome.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: serde_json::Map::new(),
        }
    }

    /// Attaches one detail entry.
    pub fn with_detail(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Signature of a rule evaluation function.
///
/// Custom rule functions supplied by cleaners use the same shape as the
/// built-in catalogue, so they register and evaluate identically.
pub type RuleFn = Arc<dyn Fn(&DataSet, &RuleParams) -> RuleOutcome + Send + Sync>;

/// The result of evaluating one rule: outcome plus the spec's identity and
/// severity. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    /// Name of the rule instance this verdict belongs to
    pub rule: String,

    /// Rule-type tag the rule resolved to
    pub rule_type: String,

    pub passed: bool,
    pub message: String,
    pub details: serde_json::Map<String, serde_json::Value>,

    /// Copied from the rule spec, not computed
    pub severity: Severity,
}

impl Verdict {
    /// Combines a spec with its outcome.
    pub fn from_outcome(spec: &RuleSpec, outcome: RuleOutcome) -> Self {
        Self {
            rule: spec.name.clone(),
            rule_type: spec.rule_type.clone(),
            passed: outcome.passed,
            message: outcome.message,
            details: outcome.details,
            severity: spec.severity,
        }
    }

    /// A failed verdict for a spec that could not be evaluated at all
    /// (unknown rule type, panicking rule function).
    pub fn rejected(spec: &RuleSpec, message: impl Into<String>) -> Self {
        Self {
            rule: spec.name.clone(),
            rule_type: spec.rule_type.clone(),
            passed: false,
            message: message.into(),
            details: serde_json::Map::new(),
            severity: spec.severity,
        }
    }

    /// True if this verdict failed with error severity.
    pub fn is_blocking_failure(&self) -> bool {
        !self.passed && self.severity == Severity::Error
    }
}

/// Aggregated verdicts for one cleaner run.
///
/// Constructed once from the ordered verdict sequence; never mutated after.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    cleaner: String,
    verdicts: Vec<Verdict>,
}

impl ValidationReport {
    pub fn new(cleaner: impl Into<String>, verdicts: Vec<Verdict>) -> Self {
        Self {
            cleaner: cleaner.into(),
            verdicts,
        }
    }

    /// The cleaner this report belongs to.
    pub fn cleaner(&self) -> &str {
        &self.cleaner
    }

    /// Verdicts in evaluation order.
    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    /// Overall result: false iff any error-severity verdict failed.
    /// Warning failures are recorded but do not flip the status.
    pub fn passed(&self) -> bool {
        !self.verdicts.iter().any(Verdict::is_blocking_failure)
    }

    pub fn total(&self) -> usize {
        self.verdicts.len()
    }

    pub fn passed_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed).count()
    }

    pub fn failed_errors(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.is_blocking_failure())
            .count()
    }

    pub fn failed_warnings(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| !v.passed && v.severity == Severity::Warning)
            .count()
    }
}
