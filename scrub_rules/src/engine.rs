//! Validation engine: runs the built-in rule set and declared rules against a
//! cleaned dataset and aggregates the verdicts into a report.

use crate::registry::RuleRegistry;
use scrub_core::{DataSet, RuleFn, RuleOutcome, RuleParams, RuleSpec, Severity, ValidationReport, Verdict};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// The fixed built-in rule set, evaluated for every cleaner before any
/// declared rules, in this order.
pub fn standard_rules() -> Vec<(RuleSpec, RuleFn)> {
    fn builtin(name: &str, severity: Severity, f: fn(&DataSet, &RuleParams) -> RuleOutcome) -> (RuleSpec, RuleFn) {
        (RuleSpec::new(name, name, severity), Arc::new(f))
    }

    vec![
        builtin("not_empty", Severity::Error, crate::builtin::not_empty),
        builtin(
            "no_null_columns",
            Severity::Error,
            crate::builtin::no_null_columns,
        ),
        builtin(
            "duplicate_rows",
            Severity::Warning,
            crate::builtin::duplicate_rows,
        ),
        builtin(
            "column_names",
            Severity::Warning,
            crate::builtin::column_names,
        ),
        builtin(
            "numeric_sanity",
            Severity::Warning,
            crate::builtin::numeric_sanity,
        ),
        builtin("date_sanity", Severity::Warning, crate::builtin::date_sanity),
        builtin(
            "null_percentage",
            Severity::Warning,
            crate::builtin::null_percentage,
        ),
        builtin(
            "string_trimmed",
            Severity::Warning,
            crate::builtin::string_trimmed,
        ),
    ]
}

/// Evaluates rules against datasets and aggregates verdicts.
///
/// A failure inside one rule function, including a panic, is contained to that
/// rule's verdict; the remaining rules still run.
pub struct ValidationEngine {
    registry: RuleRegistry,
}

impl ValidationEngine {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Validates `dataset` for `cleaner`: the built-in set first, then the
    /// declared rules in document order. Verdict order matches evaluation
    /// order.
    pub fn validate(
        &self,
        cleaner: &str,
        dataset: &DataSet,
        declared: &[RuleSpec],
    ) -> ValidationReport {
        let mut verdicts = Vec::with_capacity(standard_rules().len() + declared.len());

        for (spec, rule) in standard_rules() {
            verdicts.push(evaluate_contained(&spec, &rule, dataset));
        }

        for spec in declared {
            let verdict = match self.registry.get(&spec.rule_type) {
                Some(rule) => evaluate_contained(spec, rule, dataset),
                None => {
                    error!(cleaner, rule = %spec.name, rule_type = %spec.rule_type, "unknown rule type");
                    Verdict::rejected(spec, format!("unknown rule type '{}'", spec.rule_type))
                }
            };
            verdicts.push(verdict);
        }

        debug!(
            cleaner,
            total = verdicts.len(),
            failed = verdicts.iter().filter(|v| !v.passed).count(),
            "validation complete"
        );
        ValidationReport::new(cleaner, verdicts)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(RuleRegistry::with_builtins())
    }
}

fn evaluate_contained(spec: &RuleSpec, rule: &RuleFn, dataset: &DataSet) -> Verdict {
    match panic::catch_unwind(AssertUnwindSafe(|| rule(dataset, &spec.params))) {
        Ok(outcome) => Verdict::from_outcome(spec, outcome),
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!(rule = %spec.name, %reason, "rule function panicked");
            Verdict::rejected(spec, format!("rule function panicked: {reason}"))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
