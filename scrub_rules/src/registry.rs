//! Rule registry mapping rule type names to rule functions.

use crate::builtin;
use scrub_core::RuleFn;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Maps rule type names to their implementations.
///
/// Registration is last-write-wins: registering a name that already exists
/// replaces the previous function and logs a warning. Per-cleaner custom rules
/// are registered into a clone of the shared registry, so a replacement is
/// scoped to that cleaner's run.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, RuleFn>,
}

impl RuleRegistry {
    /// An empty registry with no rule types.
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// A registry pre-loaded with the parameterized built-in rule types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("no_nulls", Arc::new(builtin::no_nulls));
        registry.register("unique_keys", Arc::new(builtin::unique_keys));
        registry.register("value_range", Arc::new(builtin::value_range));
        registry.register("allowed_values", Arc::new(builtin::allowed_values));
        registry.register("regex_match", Arc::new(builtin::regex_match));
        registry.register("outliers_zscore", Arc::new(builtin::outliers_zscore));
        registry.register("date_continuity", Arc::new(builtin::date_continuity));
        registry.register("expression", Arc::new(builtin::expression));
        registry
    }

    /// Registers `rule` under `name`. Returns `true` if a previous registration
    /// was replaced.
    pub fn register(&mut self, name: impl Into<String>, rule: RuleFn) -> bool {
        let name = name.into();
        let replaced = self.rules.insert(name.clone(), rule).is_some();
        if replaced {
            warn!(rule = %name, "rule type re-registered, replacing previous implementation");
        }
        replaced
    }

    pub fn get(&self, name: &str) -> Option<&RuleFn> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
