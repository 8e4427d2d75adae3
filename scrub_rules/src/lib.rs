//! # Scrub Rules
//!
//! Rule catalogue, registry, and validation engine for the Scrub pipeline.
//!
//! - [`builtin`]: whole-dataset and parameterized rule functions
//! - [`expr`]: the restricted boolean expression interpreter
//! - [`RuleRegistry`]: name-to-function mapping with per-run cloning
//! - [`ValidationEngine`]: evaluates the built-in set plus declared rules and
//!   aggregates verdicts into a [`scrub_core::ValidationReport`]

pub mod builtin;
pub mod engine;
pub mod expr;
pub mod registry;

pub use engine::{ValidationEngine, standard_rules};
pub use expr::ExpressionError;
pub use registry::RuleRegistry;
