//! # Scrub Core
//!
//! Core data structures and contracts for the Scrub data cleaning pipeline.
//!
//! This crate provides the building blocks shared by the rule engine, the
//! plugin loader, and the orchestrator:
//!
//! - **DataSet**: ordered-column tabular data produced by cleaner transforms
//! - **Cleaner**: the plugin capability contract (describe / acquire / transform)
//! - **RuleSpec / Verdict / ValidationReport**: declarative data-quality rules
//!   and their evaluation results
//! - **Error taxonomy**: per-stage and per-cleaner failure containment
//!
//! ## Example
//!
//! ```rust
//! use scrub_core::{DataSet, DataValue, RuleSpec, Severity};
//!
//! let dataset = DataSet::from_rows(
//!     vec!["year".into(), "value".into()],
//!     vec![vec![DataValue::Int(2024), DataValue::Float(1.5)]],
//! )
//! .unwrap();
//!
//! let rule = RuleSpec::new("year_known", "no_nulls", Severity::Error)
//!     .with_param("columns", serde_json::json!(["year"]));
//!
//! assert_eq!(dataset.len(), 1);
//! assert_eq!(rule.rule_type, "no_nulls");
//! ```

pub mod cleaner;
pub mod dataset;
pub mod error;
pub mod rule;

pub use cleaner::*;
pub use dataset::*;
pub use error::*;
pub use rule::*;
