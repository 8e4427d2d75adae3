//! A synthetic demonstration cleaner.
//!
//! Generates one year of daily observations from a seeded generator, so runs
//! are reproducible without touching the network. Exercises both acquisition
//! modes and the custom-rule hooks, which also makes it the fixture for the
//! orchestrator integration tests.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scrub_core::{
    Capabilities, Cleaner, DataSet, DataValue, ExecutionContext, Metadata, RuleFn, RuleOutcome,
    RuleSpec, Severity, StageError,
};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ROWS: usize = 365;
const CATEGORIES: [&str; 3] = ["alpha", "beta", "gamma"];

pub struct SyntheticCleaner {
    seed: u64,
}

impl SyntheticCleaner {
    pub fn new() -> Self {
        Self { seed: 42 }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    fn generate(&self) -> DataSet {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let mut rows = Vec::with_capacity(ROWS);
        for day in 0..ROWS {
            let date = start + Duration::days(day as i64);
            // raw values deliberately include outliers and gaps for the
            // transform to repair
            let value = if rng.random::<f64>() < 0.02 {
                DataValue::Null
            } else {
                DataValue::Float(rng.random::<f64>() * 400.0 - 150.0)
            };
            let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
            rows.push(vec![
                DataValue::Timestamp(date.format("%Y-%m-%d").to_string()),
                value,
                DataValue::from(category),
            ]);
        }
        DataSet::from_rows(
            vec!["date".into(), "value".into(), "category".into()],
            rows,
        )
        .unwrap_or_default()
    }

    fn clean(&self, raw: DataSet) -> Result<DataSet, StageError> {
        let columns = raw.column_names().to_vec();
        let mut rows: Vec<Vec<DataValue>> = Vec::with_capacity(raw.len());
        for row in raw.rows() {
            let date = row[0].clone();
            let value = match &row[1] {
                DataValue::Null => DataValue::Float(0.0),
                other => match other.as_float() {
                    Some(v) => DataValue::Float(v.clamp(-100.0, 200.0)),
                    None => return Err(StageError::failed("non-numeric value column")),
                },
            };
            let category = match row[2].as_string() {
                Some(s) => DataValue::from(s.to_uppercase()),
                None => return Err(StageError::failed("non-string category column")),
            };
            rows.push(vec![date, value, category]);
        }
        DataSet::from_rows(columns, rows).map_err(|e| StageError::failed(e.to_string()))
    }
}

impl Default for SyntheticCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cleaner for SyntheticCleaner {
    fn describe(&self) -> Metadata {
        Metadata::new("synthetic", "one year of seeded daily observations")
            .with_update_frequency("daily")
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::both()
    }

    fn acquire(&self, _ctx: &ExecutionContext) -> Result<DataSet, StageError> {
        Ok(self.generate())
    }

    fn acquire_to_path(
        &self,
        _ctx: &ExecutionContext,
        scratch: &Path,
    ) -> Result<PathBuf, StageError> {
        let path = scratch.join("raw.jsonl");
        let mut file = std::fs::File::create(&path)?;
        let raw = self.generate();
        for row in raw.rows() {
            let record = json!({
                "date": row[0].render(),
                "value": row[1].as_float(),
                "category": row[2].render(),
            });
            writeln!(file, "{record}")?;
        }
        Ok(path)
    }

    fn transform(&self, _ctx: &ExecutionContext, raw: DataSet) -> Result<DataSet, StageError> {
        self.clean(raw)
    }

    fn transform_from_path(
        &self,
        _ctx: &ExecutionContext,
        path: &Path,
    ) -> Result<DataSet, StageError> {
        let file = std::fs::File::open(path)?;
        let mut rows = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let record: serde_json::Value = serde_json::from_str(&line)
                .map_err(|e| StageError::failed(format!("bad scratch record: {e}")))?;
            rows.push(vec![
                DataValue::Timestamp(record["date"].as_str().unwrap_or_default().to_string()),
                record["value"]
                    .as_f64()
                    .map(DataValue::Float)
                    .unwrap_or(DataValue::Null),
                DataValue::from(record["category"].as_str().unwrap_or_default()),
            ]);
        }
        let raw = DataSet::from_rows(
            vec!["date".into(), "value".into(), "category".into()],
            rows,
        )
        .map_err(|e| StageError::failed(e.to_string()))?;
        self.clean(raw)
    }

    fn extra_rules(&self) -> Vec<RuleSpec> {
        vec![
            RuleSpec::new("date_known", "no_nulls", Severity::Error)
                .with_param("columns", json!(["date", "value", "category"])),
            RuleSpec::new("date_unique", "unique_keys", Severity::Error)
                .with_param("columns", json!(["date"])),
            RuleSpec::new("value_bounds", "value_range", Severity::Error)
                .with_param("column", "value")
                .with_param("min", -100)
                .with_param("max", 200),
            RuleSpec::new("category_known", "allowed_values", Severity::Warning)
                .with_param("column", "category")
                .with_param("values", json!(["ALPHA", "BETA", "GAMMA"])),
            RuleSpec::new("full_year", "expression", Severity::Warning)
                .with_param("expr", "df['date'].count() == 365"),
            RuleSpec::new("categories_upper", "uppercase_categories", Severity::Error),
        ]
    }

    fn custom_rule_fns(&self) -> Vec<(String, RuleFn)> {
        vec![(
            "uppercase_categories".to_string(),
            Arc::new(uppercase_categories),
        )]
    }
}

/// Run-scoped custom rule: every category value is fully uppercased.
fn uppercase_categories(ds: &DataSet, _params: &scrub_core::RuleParams) -> RuleOutcome {
    let Some(values) = ds.column("category") else {
        return RuleOutcome::fail("column 'category' not found in dataset");
    };
    let lowercase = values
        .filter_map(DataValue::as_string)
        .filter(|s| s.chars().any(|c| c.is_lowercase()))
        .count();
    if lowercase == 0 {
        RuleOutcome::pass("all categories uppercased")
    } else {
        RuleOutcome::fail(format!("{lowercase} categories not uppercased"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("synthetic", "/tmp/scrub-scratch", "/tmp/scrub-out")
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = SyntheticCleaner::new().generate();
        let b = SyntheticCleaner::new().generate();
        assert_eq!(a.len(), 365);
        assert_eq!(
            a.rows().collect::<Vec<_>>()[0],
            b.rows().collect::<Vec<_>>()[0]
        );
    }

    #[test]
    fn test_transform_repairs_raw_data() {
        let cleaner = SyntheticCleaner::new();
        let cleaned = cleaner.transform(&ctx(), cleaner.generate()).unwrap();

        for row in cleaned.rows() {
            assert!(!row[1].is_null());
            let v = row[1].as_float().unwrap();
            assert!((-100.0..=200.0).contains(&v));
            let cat = row[2].as_string().unwrap();
            assert_eq!(cat, cat.to_uppercase());
        }
    }

    #[test]
    fn test_path_mode_round_trip() {
        let scratch = tempfile::tempdir().unwrap();
        let cleaner = SyntheticCleaner::new();
        let path = cleaner.acquire_to_path(&ctx(), scratch.path()).unwrap();
        let from_path = cleaner.transform_from_path(&ctx(), &path).unwrap();

        let in_memory = cleaner.transform(&ctx(), cleaner.generate()).unwrap();
        assert_eq!(from_path.len(), in_memory.len());
        assert_eq!(
            from_path.rows().collect::<Vec<_>>()[0][0],
            in_memory.rows().collect::<Vec<_>>()[0][0]
        );
    }

    #[test]
    fn test_extra_rules_reference_registered_custom_rule() {
        let cleaner = SyntheticCleaner::new();
        let custom: Vec<String> = cleaner
            .custom_rule_fns()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        let referenced = cleaner
            .extra_rules()
            .iter()
            .any(|spec| custom.contains(&spec.rule_type));
        assert!(referenced);
    }
}
