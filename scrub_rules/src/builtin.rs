//! Built-in rule catalogue.
//!
//! Two groups of rule functions share the same `(dataset, params) -> outcome`
//! shape: whole-dataset rules that run against every cleaner's output, and
//! parameterized rules referenced from declarative rule documents.
//!
//! A missing referenced column or a malformed parameter is always a failed
//! outcome naming the problem, never a panic.

use crate::expr;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use scrub_core::{DataSet, DataValue, RuleOutcome, RuleParams};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

static COLUMN_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("valid pattern"));

// ---------------------------------------------------------------------------
// Parameter helpers
// ---------------------------------------------------------------------------

fn columns_param(params: &RuleParams) -> Result<Vec<String>, RuleOutcome> {
    let value = params
        .get("columns")
        .ok_or_else(|| RuleOutcome::fail("missing required parameter 'columns'"))?;
    let list = value
        .as_array()
        .ok_or_else(|| RuleOutcome::fail("parameter 'columns' must be a list of column names"))?;
    let mut columns = Vec::with_capacity(list.len());
    for entry in list {
        match entry.as_str() {
            Some(name) => columns.push(name.to_string()),
            None => {
                return Err(RuleOutcome::fail(
                    "parameter 'columns' must contain only strings",
                ));
            }
        }
    }
    if columns.is_empty() {
        return Err(RuleOutcome::fail("parameter 'columns' must not be empty"));
    }
    Ok(columns)
}

fn column_param(params: &RuleParams) -> Result<String, RuleOutcome> {
    params
        .get("column")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| RuleOutcome::fail("missing required string parameter 'column'"))
}

fn number_param(params: &RuleParams, key: &str) -> Result<Option<f64>, RuleOutcome> {
    match params.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| RuleOutcome::fail(format!("parameter '{key}' must be numeric"))),
    }
}

fn threshold_param(params: &RuleParams, default: f64) -> f64 {
    params
        .get("threshold")
        .and_then(|v| v.as_f64())
        .unwrap_or(default)
}

fn missing_column(name: &str) -> RuleOutcome {
    RuleOutcome::fail(format!("column '{name}' not found in dataset"))
        .with_detail("missing_column", name)
}

/// Key for row-level duplicate detection. Type-tagged so `Int(1)` and
/// `String("1")` never collide.
fn row_key(values: &[&DataValue]) -> String {
    values
        .iter()
        .map(|v| format!("{}:{}", v.type_name(), v.render()))
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_timestamp_year(raw: &str) -> Option<i32> {
    parse_date(raw).map(|d| d.year())
}

// ---------------------------------------------------------------------------
// Whole-dataset rules (the fixed built-in set)
// ---------------------------------------------------------------------------

/// Fails if the dataset has no rows.
pub fn not_empty(ds: &DataSet, _params: &RuleParams) -> RuleOutcome {
    let outcome = if ds.is_empty() {
        RuleOutcome::fail("dataset is empty")
    } else {
        RuleOutcome::pass(format!("dataset has {} rows", ds.len()))
    };
    outcome.with_detail("row_count", ds.len())
}

/// Fails if any column is entirely null.
pub fn no_null_columns(ds: &DataSet, _params: &RuleParams) -> RuleOutcome {
    if ds.is_empty() {
        return RuleOutcome::pass("no rows to check");
    }
    let null_columns: Vec<String> = ds
        .column_names()
        .iter()
        .filter(|name| ds.column(name).is_some_and(|mut c| c.all(DataValue::is_null)))
        .cloned()
        .collect();

    let outcome = if null_columns.is_empty() {
        RuleOutcome::pass("no fully-null columns")
    } else {
        RuleOutcome::fail(format!(
            "columns are entirely null: [{}]",
            null_columns.join(", ")
        ))
    };
    outcome.with_detail("null_columns", null_columns)
}

/// Fails if the duplicate-row ratio reaches the threshold (percent, default 1).
pub fn duplicate_rows(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let threshold = threshold_param(params, 1.0);
    let mut seen = BTreeSet::new();
    let mut duplicates = 0usize;
    for row in ds.rows() {
        let key = row_key(&row.iter().collect::<Vec<_>>());
        if !seen.insert(key) {
            duplicates += 1;
        }
    }
    let pct = if ds.is_empty() {
        0.0
    } else {
        duplicates as f64 / ds.len() as f64 * 100.0
    };

    let outcome = if pct < threshold {
        RuleOutcome::pass(format!("{duplicates} duplicate rows ({pct:.1}%)"))
    } else {
        RuleOutcome::fail(format!(
            "found {duplicates} duplicate rows ({pct:.1}%, threshold {threshold}%)"
        ))
    };
    outcome
        .with_detail("duplicate_count", duplicates)
        .with_detail("duplicate_percentage", pct)
}

/// Fails on column names that are not lowercase `[a-z0-9_]`.
pub fn column_names(ds: &DataSet, _params: &RuleParams) -> RuleOutcome {
    let mut issues = Vec::new();
    for name in ds.column_names() {
        if name.contains(' ') {
            issues.push(format!("column '{name}' contains spaces"));
        } else if name.chars().any(|c| c.is_ascii_uppercase()) {
            issues.push(format!("column '{name}' contains uppercase characters"));
        } else if !COLUMN_NAME_RE.is_match(name) {
            issues.push(format!("column '{name}' contains special characters"));
        }
    }

    let outcome = if issues.is_empty() {
        RuleOutcome::pass("all column names well-formed")
    } else {
        RuleOutcome::fail(format!("{} column name issues", issues.len()))
    };
    outcome.with_detail("issues", issues)
}

/// Fails on infinities or NaN in numeric columns; flags constant columns.
pub fn numeric_sanity(ds: &DataSet, _params: &RuleParams) -> RuleOutcome {
    let mut issues: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in ds.column_names() {
        let Some(column) = ds.column(name) else {
            continue;
        };
        let numeric: Vec<f64> = column.filter_map(DataValue::as_float).collect();
        if numeric.is_empty() {
            continue;
        }
        let mut column_issues = Vec::new();
        if numeric.iter().any(|v| v.is_infinite()) {
            column_issues.push("contains infinity values".to_string());
        }
        if numeric.iter().any(|v| v.is_nan()) {
            column_issues.push("contains NaN values".to_string());
        }
        if numeric.len() > 1 && numeric.windows(2).all(|w| w[0] == w[1]) {
            column_issues.push("all values are identical".to_string());
        }
        if !column_issues.is_empty() {
            issues.insert(name.clone(), column_issues);
        }
    }

    let outcome = if issues.is_empty() {
        RuleOutcome::pass("all numeric columns sane")
    } else {
        RuleOutcome::fail(format!("issues in {} numeric columns", issues.len()))
    };
    outcome.with_detail(
        "column_issues",
        serde_json::to_value(&issues).unwrap_or_default(),
    )
}

/// Fails on unparsable timestamps or years outside 1900..=2100.
pub fn date_sanity(ds: &DataSet, _params: &RuleParams) -> RuleOutcome {
    let mut issues = Vec::new();
    for name in ds.column_names() {
        let Some(column) = ds.column(name) else {
            continue;
        };
        let mut unparsable = 0usize;
        let mut out_of_range = 0usize;
        for value in column {
            let Some(raw) = value.as_timestamp() else {
                continue;
            };
            match parse_timestamp_year(raw) {
                None => unparsable += 1,
                Some(year) if !(1900..=2100).contains(&year) => out_of_range += 1,
                Some(_) => {}
            }
        }
        if unparsable > 0 {
            issues.push(format!("column '{name}' has {unparsable} unparsable timestamps"));
        }
        if out_of_range > 0 {
            issues.push(format!(
                "column '{name}' has {out_of_range} dates outside 1900-2100"
            ));
        }
    }

    let outcome = if issues.is_empty() {
        RuleOutcome::pass("all date columns sane")
    } else {
        RuleOutcome::fail(format!("{} date column issues", issues.len()))
    };
    outcome.with_detail("issues", issues)
}

/// Fails if any column is more than `threshold` percent null (default 95).
pub fn null_percentage(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let threshold = threshold_param(params, 95.0);
    if ds.is_empty() {
        return RuleOutcome::pass("no rows to check");
    }
    let mut high_null: BTreeMap<String, f64> = BTreeMap::new();
    for name in ds.column_names() {
        let Some(column) = ds.column(name) else {
            continue;
        };
        let nulls = column.filter(|v| v.is_null()).count();
        let pct = nulls as f64 / ds.len() as f64 * 100.0;
        if pct > threshold {
            high_null.insert(name.clone(), pct);
        }
    }

    let outcome = if high_null.is_empty() {
        RuleOutcome::pass("no excessively null columns")
    } else {
        RuleOutcome::fail(format!(
            "{} columns exceed {threshold}% nulls",
            high_null.len()
        ))
    };
    outcome
        .with_detail(
            "high_null_columns",
            serde_json::to_value(&high_null).unwrap_or_default(),
        )
        .with_detail("threshold_percent", threshold)
}

/// Fails if any string value carries leading or trailing whitespace.
pub fn string_trimmed(ds: &DataSet, _params: &RuleParams) -> RuleOutcome {
    let mut untrimmed: Vec<String> = Vec::new();
    for name in ds.column_names() {
        let Some(mut column) = ds.column(name) else {
            continue;
        };
        if column.any(|v| v.as_string().is_some_and(|s| s.trim() != s)) {
            untrimmed.push(name.clone());
        }
    }

    let outcome = if untrimmed.is_empty() {
        RuleOutcome::pass("all string columns trimmed")
    } else {
        RuleOutcome::fail(format!(
            "columns with untrimmed values: [{}]",
            untrimmed.join(", ")
        ))
    };
    outcome.with_detail("columns_with_whitespace", untrimmed)
}

// ---------------------------------------------------------------------------
// Parameterized rules
// ---------------------------------------------------------------------------

/// Fails if any listed column contains nulls. Details carry per-column counts.
pub fn no_nulls(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let columns = match columns_param(params) {
        Ok(c) => c,
        Err(outcome) => return outcome,
    };
    let mut null_counts: BTreeMap<String, usize> = BTreeMap::new();
    for name in &columns {
        let Some(column) = ds.column(name) else {
            return missing_column(name);
        };
        null_counts.insert(name.clone(), column.filter(|v| v.is_null()).count());
    }
    let offending: Vec<&String> = null_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(name, _)| name)
        .collect();

    let outcome = if offending.is_empty() {
        RuleOutcome::pass("no nulls in checked columns")
    } else {
        RuleOutcome::fail(format!(
            "null values found in: [{}]",
            offending
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    };
    outcome.with_detail(
        "null_counts",
        serde_json::to_value(&null_counts).unwrap_or_default(),
    )
}

/// Fails if the listed column combination has duplicate row-level combinations.
/// Details carry the number of duplicate groups.
pub fn unique_keys(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let columns = match columns_param(params) {
        Ok(c) => c,
        Err(outcome) => return outcome,
    };
    let mut indices = Vec::with_capacity(columns.len());
    for name in &columns {
        match ds.column_index(name) {
            Some(idx) => indices.push(idx),
            None => return missing_column(name),
        }
    }

    let mut occurrences: HashMap<String, usize> = HashMap::new();
    for row in ds.rows() {
        let key = row_key(&indices.iter().map(|&i| &row[i]).collect::<Vec<_>>());
        *occurrences.entry(key).or_insert(0) += 1;
    }
    let duplicate_groups = occurrences.values().filter(|&&count| count > 1).count();

    let outcome = if duplicate_groups == 0 {
        RuleOutcome::pass(format!("[{}] combinations are unique", columns.join(", ")))
    } else {
        RuleOutcome::fail(format!(
            "found {duplicate_groups} duplicate key combinations in [{}]",
            columns.join(", ")
        ))
    };
    outcome
        .with_detail("duplicate_groups", duplicate_groups)
        .with_detail("columns", columns)
}

/// Fails if any non-null value falls outside `[min, max]` (either bound
/// optional). Nulls are excluded from the check.
pub fn value_range(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let column = match column_param(params) {
        Ok(c) => c,
        Err(outcome) => return outcome,
    };
    let min = match number_param(params, "min") {
        Ok(v) => v,
        Err(outcome) => return outcome,
    };
    let max = match number_param(params, "max") {
        Ok(v) => v,
        Err(outcome) => return outcome,
    };
    let Some(values) = ds.column(&column) else {
        return missing_column(&column);
    };

    let mut offending = 0usize;
    let mut observed_min = f64::INFINITY;
    let mut observed_max = f64::NEG_INFINITY;
    for value in values {
        if value.is_null() {
            continue;
        }
        let Some(number) = value.as_float() else {
            return RuleOutcome::fail(format!(
                "value_range requires a numeric column, but '{column}' contains {}",
                value.type_name()
            ));
        };
        observed_min = observed_min.min(number);
        observed_max = observed_max.max(number);
        if min.is_some_and(|m| number < m) || max.is_some_and(|m| number > m) {
            offending += 1;
        }
    }

    let bounds = format!(
        "[{}, {}]",
        min.map_or("-inf".into(), |v| v.to_string()),
        max.map_or("+inf".into(), |v| v.to_string())
    );
    let mut outcome = if offending == 0 {
        RuleOutcome::pass(format!("all values of '{column}' within {bounds}"))
    } else {
        RuleOutcome::fail(format!(
            "{offending} values in '{column}' outside range {bounds}"
        ))
    };
    outcome = outcome.with_detail("out_of_range_count", offending);
    if observed_min.is_finite() {
        outcome = outcome
            .with_detail("observed_min", observed_min)
            .with_detail("observed_max", observed_max);
    }
    outcome
}

/// Fails if any non-null value is absent from the allow-set. Details list the
/// offending values, deduplicated.
pub fn allowed_values(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let column = match column_param(params) {
        Ok(c) => c,
        Err(outcome) => return outcome,
    };
    let Some(list) = params.get("values").and_then(|v| v.as_array()) else {
        return RuleOutcome::fail("missing required list parameter 'values'");
    };
    let allowed: BTreeSet<String> = list
        .iter()
        .map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        })
        .collect();
    let Some(values) = ds.column(&column) else {
        return missing_column(&column);
    };

    let mut invalid: BTreeSet<String> = BTreeSet::new();
    for value in values {
        if value.is_null() {
            continue;
        }
        let rendered = value.render();
        if !allowed.contains(&rendered) {
            invalid.insert(rendered);
        }
    }

    let invalid: Vec<String> = invalid.into_iter().collect();
    let outcome = if invalid.is_empty() {
        RuleOutcome::pass(format!("all values of '{column}' allowed"))
    } else {
        RuleOutcome::fail(format!(
            "invalid values in '{column}': [{}]",
            invalid.join(", ")
        ))
    };
    outcome
        .with_detail("invalid_values", invalid)
        .with_detail(
            "allowed_values",
            allowed.into_iter().collect::<Vec<String>>(),
        )
}

/// Fails if any non-null string value does not match the pattern. A non-string
/// column is a configuration failure, not a silent pass.
pub fn regex_match(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let column = match column_param(params) {
        Ok(c) => c,
        Err(outcome) => return outcome,
    };
    let Some(pattern) = params.get("pattern").and_then(|v| v.as_str()) else {
        return RuleOutcome::fail("missing required string parameter 'pattern'");
    };
    let regex = match Regex::new(pattern) {
        Ok(r) => r,
        Err(e) => return RuleOutcome::fail(format!("invalid pattern '{pattern}': {e}")),
    };
    let Some(values) = ds.column(&column) else {
        return missing_column(&column);
    };

    let mut mismatches: BTreeSet<String> = BTreeSet::new();
    for value in values {
        if value.is_null() {
            continue;
        }
        let Some(s) = value.as_string() else {
            return RuleOutcome::fail(format!(
                "regex_match requires a string column, but '{column}' contains {}",
                value.type_name()
            ));
        };
        if !regex.is_match(s) {
            mismatches.insert(s.to_string());
        }
    }

    let mismatches: Vec<String> = mismatches.into_iter().collect();
    let outcome = if mismatches.is_empty() {
        RuleOutcome::pass(format!("all values of '{column}' match '{pattern}'"))
    } else {
        RuleOutcome::fail(format!(
            "{} values in '{column}' do not match '{pattern}'",
            mismatches.len()
        ))
    };
    outcome
        .with_detail("mismatched_values", mismatches)
        .with_detail("pattern", pattern)
}

/// Fails if any non-null value sits more than `threshold` standard deviations
/// from the column mean (default 3). Columns with fewer than two values or
/// zero variance pass.
pub fn outliers_zscore(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let column = match column_param(params) {
        Ok(c) => c,
        Err(outcome) => return outcome,
    };
    let threshold = threshold_param(params, 3.0);
    let Some(values) = ds.column(&column) else {
        return missing_column(&column);
    };

    let mut numeric = Vec::new();
    for value in values {
        if value.is_null() {
            continue;
        }
        let Some(number) = value.as_float() else {
            return RuleOutcome::fail(format!(
                "outliers_zscore requires a numeric column, but '{column}' contains {}",
                value.type_name()
            ));
        };
        numeric.push(number);
    }
    if numeric.len() < 2 {
        return RuleOutcome::pass("too few values to measure spread")
            .with_detail("value_count", numeric.len());
    }

    let mean = numeric.iter().sum::<f64>() / numeric.len() as f64;
    let variance = numeric.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / numeric.len() as f64;
    let std = variance.sqrt();
    if std == 0.0 {
        return RuleOutcome::pass(format!("'{column}' has zero variance"))
            .with_detail("mean", mean);
    }

    let mut outliers = 0usize;
    let mut worst = 0.0f64;
    for v in &numeric {
        let z = (v - mean).abs() / std;
        worst = worst.max(z);
        if z > threshold {
            outliers += 1;
        }
    }

    let outcome = if outliers == 0 {
        RuleOutcome::pass(format!(
            "no values of '{column}' beyond {threshold} standard deviations"
        ))
    } else {
        RuleOutcome::fail(format!(
            "{outliers} values in '{column}' beyond {threshold} standard deviations"
        ))
    };
    outcome
        .with_detail("outlier_count", outliers)
        .with_detail("max_zscore", worst)
        .with_detail("mean", mean)
        .with_detail("std", std)
}

/// Fails if consecutive dates in the column (sorted) are further apart than
/// `max_gap_days` (default 1), or if any non-null value does not parse as a
/// date.
pub fn date_continuity(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let column = match column_param(params) {
        Ok(c) => c,
        Err(outcome) => return outcome,
    };
    let max_gap_days = match number_param(params, "max_gap_days") {
        Ok(v) => v.unwrap_or(1.0) as i64,
        Err(outcome) => return outcome,
    };
    let Some(values) = ds.column(&column) else {
        return missing_column(&column);
    };

    let mut dates = Vec::new();
    let mut unparsable = 0usize;
    for value in values {
        if value.is_null() {
            continue;
        }
        let Some(raw) = value.as_timestamp().or_else(|| value.as_string()) else {
            return RuleOutcome::fail(format!(
                "date_continuity requires a date column, but '{column}' contains {}",
                value.type_name()
            ));
        };
        match parse_date(raw) {
            Some(d) => dates.push(d),
            None => unparsable += 1,
        }
    }
    if unparsable > 0 {
        return RuleOutcome::fail(format!(
            "{unparsable} values in '{column}' are not parsable dates"
        ))
        .with_detail("unparsable_count", unparsable);
    }
    if dates.len() < 2 {
        return RuleOutcome::pass("too few dates to have gaps").with_detail("date_count", dates.len());
    }

    dates.sort_unstable();
    let mut gaps = 0usize;
    let mut widest = 0i64;
    for pair in dates.windows(2) {
        let days = (pair[1] - pair[0]).num_days();
        widest = widest.max(days);
        if days > max_gap_days {
            gaps += 1;
        }
    }

    let outcome = if gaps == 0 {
        RuleOutcome::pass(format!(
            "'{column}' is continuous within {max_gap_days}-day gaps"
        ))
    } else {
        RuleOutcome::fail(format!(
            "{gaps} gaps in '{column}' exceed {max_gap_days} days"
        ))
    };
    outcome
        .with_detail("gap_count", gaps)
        .with_detail("widest_gap_days", widest)
        .with_detail("max_gap_days", max_gap_days)
}

/// Evaluates a boolean expression against the dataset in the restricted
/// interpreter. Evaluation errors become the failure message.
pub fn expression(ds: &DataSet, params: &RuleParams) -> RuleOutcome {
    let Some(source) = params.get("expr").and_then(|v| v.as_str()) else {
        return RuleOutcome::fail("missing required string parameter 'expr'");
    };
    let outcome = match expr::evaluate(ds, source) {
        Ok(true) => RuleOutcome::pass("expression holds"),
        Ok(false) => RuleOutcome::fail("expression evaluated to false"),
        Err(e) => RuleOutcome::fail(format!("expression error: {e}")),
    };
    outcome.with_detail("expression", source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(pairs: serde_json::Value) -> RuleParams {
        serde_json::from_value(pairs).unwrap()
    }

    fn single_column(name: &str, values: Vec<DataValue>) -> DataSet {
        DataSet::from_rows(
            vec![name.to_string()],
            values.into_iter().map(|v| vec![v]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_not_empty() {
        let ds = single_column("a", vec![DataValue::Int(1)]);
        assert!(not_empty(&ds, &RuleParams::new()).passed);
        assert!(!not_empty(&DataSet::empty(), &RuleParams::new()).passed);
    }

    #[test]
    fn test_no_null_columns() {
        let ds = DataSet::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![DataValue::Int(1), DataValue::Null],
                vec![DataValue::Int(2), DataValue::Null],
            ],
        )
        .unwrap();
        let outcome = no_null_columns(&ds, &RuleParams::new());
        assert!(!outcome.passed);
        assert!(outcome.message.contains('b'));
    }

    #[test]
    fn test_duplicate_rows_threshold() {
        let ds = DataSet::from_rows(
            vec!["a".into()],
            vec![
                vec![DataValue::Int(1)],
                vec![DataValue::Int(1)],
                vec![DataValue::Int(2)],
            ],
        )
        .unwrap();
        // 1 of 3 rows duplicated = 33%, over the 1% default
        let outcome = duplicate_rows(&ds, &RuleParams::new());
        assert!(!outcome.passed);
        assert_eq!(outcome.details["duplicate_count"], json!(1));

        let outcome = duplicate_rows(&ds, &params(json!({ "threshold": 50.0 })));
        assert!(outcome.passed);
    }

    #[test]
    fn test_column_names_flags_spaces_case_and_specials() {
        let ds = DataSet::new(vec![
            "ok_name".into(),
            "bad name".into(),
            "Mixed".into(),
            "weird!".into(),
        ]);
        let outcome = column_names(&ds, &RuleParams::new());
        assert!(!outcome.passed);
        assert_eq!(outcome.details["issues"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_numeric_sanity_flags_infinity_and_constants() {
        let ds = DataSet::from_rows(
            vec!["x".into(), "c".into()],
            vec![
                vec![DataValue::Float(1.0), DataValue::Int(7)],
                vec![DataValue::Float(f64::INFINITY), DataValue::Int(7)],
            ],
        )
        .unwrap();
        let outcome = numeric_sanity(&ds, &RuleParams::new());
        assert!(!outcome.passed);
        let issues = outcome.details["column_issues"].as_object().unwrap();
        assert!(issues.contains_key("x"));
        assert!(issues.contains_key("c"));
    }

    #[test]
    fn test_date_sanity() {
        let ds = single_column(
            "when",
            vec![
                DataValue::Timestamp("2024-01-15".into()),
                DataValue::Timestamp("1850-01-01".into()),
                DataValue::Timestamp("not a date".into()),
            ],
        );
        let outcome = date_sanity(&ds, &RuleParams::new());
        assert!(!outcome.passed);
        assert_eq!(outcome.details["issues"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_null_percentage() {
        let mut values = vec![DataValue::Int(1)];
        values.extend(std::iter::repeat_n(DataValue::Null, 99));
        let ds = single_column("mostly_null", values);
        assert!(!null_percentage(&ds, &RuleParams::new()).passed);

        let ds = single_column("fine", vec![DataValue::Int(1), DataValue::Null]);
        assert!(null_percentage(&ds, &RuleParams::new()).passed);
    }

    #[test]
    fn test_string_trimmed() {
        let ds = single_column("s", vec![DataValue::from(" padded ")]);
        let outcome = string_trimmed(&ds, &RuleParams::new());
        assert!(!outcome.passed);
        assert_eq!(outcome.details["columns_with_whitespace"], json!(["s"]));
    }

    #[test]
    fn test_no_nulls_counts_per_column() {
        let ds = DataSet::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![DataValue::Int(1), DataValue::Null],
                vec![DataValue::Int(2), DataValue::Int(3)],
            ],
        )
        .unwrap();
        let outcome = no_nulls(&ds, &params(json!({ "columns": ["a", "b"] })));
        assert!(!outcome.passed);
        assert_eq!(outcome.details["null_counts"], json!({ "a": 0, "b": 1 }));
    }

    #[test]
    fn test_no_nulls_missing_column_names_it() {
        let ds = single_column("a", vec![DataValue::Int(1)]);
        let outcome = no_nulls(&ds, &params(json!({ "columns": ["ghost"] })));
        assert!(!outcome.passed);
        assert!(outcome.message.contains("ghost"));
    }

    #[test]
    fn test_unique_keys_one_duplicate_group() {
        let ds = single_column(
            "a",
            vec![DataValue::Int(1), DataValue::Int(1), DataValue::Int(2)],
        );
        let outcome = unique_keys(&ds, &params(json!({ "columns": ["a"] })));
        assert!(!outcome.passed);
        assert_eq!(outcome.details["duplicate_groups"], json!(1));
    }

    #[test]
    fn test_unique_keys_composite_pass() {
        let ds = DataSet::from_rows(
            vec!["u".into(), "e".into()],
            vec![
                vec![DataValue::from("u1"), DataValue::from("e1")],
                vec![DataValue::from("u1"), DataValue::from("e2")],
            ],
        )
        .unwrap();
        let outcome = unique_keys(&ds, &params(json!({ "columns": ["u", "e"] })));
        assert!(outcome.passed);
    }

    #[test]
    fn test_value_range_nulls_excluded() {
        let ds = single_column(
            "v",
            vec![
                DataValue::Int(5),
                DataValue::Int(-1),
                DataValue::Int(11),
                DataValue::Null,
            ],
        );
        let outcome = value_range(&ds, &params(json!({ "column": "v", "min": 0, "max": 10 })));
        assert!(!outcome.passed);
        assert_eq!(outcome.details["out_of_range_count"], json!(2));
        assert_eq!(outcome.details["observed_min"], json!(-1.0));
        assert_eq!(outcome.details["observed_max"], json!(11.0));
    }

    #[test]
    fn test_value_range_open_bounds() {
        let ds = single_column("v", vec![DataValue::Int(100)]);
        let outcome = value_range(&ds, &params(json!({ "column": "v", "min": 0 })));
        assert!(outcome.passed);
    }

    #[test]
    fn test_value_range_non_numeric_is_config_error() {
        let ds = single_column("v", vec![DataValue::from("abc")]);
        let outcome = value_range(&ds, &params(json!({ "column": "v", "min": 0 })));
        assert!(!outcome.passed);
        assert!(outcome.message.contains("string"));
    }

    #[test]
    fn test_allowed_values_dedupes_offenders() {
        let ds = single_column(
            "cat",
            vec![
                DataValue::from("A"),
                DataValue::from("X"),
                DataValue::from("X"),
                DataValue::Null,
            ],
        );
        let outcome = allowed_values(&ds, &params(json!({ "column": "cat", "values": ["A", "B"] })));
        assert!(!outcome.passed);
        assert_eq!(outcome.details["invalid_values"], json!(["X"]));
    }

    #[test]
    fn test_regex_match() {
        let ds = single_column(
            "url",
            vec![DataValue::from("https://example.com"), DataValue::from("nope")],
        );
        let outcome = regex_match(
            &ds,
            &params(json!({ "column": "url", "pattern": "^https?://" })),
        );
        assert!(!outcome.passed);
        assert_eq!(outcome.details["mismatched_values"], json!(["nope"]));
    }

    #[test]
    fn test_regex_match_non_string_is_config_error() {
        let ds = single_column("n", vec![DataValue::Int(5)]);
        let outcome = regex_match(&ds, &params(json!({ "column": "n", "pattern": "x" })));
        assert!(!outcome.passed);
        assert!(outcome.message.contains("int64"));
    }

    #[test]
    fn test_regex_match_invalid_pattern() {
        let ds = single_column("s", vec![DataValue::from("x")]);
        let outcome = regex_match(&ds, &params(json!({ "column": "s", "pattern": "[invalid(" })));
        assert!(!outcome.passed);
        assert!(outcome.message.contains("invalid pattern"));
    }

    #[test]
    fn test_outliers_zscore_flags_the_spike() {
        let mut values: Vec<DataValue> = (0..20).map(|i| DataValue::Float(10.0 + (i % 3) as f64)).collect();
        values.push(DataValue::Float(1000.0));
        let ds = single_column("v", values);
        let outcome = outliers_zscore(&ds, &params(json!({ "column": "v" })));
        assert!(!outcome.passed);
        assert_eq!(outcome.details["outlier_count"], json!(1));
    }

    #[test]
    fn test_outliers_zscore_constant_and_tiny_columns_pass() {
        let ds = single_column("v", vec![DataValue::Int(7), DataValue::Int(7), DataValue::Int(7)]);
        assert!(outliers_zscore(&ds, &params(json!({ "column": "v" }))).passed);

        let ds = single_column("v", vec![DataValue::Int(7)]);
        assert!(outliers_zscore(&ds, &params(json!({ "column": "v" }))).passed);
    }

    #[test]
    fn test_outliers_zscore_non_numeric_is_config_error() {
        let ds = single_column("v", vec![DataValue::from("abc"), DataValue::from("def")]);
        let outcome = outliers_zscore(&ds, &params(json!({ "column": "v" })));
        assert!(!outcome.passed);
        assert!(outcome.message.contains("string"));
    }

    #[test]
    fn test_date_continuity_detects_the_gap() {
        let ds = single_column(
            "d",
            vec![
                DataValue::Timestamp("2024-01-01".into()),
                DataValue::Timestamp("2024-01-02".into()),
                DataValue::Timestamp("2024-01-10".into()),
            ],
        );
        let outcome = date_continuity(&ds, &params(json!({ "column": "d" })));
        assert!(!outcome.passed);
        assert_eq!(outcome.details["gap_count"], json!(1));
        assert_eq!(outcome.details["widest_gap_days"], json!(8));

        let outcome = date_continuity(&ds, &params(json!({ "column": "d", "max_gap_days": 10 })));
        assert!(outcome.passed);
    }

    #[test]
    fn test_date_continuity_order_independent() {
        let ds = single_column(
            "d",
            vec![
                DataValue::Timestamp("2024-01-03".into()),
                DataValue::Timestamp("2024-01-01".into()),
                DataValue::Timestamp("2024-01-02".into()),
            ],
        );
        assert!(date_continuity(&ds, &params(json!({ "column": "d" }))).passed);
    }

    #[test]
    fn test_date_continuity_unparsable_fails() {
        let ds = single_column(
            "d",
            vec![
                DataValue::Timestamp("2024-01-01".into()),
                DataValue::Timestamp("someday".into()),
            ],
        );
        let outcome = date_continuity(&ds, &params(json!({ "column": "d" })));
        assert!(!outcome.passed);
        assert!(outcome.message.contains("not parsable"));
    }

    #[test]
    fn test_expression_rule() {
        let ds = single_column("year", vec![DataValue::Int(1999), DataValue::Int(2001)]);
        let outcome = expression(
            &ds,
            &params(json!({ "expr": "(df['year'] >= 2000).all()" })),
        );
        assert!(!outcome.passed);

        let outcome = expression(
            &ds,
            &params(json!({ "expr": "(df['year'] >= 1990).all()" })),
        );
        assert!(outcome.passed);
    }

    #[test]
    fn test_expression_malformed_reports_error() {
        let ds = single_column("year", vec![DataValue::Int(2001)]);
        let outcome = expression(&ds, &params(json!({ "expr": "df['year'] >=" })));
        assert!(!outcome.passed);
        assert!(outcome.message.contains("expression error"));
    }
}
