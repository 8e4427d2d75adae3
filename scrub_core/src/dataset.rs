//! Tabular dataset representation.
//!
//! This module provides the in-memory form of a cleaned dataset: an ordered
//! set of named columns and typed rows. Column order is part of the contract
//! between a cleaner and the validation engine.

use thiserror::Error;

/// A value in a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// Null/missing value
    Null,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Timestamp value (ISO 8601 string)
    Timestamp(String),
}

impl DataValue {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::Null => "null",
            DataValue::String(_) => "string",
            DataValue::Int(_) => "int64",
            DataValue::Float(_) => "float64",
            DataValue::Bool(_) => "boolean",
            DataValue::Timestamp(_) => "timestamp",
        }
    }

    /// Attempts to get this value as a string.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DataValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a float. Integers widen losslessly enough
    /// for range checks.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            DataValue::Float(f) => Some(*f),
            DataValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempts to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get this value as a timestamp string.
    pub fn as_timestamp(&self) -> Option<&str> {
        match self {
            DataValue::Timestamp(s) => Some(s),
            _ => None,
        }
    }

    /// Display form used in messages and persisted output. Null renders empty.
    pub fn render(&self) -> String {
        match self {
            DataValue::Null => String::new(),
            DataValue::String(s) => s.clone(),
            DataValue::Int(i) => i.to_string(),
            DataValue::Float(f) => f.to_string(),
            DataValue::Bool(b) => b.to_string(),
            DataValue::Timestamp(ts) => ts.clone(),
        }
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::String(s)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::String(s.to_string())
    }
}

impl From<i64> for DataValue {
    fn from(i: i64) -> Self {
        DataValue::Int(i)
    }
}

impl From<f64> for DataValue {
    fn from(f: f64) -> Self {
        DataValue::Float(f)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Bool(b)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => DataValue::Null,
        }
    }
}

/// A row does not match the dataset's column arity.
#[derive(Debug, Error)]
#[error("row has {got} values but dataset has {expected} columns")]
pub struct RowShapeError {
    pub expected: usize,
    pub got: usize,
}

/// A dataset: ordered columns and typed rows.
///
/// Validation only ever takes `&DataSet`; nothing downstream of a cleaner's
/// transform stage mutates the data.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    columns: Vec<String>,
    rows: Vec<Vec<DataValue>>,
}

impl DataSet {
    /// Creates an empty dataset with no columns.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Creates a dataset with the given column names and no rows.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a dataset from column names and rows, checking row arity.
    pub fn from_rows(
        columns: Vec<String>,
        rows: Vec<Vec<DataValue>>,
    ) -> Result<Self, RowShapeError> {
        let mut ds = Self::new(columns);
        for row in rows {
            ds.push_row(row)?;
        }
        Ok(ds)
    }

    /// Appends a row, checking it matches the column arity.
    pub fn push_row(&mut self, row: Vec<DataValue>) -> Result<(), RowShapeError> {
        if row.len() != self.columns.len() {
            return Err(RowShapeError {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Returns the positional index of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterates over the values of one column, or `None` if it doesn't exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &DataValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Iterates over the rows.
    pub fn rows(&self) -> impl Iterator<Item = &[DataValue]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Gets a single value by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&DataValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }
}

impl Default for DataSet {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_value_types() {
        assert_eq!(DataValue::Null.type_name(), "null");
        assert_eq!(DataValue::String("test".into()).type_name(), "string");
        assert_eq!(DataValue::Int(42).type_name(), "int64");
        assert_eq!(DataValue::Float(3.5).type_name(), "float64");
        assert_eq!(DataValue::Bool(true).type_name(), "boolean");
        assert_eq!(
            DataValue::Timestamp("2024-01-01".into()).type_name(),
            "timestamp"
        );
    }

    #[test]
    fn test_data_value_conversions() {
        let val = DataValue::String("hello".into());
        assert_eq!(val.as_string(), Some("hello"));
        assert_eq!(val.as_int(), None);

        let val = DataValue::Int(42);
        assert_eq!(val.as_int(), Some(42));
        assert_eq!(val.as_float(), Some(42.0));
        assert_eq!(val.as_string(), None);

        let val: DataValue = None::<i64>.into();
        assert!(val.is_null());
    }

    #[test]
    fn test_dataset_operations() {
        let mut dataset = DataSet::new(vec!["id".into(), "name".into()]);
        assert!(dataset.is_empty());

        dataset
            .push_row(vec![DataValue::Int(1), DataValue::from("alice")])
            .unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.column_names(), &["id", "name"]);
        assert_eq!(dataset.value(0, "id"), Some(&DataValue::Int(1)));
        assert_eq!(dataset.value(0, "missing"), None);
    }

    #[test]
    fn test_push_row_arity_checked() {
        let mut dataset = DataSet::new(vec!["id".into(), "name".into()]);
        let err = dataset.push_row(vec![DataValue::Int(1)]).unwrap_err();
        assert_eq!(err.expected, 2);
        assert_eq!(err.got, 1);
    }

    #[test]
    fn test_column_iteration() {
        let dataset = DataSet::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![DataValue::Int(1), DataValue::Int(10)],
                vec![DataValue::Int(2), DataValue::Int(20)],
            ],
        )
        .unwrap();

        let b: Vec<i64> = dataset
            .column("b")
            .unwrap()
            .filter_map(DataValue::as_int)
            .collect();
        assert_eq!(b, vec![10, 20]);
        assert!(dataset.column("c").is_none());
    }

    #[test]
    fn test_column_order_preserved() {
        let dataset = DataSet::new(vec!["z".into(), "a".into(), "m".into()]);
        assert_eq!(dataset.column_names(), &["z", "a", "m"]);
        assert_eq!(dataset.column_index("m"), Some(2));
    }
}
