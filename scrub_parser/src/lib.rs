//! # Scrub Parser
//!
//! Parses declarative rule documents for cleaner directories.
//!
//! A rule document is a `rules:` sequence so declared rules keep their
//! document order through parsing and validation:
//!
//! ```yaml
//! rules:
//!   - name: year_known
//!     type: no_nulls
//!     params:
//!       columns: [year]
//!     severity: error
//!   - name: value_bounds
//!     type: value_range
//!     params:
//!       column: value
//!       min: -100
//!       max: 200
//!     severity: warning
//! ```
//!
//! Severity defaults to `error` when omitted. The same document shape is
//! accepted in TOML as `[[rules]]` tables.

use scrub_core::RuleSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while locating or parsing a rule document.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("TOML parsing error: {0}")]
    Toml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported rule document format: {0}")]
    UnsupportedFormat(String),

    #[error("file has no usable extension: {0}")]
    InvalidExtension(PathBuf),
}

pub type Result<T> = std::result::Result<T, ParserError>;

/// A parsed rule document: the declared rules in document order.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl RuleDocument {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// Parses a rule document from YAML.
pub fn parse_yaml(content: &str) -> Result<RuleDocument> {
    Ok(serde_yaml_ng::from_str(content)?)
}

/// Parses a rule document from TOML.
pub fn parse_toml(content: &str) -> Result<RuleDocument> {
    toml::from_str(content).map_err(|e| ParserError::Toml(e.to_string()))
}

/// Parses a rule document file, dispatching on extension.
pub fn parse_file(path: &Path) -> Result<RuleDocument> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ParserError::InvalidExtension(path.to_path_buf()))?;
    let parse: fn(&str) -> Result<RuleDocument> = match extension.to_lowercase().as_str() {
        "yaml" | "yml" => parse_yaml,
        "toml" => parse_toml,
        other => return Err(ParserError::UnsupportedFormat(other.to_string())),
    };
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

const DOCUMENT_NAMES: &[&str] = &["rules.yaml", "rules.yml", "rules.toml"];

/// Loads the rule document for one cleaner directory, probing the well-known
/// file names in order. `Ok(None)` means the cleaner declares no rules, which
/// is not an error; a present but malformed document is.
pub fn load_for_cleaner(dir: &Path) -> Result<Option<RuleDocument>> {
    for name in DOCUMENT_NAMES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return parse_file(&candidate).map(Some);
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scrub_core::Severity;
    use serde_json::json;

    #[test]
    fn test_parse_yaml_preserves_order_and_params() {
        let doc = parse_yaml(
            r#"
rules:
  - name: year_known
    type: no_nulls
    params:
      columns: [year]
    severity: error
  - name: value_bounds
    type: value_range
    params:
      column: value
      min: -100
      max: 200
    severity: warning
"#,
        )
        .unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.rules[0].name, "year_known");
        assert_eq!(doc.rules[0].rule_type, "no_nulls");
        assert_eq!(doc.rules[0].severity, Severity::Error);
        assert_eq!(doc.rules[0].params["columns"], json!(["year"]));

        assert_eq!(doc.rules[1].name, "value_bounds");
        assert_eq!(doc.rules[1].severity, Severity::Warning);
        assert_eq!(doc.rules[1].params["min"], json!(-100));
    }

    #[test]
    fn test_severity_defaults_to_error() {
        let doc = parse_yaml(
            r#"
rules:
  - name: cat_ok
    type: allowed_values
    params:
      column: category
      values: [A, B, C]
"#,
        )
        .unwrap();
        assert_eq!(doc.rules[0].severity, Severity::Error);
    }

    #[test]
    fn test_parse_toml() {
        let doc = parse_toml(
            r#"
[[rules]]
name = "url_shape"
type = "regex_match"
severity = "warning"

[rules.params]
column = "url"
pattern = "^https?://"
"#,
        )
        .unwrap();

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.rules[0].rule_type, "regex_match");
        assert_eq!(doc.rules[0].severity, Severity::Warning);
        assert_eq!(doc.rules[0].params["pattern"], json!("^https?://"));
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let result = parse_yaml("rules:\n  - name: [unclosed");
        assert!(matches!(result, Err(ParserError::Yaml(_))));
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        // a rule without a type tag cannot be dispatched
        let result = parse_yaml("rules:\n  - name: orphan\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = parse_file(Path::new("rules.ini"));
        assert!(matches!(result, Err(ParserError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_no_extension() {
        let result = parse_file(Path::new("rules"));
        assert!(matches!(result, Err(ParserError::InvalidExtension(_))));
    }

    #[test]
    fn test_empty_rules_document() {
        let doc = parse_yaml("rules: []").unwrap();
        assert!(doc.is_empty());
    }
}
