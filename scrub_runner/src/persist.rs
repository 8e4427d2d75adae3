//! Atomic persistence of cleaned datasets.
//!
//! Output lands at `<output_dir>/<cleaner>/cleaned.csv`, written to a
//! temporary file in the same directory and renamed into place so a crash
//! mid-write never leaves a partial file at the final path.

use scrub_core::{DataSet, StageError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const OUTPUT_FILE: &str = "cleaned.csv";

/// Final output path for one cleaner.
pub fn output_path(output_dir: &Path, cleaner: &str) -> PathBuf {
    output_dir.join(cleaner).join(OUTPUT_FILE)
}

/// Writes `dataset` as CSV to the cleaner's output path, atomically.
pub fn write_atomic(
    output_dir: &Path,
    cleaner: &str,
    dataset: &DataSet,
) -> Result<PathBuf, StageError> {
    let final_path = output_path(output_dir, cleaner);
    let parent = final_path
        .parent()
        .ok_or_else(|| StageError::failed("output path has no parent directory"))?;
    fs::create_dir_all(parent)?;

    let tmp_path = parent.join(format!(".{OUTPUT_FILE}.tmp"));
    {
        let mut file = fs::File::create(&tmp_path)?;
        write_csv(&mut file, dataset)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, &final_path)?;

    info!(cleaner, path = %final_path.display(), rows = dataset.len(), "persisted cleaned output");
    Ok(final_path)
}

fn write_csv(out: &mut impl Write, dataset: &DataSet) -> std::io::Result<()> {
    write_record(out, dataset.column_names().iter().map(String::as_str))?;
    for row in dataset.rows() {
        write_record(out, row.iter().map(|v| v.render()).collect::<Vec<_>>().iter().map(String::as_str))?;
    }
    Ok(())
}

fn write_record<'a>(
    out: &mut impl Write,
    fields: impl Iterator<Item = &'a str>,
) -> std::io::Result<()> {
    let mut first = true;
    for field in fields {
        if !first {
            out.write_all(b",")?;
        }
        first = false;
        if field.contains([',', '"', '\n', '\r']) {
            out.write_all(b"\"")?;
            out.write_all(field.replace('"', "\"\"").as_bytes())?;
            out.write_all(b"\"")?;
        } else {
            out.write_all(field.as_bytes())?;
        }
    }
    out.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scrub_core::DataValue;

    fn dataset() -> DataSet {
        DataSet::from_rows(
            vec!["name".into(), "value".into()],
            vec![
                vec!["plain".into(), DataValue::Int(1)],
                vec!["with,comma".into(), DataValue::Int(2)],
                vec!["with \"quotes\"".into(), DataValue::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_write_atomic_layout_and_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_atomic(dir.path(), "demo", &dataset()).unwrap();

        assert_eq!(path, dir.path().join("demo").join("cleaned.csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "name,value\nplain,1\n\"with,comma\",2\n\"with \"\"quotes\"\"\",\n"
        );
    }

    #[test]
    fn test_no_temporary_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(dir.path(), "demo", &dataset()).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("demo"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["cleaned.csv"]);
    }

    #[test]
    fn test_rewrite_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(dir.path(), "demo", &dataset()).unwrap();

        let smaller = DataSet::from_rows(
            vec!["name".into()],
            vec![vec!["only".into()]],
        )
        .unwrap();
        let path = write_atomic(dir.path(), "demo", &smaller).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "name\nonly\n");
    }
}
