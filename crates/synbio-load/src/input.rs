//! Reading record trees from JSON files.
//!
//! A file holds either one record tree or an array of them. Each tree is
//! written in its own transaction.

use std::fs;
use std::path::{Path, PathBuf};

use synbio_core::Record;

use crate::error::{LoadError, Result};

/// A record tree and where it came from, for log lines and error reports.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedTree {
    /// `path` for a single-tree file, `path#i` for the i-th tree of an array.
    pub source: String,
    pub record: Record,
}

/// Read every tree in `path`.
pub fn read_trees(path: &Path) -> Result<Vec<SourcedTree>> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: display.clone(),
        source,
    })?;
    parse_trees(&text, &display)
}

/// Read every tree in every file, in argument order.
pub fn read_all(paths: &[PathBuf]) -> Result<Vec<SourcedTree>> {
    let mut trees = Vec::new();
    for path in paths {
        trees.extend(read_trees(path)?);
    }
    Ok(trees)
}

fn parse_trees(text: &str, source: &str) -> Result<Vec<SourcedTree>> {
    let parse_err = |e| LoadError::Parse {
        path: source.to_string(),
        source: e,
    };

    let value: serde_json::Value = serde_json::from_str(text).map_err(parse_err)?;
    if value.is_array() {
        let records: Vec<Record> = serde_json::from_value(value).map_err(parse_err)?;
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(i, record)| SourcedTree {
                source: format!("{source}#{i}"),
                record,
            })
            .collect())
    } else {
        let record: Record = serde_json::from_value(value).map_err(parse_err)?;
        Ok(vec![SourcedTree {
            source: source.to_string(),
            record,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synbio_core::Scalar;

    #[test]
    fn test_single_tree() {
        let trees = parse_trees(
            r#"{"label": "Plate", "properties": {"id": "Plate 1"}}"#,
            "plate.json",
        )
        .unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].source, "plate.json");
        assert_eq!(trees[0].record.label, "Plate");
    }

    #[test]
    fn test_array_of_trees() {
        let trees = parse_trees(
            r#"[
                {"label": "Experiment", "properties": {"exp_id": "Exp 1"}},
                {"label": "Person", "properties": {"name": "Neil"}}
            ]"#,
            "metadata.json",
        )
        .unwrap();
        let sources: Vec<&str> = trees.iter().map(|t| t.source.as_str()).collect();
        assert_eq!(sources, vec!["metadata.json#0", "metadata.json#1"]);
        assert_eq!(
            trees[1].record.property("name"),
            Some(&Scalar::from("Neil"))
        );
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse_trees(r#"{"properties": {}}"#, "broken.json").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_read_all_reads_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        fs::write(&first, r#"{"label": "Project", "properties": {"id": "Project 1"}}"#).unwrap();
        fs::write(&second, r#"[{"label": "Plate", "properties": {"id": "Plate 1"}}]"#).unwrap();

        let trees = read_all(&[first, second]).unwrap();
        let labels: Vec<&str> = trees.iter().map(|t| t.record.label.as_str()).collect();
        assert_eq!(labels, vec!["Project", "Plate"]);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = read_trees(Path::new("/nonexistent/trees.json")).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }
}
