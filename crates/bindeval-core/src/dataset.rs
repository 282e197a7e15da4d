//! Prediction and group-lookup tables.
//!
//! Front ends load evaluation data from two kinds of CSV file:
//!
//! | File | Required columns | Meaning |
//! |------|------------------|---------|
//! | Prediction table | `key`, `pred`, `pk` | one row per sample: id, predicted value, measured value |
//! | Group lookup | `system_id`, `group_id` | maps a sample id to the group it belongs to |
//!
//! Other columns are ignored. The group lookup is left-joined onto the
//! prediction table by key: samples without a lookup entry (or with an
//! empty `group_id`) are ungrouped rather than an error.

use crate::config::{
    GROUP_ID_COLUMN, KEY_COLUMN, PREDICTION_COLUMN, SYSTEM_ID_COLUMN, TRUTH_COLUMN,
};
use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct PredictionRow {
    key: String,
    pred: f64,
    pk: f64,
}

#[derive(Debug, Deserialize)]
struct GroupRow {
    system_id: String,
    group_id: Option<String>,
}

/// Aligned sample ids, predictions and measured values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionTable {
    pub keys: Vec<String>,
    pub predictions: Vec<f64>,
    pub truths: Vec<f64>,
}

impl PredictionTable {
    /// Builds a table from aligned columns.
    pub fn from_columns(
        keys: Vec<String>,
        predictions: Vec<f64>,
        truths: Vec<f64>,
    ) -> Result<Self, DatasetError> {
        if keys.len() != predictions.len() || keys.len() != truths.len() {
            return Err(DatasetError::Misaligned(format!(
                "{} keys, {} predictions, {} truths",
                keys.len(),
                predictions.len(),
                truths.len()
            )));
        }
        Ok(Self {
            keys,
            predictions,
            truths,
        })
    }

    /// Loads a prediction table from CSV.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| DatasetError::io(path, e))?;
        require_columns(
            path,
            &mut reader,
            &[KEY_COLUMN, PREDICTION_COLUMN, TRUTH_COLUMN],
        )?;

        let mut table = Self {
            keys: Vec::new(),
            predictions: Vec::new(),
            truths: Vec::new(),
        };
        for row in reader.deserialize::<PredictionRow>() {
            let row = row.map_err(|e| DatasetError::parse(path, e))?;
            table.keys.push(row.key);
            table.predictions.push(row.pred);
            table.truths.push(row.pk);
        }

        debug!(path = %path.display(), rows = table.len(), "Loaded prediction table");
        Ok(table)
    }

    /// Writes the table as CSV with `key,pred,pk` columns.
    ///
    /// Values are written at full precision.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path).map_err(|e| DatasetError::io(path, e))?;
        for i in 0..self.len() {
            writer
                .serialize(PredictionRow {
                    key: self.keys[i].clone(),
                    pred: self.predictions[i],
                    pk: self.truths[i],
                })
                .map_err(|e| DatasetError::io(path, e))?;
        }
        writer.flush().map_err(|e| DatasetError::io(path, e))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Group label for every row (left join on key).
    pub fn groups(&self, lookup: &GroupLookup) -> Vec<Option<String>> {
        let groups: Vec<Option<String>> = self
            .keys
            .iter()
            .map(|k| lookup.group_of(k).map(str::to_owned))
            .collect();

        let unmatched = groups.iter().filter(|g| g.is_none()).count();
        if unmatched > 0 {
            warn!(
                unmatched,
                rows = self.len(),
                "Rows without a group label are excluded from stratified resampling"
            );
        }
        groups
    }
}

/// Mapping from sample id to group id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupLookup {
    groups: HashMap<String, String>,
}

impl GroupLookup {
    /// Loads a lookup table from CSV.
    ///
    /// # Errors
    ///
    /// [`DatasetError::DuplicateKey`] if a `system_id` appears twice, since
    /// the join would otherwise be ambiguous.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| DatasetError::io(path, e))?;
        require_columns(path, &mut reader, &[SYSTEM_ID_COLUMN, GROUP_ID_COLUMN])?;

        let mut seen = HashSet::new();
        let mut groups = HashMap::new();
        for row in reader.deserialize::<GroupRow>() {
            let row = row.map_err(|e| DatasetError::parse(path, e))?;
            if !seen.insert(row.system_id.clone()) {
                return Err(DatasetError::DuplicateKey {
                    path: path.display().to_string(),
                    key: row.system_id,
                });
            }
            if let Some(group) = row.group_id.filter(|g| !g.is_empty()) {
                groups.insert(row.system_id, group);
            }
        }

        debug!(path = %path.display(), entries = groups.len(), "Loaded group lookup");
        Ok(Self { groups })
    }

    pub fn group_of(&self, system_id: &str) -> Option<&str> {
        self.groups.get(system_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn require_columns<R: std::io::Read>(
    path: &Path,
    reader: &mut csv::Reader<R>,
    required: &[&str],
) -> Result<(), DatasetError> {
    let headers = reader.headers().map_err(|e| DatasetError::parse(path, e))?;
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DatasetError::parse(
                path,
                format!("missing required column '{}'", column),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_prediction_table_ignores_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "preds.csv",
            "key,extra,pred,pk\n1abc,x,6.5,7.0\n2xyz,y,4.25,3.5\n",
        );
        let table = PredictionTable::from_csv(&path).unwrap();
        assert_eq!(table.keys, vec!["1abc", "2xyz"]);
        assert_eq!(table.predictions, vec![6.5, 4.25]);
        assert_eq!(table.truths, vec![7.0, 3.5]);
    }

    #[test]
    fn test_missing_column_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "preds.csv", "key,pred\na,1.0\n");
        let err = PredictionTable::from_csv(&path).unwrap_err();
        assert!(err.to_string().contains("missing required column 'pk'"));
    }

    #[test]
    fn test_non_numeric_value_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "preds.csv", "key,pred,pk\na,high,1.0\n");
        let err = PredictionTable::from_csv(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_reported() {
        let dir = TempDir::new().unwrap();
        let err = PredictionTable::from_csv(dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_left_join_leaves_unmatched_ungrouped() {
        let dir = TempDir::new().unwrap();
        let preds = write_file(&dir, "p.csv", "key,pred,pk\na,1,1\nb,2,2\nc,3,3\n");
        let lookup = write_file(
            &dir,
            "g.csv",
            "system_id,group_id,note\na,g1,\nc,g2,\nz,g3,\n",
        );

        let table = PredictionTable::from_csv(&preds).unwrap();
        let lookup = GroupLookup::from_csv(&lookup).unwrap();
        assert_eq!(
            table.groups(&lookup),
            vec![Some("g1".to_string()), None, Some("g2".to_string())]
        );
    }

    #[test]
    fn test_empty_group_id_is_ungrouped() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "g.csv", "system_id,group_id\na,\nb,g1\n");
        let lookup = GroupLookup::from_csv(&path).unwrap();
        assert_eq!(lookup.group_of("a"), None);
        assert_eq!(lookup.group_of("b"), Some("g1"));
    }

    #[test]
    fn test_duplicate_system_id_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "g.csv", "system_id,group_id\na,g1\na,g2\n");
        let err = GroupLookup::from_csv(&path).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateKey { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_write_then_read_preserves_precision() {
        let dir = TempDir::new().unwrap();
        let table = PredictionTable::from_columns(
            vec!["a".into(), "b".into()],
            vec![0.1 + 0.2, 1.0 / 3.0],
            vec![5.0, 6.125],
        )
        .unwrap();
        let path = dir.path().join("out.csv");
        table.write_csv(&path).unwrap();
        assert_eq!(PredictionTable::from_csv(&path).unwrap(), table);
    }

    #[test]
    fn test_from_columns_rejects_misaligned() {
        let err = PredictionTable::from_columns(vec!["a".into()], vec![1.0, 2.0], vec![1.0])
            .unwrap_err();
        assert!(matches!(err, DatasetError::Misaligned(_)));
    }
}
