//! Ensemble construction by averaging model predictions.

use crate::dataset::PredictionTable;
use crate::error::DatasetError;
use tracing::info;

/// Averages predictions across models that scored the same samples.
///
/// Keys and truths are taken from the first table; every other table must
/// list the same keys in the same order. The ensemble prediction for each
/// sample is the arithmetic mean of the models' predictions.
///
/// # Errors
///
/// - [`DatasetError::NoTables`] if `tables` is empty
/// - [`DatasetError::Misaligned`] if a table has different keys or order
pub fn average_predictions(tables: &[PredictionTable]) -> Result<PredictionTable, DatasetError> {
    let first = tables.first().ok_or(DatasetError::NoTables)?;

    for (model, table) in tables.iter().enumerate().skip(1) {
        if table.len() != first.len() {
            return Err(DatasetError::Misaligned(format!(
                "model {} has {} rows, expected {}",
                model,
                table.len(),
                first.len()
            )));
        }
        if let Some(row) = table.keys.iter().zip(&first.keys).position(|(a, b)| a != b) {
            return Err(DatasetError::Misaligned(format!(
                "model {} row {} has key {:?}, expected {:?}",
                model, row, table.keys[row], first.keys[row]
            )));
        }
    }

    let n_models = tables.len() as f64;
    let predictions = (0..first.len())
        .map(|row| tables.iter().map(|t| t.predictions[row]).sum::<f64>() / n_models)
        .collect();

    info!(models = tables.len(), rows = first.len(), "Averaged ensemble predictions");

    PredictionTable::from_columns(first.keys.clone(), predictions, first.truths.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(keys: &[&str], preds: &[f64]) -> PredictionTable {
        PredictionTable::from_columns(
            keys.iter().map(|k| k.to_string()).collect(),
            preds.to_vec(),
            vec![5.0; keys.len()],
        )
        .unwrap()
    }

    #[test]
    fn test_average_of_three_models() {
        let tables = vec![
            table(&["a", "b"], &[1.0, 4.0]),
            table(&["a", "b"], &[2.0, 5.0]),
            table(&["a", "b"], &[3.0, 9.0]),
        ];
        let ensemble = average_predictions(&tables).unwrap();
        assert_eq!(ensemble.keys, vec!["a", "b"]);
        assert_eq!(ensemble.predictions, vec![2.0, 6.0]);
        assert_eq!(ensemble.truths, vec![5.0, 5.0]);
    }

    #[test]
    fn test_single_model_is_identity() {
        let only = table(&["a", "b", "c"], &[0.5, 1.5, 2.5]);
        let ensemble = average_predictions(std::slice::from_ref(&only)).unwrap();
        assert_eq!(ensemble, only);
    }

    #[test]
    fn test_no_tables_rejected() {
        assert_eq!(average_predictions(&[]).unwrap_err(), DatasetError::NoTables);
    }

    #[test]
    fn test_key_order_mismatch_rejected() {
        let tables = vec![table(&["a", "b"], &[1.0, 2.0]), table(&["b", "a"], &[2.0, 1.0])];
        let err = average_predictions(&tables).unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn test_row_count_mismatch_rejected() {
        let tables = vec![table(&["a", "b"], &[1.0, 2.0]), table(&["a"], &[1.0])];
        assert!(matches!(
            average_predictions(&tables),
            Err(DatasetError::Misaligned(_))
        ));
    }
}
