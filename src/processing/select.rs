//! Column subset and rename for [`crate::types::DataSet`].

use crate::error::{ExportError, ExportResult};
use crate::types::{DataSet, Value};

/// Keep only `source_columns` (looked up by name) and rename them to `target_columns`.
///
/// Output columns follow the order of `source_columns`. Every source column must be
/// present in `dataset`; unlike header-block resolution there is no tolerance for
/// missing names here.
pub fn select_columns(
    dataset: &DataSet,
    source_columns: &[String],
    target_columns: &[String],
) -> ExportResult<DataSet> {
    if source_columns.len() != target_columns.len() {
        return Err(ExportError::ColumnCountMismatch {
            sources: source_columns.len(),
            targets: target_columns.len(),
        });
    }

    let mut indexes = Vec::with_capacity(source_columns.len());
    let mut missing = Vec::new();
    for name in source_columns {
        match dataset.index_of(name) {
            Some(idx) => indexes.push(idx),
            None => missing.push(name.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(ExportError::MissingColumns {
            columns: missing,
            available: dataset
                .columns
                .iter()
                .filter(|c| !c.is_empty())
                .cloned()
                .collect(),
        });
    }

    let rows = dataset
        .rows
        .iter()
        .map(|row| {
            indexes
                .iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(DataSet::new(target_columns.to_vec(), rows))
}

#[cfg(test)]
mod tests {
    use super::select_columns;
    use crate::error::ExportError;
    use crate::types::{DataSet, Value};

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn sample_dataset() -> DataSet {
        DataSet::new(
            names(&["Id", "Name", "Age"]),
            vec![
                vec![Value::Int64(1), Value::Utf8("a".to_string()), Value::Int64(30)],
                vec![Value::Int64(2), Value::Utf8("b".to_string()), Value::Int64(12)],
            ],
        )
    }

    #[test]
    fn selects_reorders_and_renames() {
        let ds = sample_dataset();
        let out = select_columns(&ds, &names(&["Age", "Id"]), &names(&["age", "id"])).unwrap();

        assert_eq!(out.columns, names(&["age", "id"]));
        assert_eq!(
            out.rows,
            vec![
                vec![Value::Int64(30), Value::Int64(1)],
                vec![Value::Int64(12), Value::Int64(2)],
            ]
        );
        // Original unchanged
        assert_eq!(ds.columns.len(), 3);
    }

    #[test]
    fn missing_source_column_fails_loudly() {
        let ds = sample_dataset();
        let err = select_columns(&ds, &names(&["Id", "Score"]), &names(&["id", "score"])).unwrap_err();
        match err {
            ExportError::MissingColumns { columns, available } => {
                assert_eq!(columns, names(&["Score"]));
                assert_eq!(available, names(&["Id", "Name", "Age"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let ds = sample_dataset();
        let err = select_columns(&ds, &names(&["Id"]), &names(&["id", "extra"])).unwrap_err();
        assert!(matches!(err, ExportError::ColumnCountMismatch { sources: 1, targets: 2 }));
    }

    #[test]
    fn empty_selection_keeps_row_count() {
        let ds = sample_dataset();
        let out = select_columns(&ds, &[], &[]).unwrap();
        assert!(out.columns.is_empty());
        assert_eq!(out.row_count(), 2);
    }
}
