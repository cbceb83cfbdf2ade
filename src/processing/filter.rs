//! Filter application for [`crate::types::DataSet`].

use tracing::debug;

use super::expr::Predicate;
use crate::error::{ExportError, ExportResult};
use crate::mapping::Filters;
use crate::types::DataSet;

/// Apply `filters` to an already renamed dataset.
///
/// Each filter is one pass over the rows left by the previous one (logical AND), in
/// insertion order. A filter key names a column of `dataset`; a source column name is
/// also accepted and translated through the `source_columns`/`target_columns` pairing.
pub fn apply_filters(
    dataset: &DataSet,
    filters: &Filters,
    source_columns: &[String],
    target_columns: &[String],
) -> ExportResult<DataSet> {
    let mut current = dataset.clone();

    for (column, expression) in filters.iter() {
        let failed = |message: String| ExportError::Filter {
            column: column.to_string(),
            expression: expression.to_string(),
            message,
        };

        let subject = filter_subject(&current, column, source_columns, target_columns)
            .ok_or_else(|| failed(format!("unknown column '{column}'")))?;
        let predicate = Predicate::compile(expression, subject, &current.columns)
            .map_err(|e| failed(e.message))?;

        let before = current.row_count();
        current = current
            .try_filter_rows(|row| predicate.matches(row))
            .map_err(|e| failed(e.message))?;
        debug!(column, expression, before, after = current.row_count(), "applied filter");
    }

    Ok(current)
}

fn filter_subject(
    dataset: &DataSet,
    column: &str,
    source_columns: &[String],
    target_columns: &[String],
) -> Option<usize> {
    dataset.index_of(column).or_else(|| {
        let pos = source_columns.iter().position(|s| s == column)?;
        dataset.index_of(target_columns.get(pos)?)
    })
}
