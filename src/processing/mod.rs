//! Dataset transformation: column subset, rename and filtering.
//!
//! The processing layer operates on the [`crate::types::DataSet`] returned by
//! [`crate::types::TabularSource::body`]. It is purely in-memory.
//!
//! - [`select_columns()`]: pick source columns by name and rename them positionally
//! - [`apply_filters()`]: keep rows matching every filter expression
//! - [`transform()`]: both steps, in that order
//!
//! ## Example
//!
//! ```rust
//! use table_exporter::mapping::Filters;
//! use table_exporter::processing::transform;
//! use table_exporter::types::{DataSet, Value};
//!
//! let body = DataSet::new(
//!     vec!["Id".into(), "Name".into(), "Age".into()],
//!     vec![
//!         vec![Value::Int64(1), Value::Utf8("Ada".into()), Value::Int64(36)],
//!         vec![Value::Int64(2), Value::Utf8("Tim".into()), Value::Int64(12)],
//!     ],
//! );
//! let sources = vec!["Id".to_string(), "Age".to_string()];
//! let targets = vec!["id".to_string(), "age".to_string()];
//! let filters: Filters = [("age", "value > 18")].into_iter().collect();
//!
//! let out = transform(&body, &sources, &targets, &filters).unwrap();
//!
//! assert_eq!(out.columns, vec!["id".to_string(), "age".to_string()]);
//! assert_eq!(out.rows, vec![vec![Value::Int64(1), Value::Int64(36)]]);
//! ```

pub mod expr;
pub mod filter;
pub mod select;

pub use expr::{ExprError, Predicate};
pub use filter::apply_filters;
pub use select::select_columns;

use crate::error::ExportResult;
use crate::mapping::Filters;
use crate::types::DataSet;

/// Select and rename `source_columns` to `target_columns`, then apply `filters`.
///
/// Surviving rows keep their original relative order.
pub fn transform(
    body: &DataSet,
    source_columns: &[String],
    target_columns: &[String],
    filters: &Filters,
) -> ExportResult<DataSet> {
    let selected = select_columns(body, source_columns, target_columns)?;
    if filters.is_empty() {
        return Ok(selected);
    }
    apply_filters(&selected, filters, source_columns, target_columns)
}
