//! `table-exporter` turns master-data spreadsheets into game-ready artifacts.
//!
//! A source sheet carries two metadata rows above its data: row 0 holds a declared type
//! name per column (`int`, `float`, `string`, ...) and row 1 holds the display names.
//! Each [`mapping::MappingSpec`] selects display names, renames them, filters rows and
//! produces two artifacts:
//!
//! - a CSV file with the selected, renamed and filtered data
//! - a C# `sealed class` with one typed read-only property per exported column
//!
//! ## Quick example
//!
//! ```
//! use table_exporter::mapping::{Filters, MappingSpec};
//! use table_exporter::processor::MappingProcessor;
//! use table_exporter::types::{TabularSource, Value};
//!
//! # fn main() -> Result<(), table_exporter::ExportError> {
//! let source = TabularSource::new(vec![
//!     vec![Value::Utf8("int".into()), Value::Utf8("string".into())],
//!     vec![Value::Utf8("Id".into()), Value::Utf8("Name".into())],
//!     vec![Value::Int64(1), Value::Utf8("Ada".into())],
//!     vec![Value::Int64(2), Value::Utf8("Bob".into())],
//! ]);
//!
//! let mut filters = Filters::new();
//! filters.push("id", "value > 1");
//! let spec = MappingSpec {
//!     name: "Person".into(),
//!     source_path: "people.csv".into(),
//!     export_path: "out".into(),
//!     source_columns: vec!["Id".into(), "Name".into()],
//!     target_columns: vec!["id".into(), "name".into()],
//!     filters,
//!     sheet: None,
//! };
//!
//! let artifacts = MappingProcessor::default().process(&spec, &source)?;
//! assert_eq!(artifacts.dataset.row_count(), 1);
//! assert!(artifacts.code.contains("public string Name { get; private set; }"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: cell values, sources, datasets and the scalar type enum
//! - [`resolve`] and [`codegen`]: the declaration branch
//! - [`processing`]: the dataset branch (column selection and filter expressions)
//! - [`processor`]: both branches for one mapping
//! - [`config`], [`ingestion`], [`output`]: YAML configs, source files, artifact files
//! - [`execution`]: parallel batch runs with per-mapping isolation and metrics

pub mod codegen;
pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod logging;
pub mod mapping;
pub mod naming;
pub mod output;
pub mod processing;
pub mod processor;
pub mod resolve;
pub mod types;

pub use error::{ExportError, ExportResult};
