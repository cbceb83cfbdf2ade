//! Per-mapping orchestration of column resolution, code generation and dataset export.
//!
//! [`MappingProcessor::process`] runs both branches for one [`MappingSpec`]; each branch
//! is also available on its own ([`MappingProcessor::declare`],
//! [`MappingProcessor::export_dataset`]). The branches share no state.
//!
//! ```
//! use table_exporter::mapping::{Filters, MappingSpec};
//! use table_exporter::processor::MappingProcessor;
//! use table_exporter::types::{TabularSource, Value};
//!
//! let spec = MappingSpec {
//!     name: "Item".into(),
//!     source_path: "Item.xlsx".into(),
//!     export_path: "out".into(),
//!     source_columns: vec!["ID".into(), "Price".into()],
//!     target_columns: vec!["itemId".into(), "price".into()],
//!     filters: Filters::new(),
//!     sheet: None,
//! };
//! let source = TabularSource::new(vec![
//!     vec![Value::Utf8("int".into()), Value::Utf8("float".into())],
//!     vec![Value::Utf8("ID".into()), Value::Utf8("Price".into())],
//!     vec![Value::Int64(1), Value::Float64(9.5)],
//! ]);
//!
//! let artifacts = MappingProcessor::default().process(&spec, &source).unwrap();
//! assert_eq!(artifacts.dataset.columns, vec!["itemId".to_string(), "price".to_string()]);
//! assert!(artifacts.code.contains("public float Price { get; private set; }"));
//! ```

use tracing::{debug, info_span, warn};

use crate::codegen::{CodegenOptions, TypeDeclaration};
use crate::error::ExportResult;
use crate::mapping::MappingSpec;
use crate::processing::transform;
use crate::resolve::{pair_fields, resolve_columns, resolve_columns_strict, ResolvedField};
use crate::types::{DataSet, TabularSource};

/// How requested source columns missing from the header row are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPolicy {
    /// Fail the whole mapping before either branch runs.
    #[default]
    Strict,
    /// Drop missing columns from the declaration and pair the remaining ones with
    /// target names by position. The dataset branch still fails on missing columns, but
    /// batch execution writes the class before reporting that failure.
    Lenient,
}

/// Configuration for a [`MappingProcessor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorOptions {
    pub resolution: ResolutionPolicy,
    pub codegen: CodegenOptions,
}

/// The two in-memory artifacts of one mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingArtifacts {
    /// Filtered, renamed dataset (columns are the target names).
    pub dataset: DataSet,
    /// Class declaration the code was rendered from.
    pub declaration: TypeDeclaration,
    /// Rendered class source.
    pub code: String,
}

/// Runs one mapping against a loaded source.
#[derive(Debug, Clone, Default)]
pub struct MappingProcessor {
    options: ProcessorOptions,
}

impl MappingProcessor {
    pub fn new(options: ProcessorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Resolve the declaration's fields according to the resolution policy.
    pub fn resolve_fields(&self, spec: &MappingSpec, source: &TabularSource) -> ExportResult<Vec<ResolvedField>> {
        let columns = match self.options.resolution {
            ResolutionPolicy::Strict => resolve_columns_strict(source, &spec.source_columns)?,
            ResolutionPolicy::Lenient => {
                let columns = resolve_columns(source, &spec.source_columns);
                for name in &spec.source_columns {
                    if !columns.iter().any(|c| &c.source_name == name) {
                        warn!(
                            mapping = %spec.name,
                            column = %name,
                            "source column not found in header row; later fields shift onto earlier target names"
                        );
                    }
                }
                columns
            }
        };
        Ok(pair_fields(&columns, &spec.target_columns))
    }

    /// Declaration branch: resolve columns and build the class declaration.
    pub fn declare(&self, spec: &MappingSpec, source: &TabularSource) -> ExportResult<TypeDeclaration> {
        let fields = self.resolve_fields(spec, source)?;
        debug!(mapping = %spec.name, fields = fields.len(), "resolved declaration fields");
        Ok(TypeDeclaration::with_fields(spec.name.as_str(), fields))
    }

    /// Dataset branch: subset, rename and filter the source body.
    pub fn export_dataset(&self, spec: &MappingSpec, source: &TabularSource) -> ExportResult<DataSet> {
        let dataset = transform(
            &source.body(),
            &spec.source_columns,
            &spec.target_columns,
            &spec.filters,
        )?;
        debug!(
            mapping = %spec.name,
            input_rows = source.data_row_count(),
            output_rows = dataset.row_count(),
            "exported dataset"
        );
        Ok(dataset)
    }

    /// Validate `spec` and produce both artifacts.
    ///
    /// Under [`ResolutionPolicy::Strict`] a missing source column is reported once, as
    /// [`crate::ExportError::MissingColumns`], before either branch runs.
    pub fn process(&self, spec: &MappingSpec, source: &TabularSource) -> ExportResult<MappingArtifacts> {
        let span = info_span!("mapping", name = %spec.name);
        let _guard = span.enter();

        spec.validate()?;
        if self.options.resolution == ResolutionPolicy::Strict {
            resolve_columns_strict(source, &spec.source_columns)?;
        }

        let declaration = self.declare(spec, source)?;
        let dataset = self.export_dataset(spec, source)?;
        let code = declaration.render(&self.options.codegen);

        Ok(MappingArtifacts {
            dataset,
            declaration,
            code,
        })
    }
}
