//! Column resolution against a source's two-row header block.

use std::collections::HashMap;

use crate::error::{ExportError, ExportResult};
use crate::types::{ScalarType, TabularSource, Value};

/// Declared type used when a column has no cell in the type row.
pub const DEFAULT_DECLARED_TYPE: &str = "string";

/// A requested source column found in the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Display name as requested (and as found in row 1).
    pub source_name: String,
    /// Raw type token from row 0, before resolution.
    pub declared_type: String,
    /// Zero-based column position.
    pub index: usize,
}

impl ColumnInfo {
    pub fn new(source_name: impl Into<String>, declared_type: impl Into<String>, index: usize) -> Self {
        Self {
            source_name: source_name.into(),
            declared_type: declared_type.into(),
            index,
        }
    }

    /// The scalar type this column's declared type resolves to.
    pub fn resolved_type(&self) -> ScalarType {
        ScalarType::resolve(&self.declared_type)
    }
}

/// A generated property: output-facing name plus resolved scalar type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub target_name: String,
    pub resolved_type: ScalarType,
}

impl ResolvedField {
    pub fn new(target_name: impl Into<String>, resolved_type: ScalarType) -> Self {
        Self {
            target_name: target_name.into(),
            resolved_type,
        }
    }
}

/// Map display name -> column index, scanning left to right.
///
/// Later duplicates overwrite earlier ones, so the last occurrence wins. Blank header
/// cells are not addressable.
fn header_index(source: &TabularSource) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, cell) in source.header_row().iter().enumerate() {
        if !cell.is_blank() {
            map.insert(cell.to_string(), idx);
        }
    }
    map
}

fn declared_type_at(source: &TabularSource, index: usize) -> String {
    source
        .type_row()
        .get(index)
        .map(Value::to_string)
        .unwrap_or_else(|| DEFAULT_DECLARED_TYPE.to_string())
}

/// Resolve `requested` source columns against the header block, skipping absent names.
///
/// The result follows the request order and may be shorter than `requested`.
pub fn resolve_columns(source: &TabularSource, requested: &[String]) -> Vec<ColumnInfo> {
    let index = header_index(source);
    requested
        .iter()
        .filter_map(|name| {
            let &idx = index.get(name)?;
            Some(ColumnInfo::new(name.as_str(), declared_type_at(source, idx), idx))
        })
        .collect()
}

/// Resolve `requested` source columns, failing if any of them is absent.
///
/// The error lists every absent name, not just the first.
pub fn resolve_columns_strict(source: &TabularSource, requested: &[String]) -> ExportResult<Vec<ColumnInfo>> {
    let index = header_index(source);
    let missing: Vec<String> = requested
        .iter()
        .filter(|name| !index.contains_key(name.as_str()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(ExportError::MissingColumns {
            columns: missing,
            available: source
                .header_row()
                .iter()
                .filter(|c| !c.is_blank())
                .map(Value::to_string)
                .collect(),
        });
    }

    Ok(resolve_columns(source, requested))
}

/// Pair resolved columns with target names by ordinal position.
///
/// Pairing stops at whichever list is shorter. When columns were dropped during lenient
/// resolution, every later column shifts onto an earlier target name.
pub fn pair_fields(columns: &[ColumnInfo], target_columns: &[String]) -> Vec<ResolvedField> {
    columns
        .iter()
        .zip(target_columns)
        .map(|(col, target)| ResolvedField::new(target.as_str(), col.resolved_type()))
        .collect()
}
