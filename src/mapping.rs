//! Mapping specifications: one source-to-output transformation each.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ExportError, ExportResult};

/// Column filters in the order they were written.
///
/// Each entry maps a column name to a predicate expression in which `value` stands for
/// that column. Filters are applied one after another, so their order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<(String, String)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter. A later filter on the same column is kept as a separate pass.
    pub fn push(&mut self, column: impl Into<String>, expression: impl Into<String>) {
        self.0.push((column.into(), expression.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(column, expression)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(c, e)| (c.as_str(), e.as_str()))
    }
}

impl<C, E> FromIterator<(C, E)> for Filters
where
    C: Into<String>,
    E: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, E)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(c, e)| (c.into(), e.into())).collect())
    }
}

impl Serialize for Filters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, expression) in &self.0 {
            map.serialize_entry(column, expression)?;
        }
        map.end()
    }
}

struct FiltersVisitor;

impl<'de> Visitor<'de> for FiltersVisitor {
    type Value = Filters;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of column name to filter expression")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Filters, E> {
        Ok(Filters::default())
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Filters, E> {
        Ok(Filters::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Filters, A::Error> {
        let mut filters = Filters::default();
        while let Some((column, expression)) = access.next_entry::<String, String>()? {
            filters.push(column, expression);
        }
        Ok(filters)
    }
}

impl<'de> Deserialize<'de> for Filters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FiltersVisitor)
    }
}

/// One mapping entry of a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSpec {
    /// Mapping name; used verbatim as the generated class name and the artifact file stem.
    pub name: String,
    /// Spreadsheet (or CSV) to read.
    #[serde(rename = "importPath", alias = "sourcePath")]
    pub source_path: PathBuf,
    /// Directory receiving `csv/<name>.csv` and `cs/<name>.cs`.
    pub export_path: PathBuf,
    /// Display names to export, in output order.
    pub source_columns: Vec<String>,
    /// Output names, paired with `source_columns` by position.
    pub target_columns: Vec<String>,
    #[serde(default)]
    pub filters: Filters,
    /// Worksheet to read; the first sheet when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl MappingSpec {
    /// Check the invariants the processor relies on.
    ///
    /// - `name` is non-empty
    /// - `source_columns` and `target_columns` have the same length
    /// - `source_columns` has no duplicates
    pub fn validate(&self) -> ExportResult<()> {
        let invalid = |message: String| ExportError::InvalidMapping {
            mapping: self.name.clone(),
            message,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if self.source_columns.len() != self.target_columns.len() {
            return Err(invalid(format!(
                "{} source column(s) but {} target column(s)",
                self.source_columns.len(),
                self.target_columns.len()
            )));
        }

        let mut seen = HashSet::new();
        for column in &self.source_columns {
            if !seen.insert(column.as_str()) {
                return Err(invalid(format!("duplicate source column '{column}'")));
            }
        }
        Ok(())
    }

    /// Path of the CSV artifact: `<export_path>/csv/<name>.csv`.
    pub fn csv_output_path(&self) -> PathBuf {
        self.export_path.join("csv").join(format!("{}.csv", self.name))
    }

    /// Path of the class artifact: `<export_path>/cs/<name>.cs`.
    pub fn cs_output_path(&self) -> PathBuf {
        self.export_path.join("cs").join(format!("{}.cs", self.name))
    }
}
