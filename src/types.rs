//! Core data model types.
//!
//! A loaded spreadsheet is a [`TabularSource`]: row 0 carries declared type names, row 1 the
//! display names, and everything below is data. The data part is exposed as a [`DataSet`],
//! which is also the shape of the filtered export.

use std::fmt;

/// Scalar type of a generated property.
///
/// This is a closed set; declared type names outside of it resolve to [`ScalarType::String`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Double,
    Bool,
    Long,
    Short,
    Byte,
    Decimal,
}

impl ScalarType {
    /// Parse a declared type name (case-insensitive).
    ///
    /// Returns `None` for names outside the recognized set.
    pub fn parse(declared: &str) -> Option<Self> {
        match declared.to_lowercase().as_str() {
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "bool" | "boolean" => Some(Self::Bool),
            "long" => Some(Self::Long),
            "short" => Some(Self::Short),
            "byte" => Some(Self::Byte),
            "decimal" => Some(Self::Decimal),
            _ => None,
        }
    }

    /// Resolve a declared type name, falling back to [`ScalarType::String`].
    ///
    /// Never fails: empty, malformed and unknown names all map to `String`.
    pub fn resolve(declared: &str) -> Self {
        Self::parse(declared).unwrap_or(Self::String)
    }

    /// The C# keyword used for this type in generated declarations.
    pub fn csharp_keyword(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::Long => "long",
            Self::Short => "short",
            Self::Byte => "byte",
            Self::Decimal => "decimal",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.csharp_keyword())
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns true for [`Value::Null`] and for empty strings.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Utf8(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Text form used for header names, declared types and CSV output.
///
/// Nulls render empty, booleans as `True`/`False`, and integral floats without a
/// fractional part.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

/// In-memory tabular dataset with named columns.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Column names, in order.
    pub columns: Vec<String>,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the index of a column by name, if present.
    ///
    /// When a name appears more than once the last occurrence wins. Empty names never match.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.columns.iter().rposition(|c| c == name)
    }

    /// Create a new dataset containing only rows for which `predicate` returns `Ok(true)`.
    ///
    /// Stops at the first error. The returned dataset keeps the original columns and
    /// relative row order.
    pub fn try_filter_rows<E, F>(&self, mut predicate: F) -> Result<Self, E>
    where
        F: FnMut(&[Value]) -> Result<bool, E>,
    {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            if predicate(row.as_slice())? {
                rows.push(row.clone());
            }
        }
        Ok(Self {
            columns: self.columns.clone(),
            rows,
        })
    }
}

/// A loaded spreadsheet with its two metadata rows.
///
/// Row 0 holds declared type names, row 1 holds display names, rows 2.. hold data.
/// Sources with fewer than two rows are accepted and behave as if the missing metadata
/// rows were empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularSource {
    rows: Vec<Vec<Value>>,
}

impl TabularSource {
    /// Number of metadata rows above the data.
    pub const HEADER_ROWS: usize = 2;

    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self { rows }
    }

    /// All rows, metadata included.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// The declared-type row (row 0).
    pub fn type_row(&self) -> &[Value] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// The display-name row (row 1).
    pub fn header_row(&self) -> &[Value] {
        self.rows.get(1).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of data rows below the metadata block.
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(Self::HEADER_ROWS)
    }

    /// The data rows as a [`DataSet`] named by the display-name row.
    ///
    /// Data rows are padded with nulls (or truncated) to the header width.
    pub fn body(&self) -> DataSet {
        let columns: Vec<String> = self.header_row().iter().map(Value::to_string).collect();
        let width = columns.len();
        let rows = self
            .rows
            .iter()
            .skip(Self::HEADER_ROWS)
            .map(|row| {
                let mut out: Vec<Value> = row.iter().take(width).cloned().collect();
                out.resize(width, Value::Null);
                out
            })
            .collect();
        DataSet::new(columns, rows)
    }
}
