//! C# record-class generation.
//!
//! A [`TypeDeclaration`] is an explicit, ordered list of fields; rendering it is pure
//! string assembly, so the same declaration always renders to the same bytes.
//!
//! ```
//! use table_exporter::codegen::{CodegenOptions, TypeDeclaration};
//! use table_exporter::types::ScalarType;
//!
//! let code = TypeDeclaration::new("Item")
//!     .field(ScalarType::Int, "itemId")
//!     .field(ScalarType::Float, "price")
//!     .render(&CodegenOptions::default());
//!
//! assert!(code.contains("public sealed class Item : IMasterData"));
//! assert!(code.contains("        public int ItemId { get; private set; }\n"));
//! ```

use serde::{Deserialize, Serialize};

use crate::naming::to_upper_initial;
use crate::resolve::ResolvedField;
use crate::types::ScalarType;

const INDENT: &str = "    ";

/// The scaffold around generated properties.
///
/// Can be overridden per config file through a `codegen:` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodegenOptions {
    /// Namespaces imported at the top of the file, in order.
    #[serde(default = "default_usings")]
    pub usings: Vec<String>,
    /// Namespace wrapping the class.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Interface or base class the generated class derives from, if any.
    #[serde(default = "default_base_type")]
    pub base_type: Option<String>,
}

fn default_usings() -> Vec<String> {
    vec!["GameFramework".to_string()]
}

fn default_namespace() -> String {
    "LOP.MasterData".to_string()
}

fn default_base_type() -> Option<String> {
    Some("IMasterData".to_string())
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            usings: default_usings(),
            namespace: default_namespace(),
            base_type: default_base_type(),
        }
    }
}

/// A sealed class exposing one read-only property per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    /// Class name, used verbatim.
    pub type_name: String,
    /// Properties in declaration order.
    pub fields: Vec<ResolvedField>,
}

impl TypeDeclaration {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Create a declaration from an existing field list.
    pub fn with_fields(type_name: impl Into<String>, fields: Vec<ResolvedField>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Append a field.
    pub fn field(mut self, resolved_type: ScalarType, target_name: impl Into<String>) -> Self {
        self.fields.push(ResolvedField::new(target_name, resolved_type));
        self
    }

    /// Render the declaration. The output has no trailing newline.
    pub fn render(&self, options: &CodegenOptions) -> String {
        let mut out = String::new();

        for using in &options.usings {
            out.push_str(&format!("using {using};\n"));
        }
        if !options.usings.is_empty() {
            out.push('\n');
        }

        out.push_str(&format!("namespace {}\n{{\n", options.namespace));

        out.push_str(&format!("{INDENT}public sealed class {}", self.type_name));
        if let Some(base) = &options.base_type {
            out.push_str(&format!(" : {base}"));
        }
        out.push_str(&format!("\n{INDENT}{{\n"));

        for field in &self.fields {
            out.push_str(&format!(
                "{INDENT}{INDENT}public {} {} {{ get; private set; }}\n",
                field.resolved_type.csharp_keyword(),
                to_upper_initial(&field.target_name)
            ));
        }

        out.push_str(&format!("{INDENT}}}\n}}"));
        out
    }
}

/// Render `fields` as a class named `type_name` with the default scaffold.
pub fn synthesize(type_name: &str, fields: &[ResolvedField]) -> String {
    TypeDeclaration::with_fields(type_name, fields.to_vec()).render(&CodegenOptions::default())
}
