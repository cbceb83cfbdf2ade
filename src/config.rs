//! YAML configuration files.
//!
//! A configuration file holds an optional `codegen:` block and a list of mappings:
//!
//! ```yaml
//! codegen:
//!   namespace: LOP.MasterData
//! mappings:
//!   - name: Item
//!     importPath: data/Item.xlsx
//!     exportPath: ../client
//!     sourceColumns: [ID, Price]
//!     targetColumns: [itemId, price]
//!     filters:
//!       price: value > 0
//! ```
//!
//! Relative paths inside a configuration are used as written, i.e. relative to the
//! working directory of the process.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codegen::CodegenOptions;
use crate::error::{ExportError, ExportResult};
use crate::mapping::MappingSpec;

/// One parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Class scaffold shared by every mapping of this file.
    #[serde(default)]
    pub codegen: CodegenOptions,
    pub mappings: Vec<MappingSpec>,
}

impl ExportConfig {
    /// Parse configuration text. `origin` is only used for error messages.
    pub fn from_yaml_str(text: &str, origin: &Path) -> ExportResult<Self> {
        serde_yaml_ng::from_str(text).map_err(|e| ExportError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Names of all mappings, in file order.
    pub fn mapping_names(&self) -> Vec<&str> {
        self.mappings.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Read and parse a configuration file.
///
/// Mapping invariants are not checked here; each mapping is validated when it is
/// processed so that one bad entry does not reject its siblings.
pub fn load_config(path: impl AsRef<Path>) -> ExportResult<ExportConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ExportError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    ExportConfig::from_yaml_str(&text, path)
}

/// Expand command-line inputs into configuration file paths.
///
/// Each input may be a file (used as is), a directory (walked recursively for `*.yaml`
/// and `*.yml`, sorted by name) or a glob pattern. Duplicates are dropped, first
/// occurrence wins. A pattern that matches nothing is an error.
pub fn discover_configs<S: AsRef<str>>(inputs: &[S]) -> ExportResult<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |path: PathBuf| {
        if seen.insert(path.clone()) {
            out.push(path);
        }
    };

    for input in inputs {
        let input = input.as_ref();
        let path = Path::new(input);
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|e| ExportError::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                if entry.file_type().is_file() && is_yaml(entry.path()) {
                    push(entry.into_path());
                }
            }
        } else if path.is_file() {
            push(path.to_path_buf());
        } else {
            let invalid = |message: String| ExportError::Config {
                path: path.to_path_buf(),
                message,
            };
            let matches = glob::glob(input).map_err(|e| invalid(e.to_string()))?;
            let mut found = false;
            for m in matches {
                let m = m.map_err(|e| invalid(e.to_string()))?;
                if m.is_file() {
                    found = true;
                    push(m);
                }
            }
            if !found {
                return Err(invalid("no such file, directory or matching pattern".to_string()));
            }
        }
    }
    Ok(out)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{discover_configs, load_config, ExportConfig};
    use crate::codegen::CodegenOptions;
    use crate::error::ExportError;

    #[test]
    fn parses_mappings_with_default_codegen() {
        let yaml = r#"
mappings:
  - name: Item
    importPath: data/Item.xlsx
    exportPath: ../client
    sourceColumns: [ID, Price]
    targetColumns: [itemId, price]
  - name: Skill
    importPath: data/Skill.csv
    exportPath: ../server
    sourceColumns: [Id]
    targetColumns: [id]
    sheet: Skills
    filters:
      id: value > 0
"#;
        let config = ExportConfig::from_yaml_str(yaml, Path::new("client.yaml")).unwrap();
        assert_eq!(config.codegen, CodegenOptions::default());
        assert_eq!(config.mapping_names(), vec!["Item", "Skill"]);
        assert_eq!(config.mappings[1].sheet.as_deref(), Some("Skills"));
        assert_eq!(config.mappings[1].filters.len(), 1);
    }

    #[test]
    fn codegen_block_overrides_scaffold() {
        let yaml = r#"
codegen:
  usings: [System, GameFramework]
  namespace: Game.Data
  baseType: null
mappings: []
"#;
        let config = ExportConfig::from_yaml_str(yaml, Path::new("c.yaml")).unwrap();
        assert_eq!(config.codegen.usings, vec!["System".to_string(), "GameFramework".to_string()]);
        assert_eq!(config.codegen.namespace, "Game.Data");
        assert_eq!(config.codegen.base_type, None);
        assert!(config.mappings.is_empty());
    }

    #[test]
    fn partial_codegen_block_keeps_other_defaults() {
        let yaml = "codegen:\n  namespace: Other\nmappings: []\n";
        let config = ExportConfig::from_yaml_str(yaml, Path::new("c.yaml")).unwrap();
        assert_eq!(config.codegen.usings, vec!["GameFramework".to_string()]);
        assert_eq!(config.codegen.base_type.as_deref(), Some("IMasterData"));
    }

    #[test]
    fn missing_mappings_key_is_config_error() {
        let err = ExportConfig::from_yaml_str("codegen: {}\n", Path::new("broken.yaml")).unwrap_err();
        match err {
            ExportError::Config { path, message } => {
                assert_eq!(path, PathBuf::from("broken.yaml"));
                assert!(message.contains("mappings"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_file_is_config_error() {
        let err = load_config("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ExportError::Config { .. }));
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }

    fn unique_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn discovers_files_directories_and_globs() {
        let dir = unique_dir("table_exporter_discover");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        for name in ["b.yaml", "a.yml", "notes.txt", "nested/c.YAML"] {
            std::fs::write(dir.join(name), "mappings: []\n").unwrap();
        }

        let found = discover_configs(&[dir.to_string_lossy().to_string()]).unwrap();
        assert_eq!(
            found,
            vec![dir.join("a.yml"), dir.join("b.yaml"), dir.join("nested").join("c.YAML")]
        );

        let pattern = dir.join("*.yaml").to_string_lossy().to_string();
        let explicit = dir.join("a.yml").to_string_lossy().to_string();
        let found = discover_configs(&[explicit, pattern, dir.join("a.yml").to_string_lossy().to_string()]).unwrap();
        assert_eq!(found, vec![dir.join("a.yml"), dir.join("b.yaml")]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unmatched_input_is_an_error() {
        let err = discover_configs(&["does/not/exist/*.yaml"]).unwrap_err();
        assert!(matches!(err, ExportError::Config { .. }));
    }
}
