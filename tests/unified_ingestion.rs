use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use table_exporter::ingestion::{load_source, LoadOptions, SourceFormat};
use table_exporter::types::Value;
use table_exporter::ExportError;

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("table-exporter-unified-{nanos}.{ext}"))
}

#[test]
fn load_source_csv_auto_by_extension() {
    let source = load_source("tests/fixtures/monsters.csv", &LoadOptions::default()).unwrap();
    assert_eq!(source.data_row_count(), 4);
    assert_eq!(source.header_row()[3], Value::Utf8("DropRate".to_string()));
}

#[test]
fn load_source_csv_explicit_format() {
    let path = tmp_file("txt");
    std::fs::copy("tests/fixtures/monsters.csv", &path).unwrap();

    let opts = LoadOptions {
        format: Some(SourceFormat::Csv),
        ..Default::default()
    };
    let source = load_source(&path, &opts).unwrap();
    assert_eq!(source.data_row_count(), 4);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn load_source_rejects_unknown_extension() {
    let err = load_source("tests/fixtures/monsters.txt", &LoadOptions::default()).unwrap_err();
    match err {
        ExportError::UnsupportedFormat { message } => {
            assert!(message.contains("cannot infer format from extension 'txt'"), "{message}")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sheet_option_is_ignored_for_csv() {
    let opts = LoadOptions {
        format: None,
        sheet: Some("Monsters".to_string()),
    };
    let source = load_source("tests/fixtures/monsters.csv", &opts).unwrap();
    assert_eq!(source.data_row_count(), 4);
}

#[cfg(not(feature = "excel"))]
#[test]
fn excel_sources_need_the_excel_feature() {
    let err = load_source("anything.xlsx", &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ExportError::UnsupportedFormat { .. }));
}

#[cfg(feature = "excel")]
#[test]
fn missing_workbook_is_an_excel_error() {
    let err = load_source(tmp_file("xlsx"), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ExportError::Excel(_)));
}
