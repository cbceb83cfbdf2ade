use table_exporter::ingestion::csv::{load_csv_from_reader, load_csv_source};
use table_exporter::types::Value;

fn utf8(s: &str) -> Value {
    Value::Utf8(s.to_string())
}

#[test]
fn load_csv_source_keeps_metadata_rows() {
    let source = load_csv_source("tests/fixtures/items.csv").unwrap();

    assert_eq!(source.type_row()[0], utf8("int"));
    assert_eq!(source.type_row()[4], utf8("memo"));
    assert_eq!(source.header_row()[5], utf8("Stock"));
    assert_eq!(source.data_row_count(), 3);
}

#[test]
fn load_csv_source_infers_cell_values() {
    let source = load_csv_source("tests/fixtures/items.csv").unwrap();
    let body = source.body();

    assert_eq!(
        body.rows[0],
        vec![
            Value::Int64(1),
            utf8("Potion"),
            Value::Float64(2.5),
            Value::Bool(true),
            utf8("starter"),
            Value::Int64(100),
        ]
    );
    assert_eq!(body.rows[1][4], Value::Null);
    assert_eq!(body.rows[2][3], Value::Bool(true));
    assert_eq!(body.rows[2][4], utf8("rare, expensive"));
}

#[test]
fn short_records_are_padded_in_body() {
    let input = "int,string,float\nID,Name,Price\n1\n2,Ether\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let source = load_csv_from_reader(&mut rdr).unwrap();
    let body = source.body();
    assert_eq!(body.columns, vec!["ID".to_string(), "Name".to_string(), "Price".to_string()]);
    assert_eq!(body.rows[0], vec![Value::Int64(1), Value::Null, Value::Null]);
    assert_eq!(body.rows[1], vec![Value::Int64(2), utf8("Ether"), Value::Null]);
}

#[test]
fn source_with_only_metadata_rows_has_empty_body() {
    let input = "int\nID\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let source = load_csv_from_reader(&mut rdr).unwrap();
    assert_eq!(source.data_row_count(), 0);
    assert_eq!(source.body().row_count(), 0);
}

#[test]
fn missing_file_is_an_error() {
    let err = load_csv_source("tests/fixtures/does_not_exist.csv").unwrap_err();
    assert!(err.to_string().contains("csv error") || err.to_string().contains("io error"));
}
