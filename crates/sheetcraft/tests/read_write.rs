//! End-to-end tests for the plain writers and the reader

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use sheetcraft::prelude::*;
use sheetcraft::{CellValue, XlsxReader};

fn people() -> ExcelWriter {
    ExcelIo::write("unused.xlsx")
        .sheet("People")
        .header(["Name", "Age", "Member", "Balance"])
        .unwrap()
        .row(values!["Ann", 34, true, 12.5])
        .row(values!["Bob", 27, false, 0.25])
}

#[test]
fn test_write_then_read_maps() {
    let bytes = people().to_bytes().unwrap();
    let rows = ExcelIo::read_bytes(bytes).as_maps().unwrap();

    assert_eq!(rows.len(), 2);
    let ann = &rows[0];
    assert_eq!(
        ann.keys().collect::<Vec<_>>(),
        vec!["Name", "Age", "Member", "Balance"]
    );
    assert_eq!(ann.get("Name"), Some(&Value::Text("Ann".into())));
    assert_eq!(ann.get("Age"), Some(&Value::Int(34)));
    assert_eq!(ann.get("Member"), Some(&Value::Bool(true)));
    assert_eq!(ann.get("Balance"), Some(&Value::Float(12.5)));
    assert_eq!(rows[1].get("Member"), Some(&Value::Bool(false)));
}

#[test]
fn test_maps_write_back_with_sheet_with() {
    let bytes = people().to_bytes().unwrap();
    let rows = ExcelIo::read_bytes(bytes).as_maps().unwrap();

    let copied = ExcelIo::write("copy.xlsx")
        .sheet_with("Copy", rows.clone())
        .to_bytes()
        .unwrap();
    let reader = ExcelIo::read_bytes(copied);
    assert_eq!(reader.sheet_names().unwrap(), vec!["Copy".to_string()]);
    assert_eq!(reader.as_maps().unwrap(), rows);
}

#[test]
fn test_sheet_with_plain_items_uses_data_column() {
    let bytes = ExcelIo::write("items.xlsx")
        .sheet_with("Items", ["alpha", "beta"])
        .to_bytes()
        .unwrap();
    let rows = ExcelIo::read_bytes(bytes).as_rows().unwrap();
    assert_eq!(
        rows,
        vec![
            values!["Data"],
            values!["alpha"],
            values!["beta"],
        ]
    );
}

#[test]
fn test_sheet_with_map_records() {
    let mut first = BTreeMap::new();
    first.insert("id", Value::Int(1));
    first.insert("name", Value::from("one"));
    let mut second = BTreeMap::new();
    second.insert("id", Value::Int(2));

    let bytes = ExcelIo::write("maps.xlsx")
        .sheet_with("Maps", [first, second])
        .to_bytes()
        .unwrap();
    let rows = ExcelIo::read_bytes(bytes).as_maps().unwrap();
    assert_eq!(rows[0].get("name"), Some(&Value::Text("one".into())));
    assert_eq!(rows[1].get("id"), Some(&Value::Int(2)));
}

#[test]
fn test_typed_read_with_declared_columns() {
    let bytes = people().to_bytes().unwrap();
    let rows = ExcelIo::read_bytes(bytes)
        .with_types(&["name:string", "age:i16", "member:bool", "balance:decimal"])
        .unwrap()
        .as_maps()
        .unwrap();

    assert_eq!(rows[0].get("age"), Some(&Value::Int(34)));
    assert_eq!(rows[0].get("member"), Some(&Value::Bool(true)));
    assert_eq!(
        rows[1].get("balance"),
        Some(&Value::Decimal(Decimal::new(25, 2)))
    );
    assert_eq!(rows[1].get("Name"), None);
}

#[test]
fn test_typed_read_error_names_cell() {
    let bytes = ExcelIo::write("bad.xlsx")
        .sheet("Numbers")
        .header(["n"])
        .unwrap()
        .row(values![1])
        .row(values!["not a number"])
        .to_bytes()
        .unwrap();

    let err = ExcelIo::read_bytes(bytes)
        .with_types(&["n:i32"])
        .unwrap()
        .as_rows()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to convert cell value 'not a number' to type i32 at row 2, column 0"
    );
}

#[test]
fn test_reader_from_file_and_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.xlsx");
    ExcelWriter::new(&path)
        .sheet("People")
        .row(values!["no header here", 1])
        .save()
        .unwrap();

    let rows = ExcelIo::read(&path).has_headers(false).as_maps().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].keys().collect::<Vec<_>>(),
        vec!["Column1", "Column2"]
    );

    let mut file = std::fs::File::open(&path).unwrap();
    let rows = ExcelIo::read_stream(&mut file).unwrap().as_rows().unwrap();
    assert_eq!(rows, vec![values!["no header here", 1]]);
}

#[test]
fn test_categorized_writer_round_trip() {
    let bytes = ExcelIo::write_categorized("groups.xlsx")
        .sheet("Groups")
        .header(["Group", "Size"])
        .unwrap()
        .category(values!["Admins", 1])
        .detail(values!["root", 1])
        .unwrap()
        .category(values!["Users", 0])
        .to_bytes()
        .unwrap();

    let wb = XlsxReader::read_bytes(&bytes).unwrap();
    let ws = wb.worksheet(0).unwrap();
    assert_eq!(ws.get_value_at(1, 0), CellValue::string("Admins"));
    assert_eq!(ws.get_value_at(2, 0), CellValue::string("root"));
    assert_eq!(ws.get_value_at(3, 0), CellValue::string("Users"));
    // Categories and details are styled differently
    assert_ne!(
        ws.cell_style_at(1, 0).map(|s| s.fill.clone()),
        ws.cell_style_at(2, 0).map(|s| s.fill.clone())
    );
}

#[test]
fn test_usage_errors() {
    let err = ExcelIo::write("none.xlsx").to_bytes().unwrap_err();
    assert_eq!(err.to_string(), "No sheets defined. Call sheet() method first.");

    let err = ExcelIo::write("twice.xlsx")
        .sheet("S")
        .header(["a"])
        .unwrap()
        .header(["b"])
        .unwrap_err();
    assert_eq!(err.to_string(), "Headers already set for sheet: S");

    let err = ExcelIo::write_categorized("early.xlsx")
        .sheet("S")
        .detail(values!["orphan"])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot add detail row without a category. Call category() first."
    );

    let err = ExcelIo::write("enc.xlsx").encoding("no-such-charset").unwrap_err();
    assert!(err.message().contains("no-such-charset"), "{}", err);
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ExcelIo::read(dir.path().join("absent.xlsx"))
        .as_maps()
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to read Excel file");
    assert!(err.has_source());
}
