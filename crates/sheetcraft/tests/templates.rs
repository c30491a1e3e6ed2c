//! End-to-end tests for the template-driven writers (template -> render -> read back)

use pretty_assertions::assert_eq;
use sheetcraft::prelude::*;
use sheetcraft::{CellValue, Color, FillStyle, Style, Workbook, Worksheet, XlsxReader, XlsxWriter};

const HEADER: Color = Color::rgb(0x1F, 0x4E, 0x79);
const ODD: Color = Color::rgb(0xFF, 0xFF, 0xFF);
const EVEN: Color = Color::rgb(0xDD, 0xEB, 0xF7);

fn fill_at(ws: &Worksheet, row: u32, col: u16) -> FillStyle {
    ws.cell_style_at(row, col)
        .map(|s| s.fill.clone())
        .unwrap_or_default()
}

/// Header, odd and even donor rows across `columns` columns
fn striped_template_with(columns: u16) -> Vec<u8> {
    let mut wb = Workbook::with_sheet("Template").unwrap();
    let ws = wb.worksheet_mut(0).unwrap();
    for col in 0..columns {
        ws.set_cell_style_at(0, col, &Style::new().bold(true).fill_color(HEADER))
            .unwrap();
        ws.set_cell_style_at(1, col, &Style::new().fill_color(ODD))
            .unwrap();
        ws.set_cell_style_at(2, col, &Style::new().fill_color(EVEN))
            .unwrap();
    }
    ws.set_cell_value_at(0, 0, "Header").unwrap();
    ws.set_cell_value_at(1, 0, "odd sample").unwrap();
    ws.set_cell_value_at(2, 0, "even sample").unwrap();
    XlsxWriter::to_bytes(&wb).unwrap()
}

fn striped_template() -> Vec<u8> {
    striped_template_with(3)
}

#[test]
fn test_alternating_rows_from_three_row_template() {
    let bytes = ExcelIo::alternating_rows(striped_template())
        .sheet("Orders")
        .header(["Order", "Customer", "Total"])
        .unwrap()
        .rows([
            values![1001, "ACME", 250.0],
            values![1002, "Globex", 99.5],
            values![1003, "Initech", 12.0],
            values![1004, "Umbrella", 7.25],
        ])
        .to_bytes()
        .unwrap();

    let wb = XlsxReader::read_bytes(&bytes).unwrap();
    let ws = wb.worksheet(0).unwrap();
    assert_eq!(ws.name(), "Orders");
    assert_eq!(ws.get_value_at(0, 2), CellValue::string("Total"));
    assert!(ws.cell_style_at(0, 0).unwrap().font.bold);
    for (i, expected) in [ODD, EVEN, ODD, EVEN].into_iter().enumerate() {
        let row = 1 + i as u32;
        assert_eq!(fill_at(ws, row, 0), FillStyle::solid(expected));
        assert_eq!(fill_at(ws, row, 2), FillStyle::solid(expected));
    }
    assert_eq!(ws.get_value_at(4, 1), CellValue::string("Umbrella"));
    assert_eq!(ws.last_row(), Some(4));
}

#[test]
fn test_alternating_rows_read_back_as_maps() {
    // Template as wide as the header, so no styled blank column is read
    let bytes = ExcelIo::alternating_rows(striped_template_with(2))
        .sheet("People")
        .header(["Name", "Age"])
        .unwrap()
        .row(values!["Ann", 34])
        .row(values!["Bob", 27])
        .to_bytes()
        .unwrap();

    let rows = ExcelIo::read_bytes(bytes).as_maps().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("Name"), Some(&Value::Text("Ann".into())));
    assert_eq!(rows[1].get("Age"), Some(&Value::Int(27)));
    assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["Name", "Age"]);
}

#[test]
fn test_template_is_reusable_across_renders() {
    let writer = ExcelIo::alternating_rows(striped_template())
        .sheet("Once")
        .row(values!["a"]);
    let first = writer.to_bytes().unwrap();
    let second = writer.to_bytes().unwrap();

    let a = XlsxReader::read_bytes(&first).unwrap();
    let b = XlsxReader::read_bytes(&second).unwrap();
    let (a, b) = (a.worksheet(0).unwrap(), b.worksheet(0).unwrap());
    assert_eq!(a.get_value_at(0, 0), b.get_value_at(0, 0));
    assert_eq!(a.last_row(), b.last_row());
}

#[test]
fn test_categorized_template_nests_details() {
    let bytes = ExcelIo::categorized_from_template(striped_template())
        .sheet("Produce")
        .header(["Name", "Count"])
        .unwrap()
        .category(values!["Fruit", 3])
        .detail(values!["Apple", 2])
        .unwrap()
        .detail(values!["Pear", 1])
        .unwrap()
        .category(values!["Veg", 1])
        .detail(values!["Leek", 1])
        .unwrap()
        .to_bytes()
        .unwrap();

    let wb = XlsxReader::read_bytes(&bytes).unwrap();
    let ws = wb.worksheet(0).unwrap();
    let names: Vec<CellValue> = (0..=5).map(|row| ws.get_value_at(row, 0)).collect();
    assert_eq!(
        names,
        vec![
            CellValue::string("Name"),
            CellValue::string("Fruit"),
            CellValue::string("Apple"),
            CellValue::string("Pear"),
            CellValue::string("Veg"),
            CellValue::string("Leek"),
        ]
    );
    // Category rows take row 1 of the template, details row 2
    assert_eq!(fill_at(ws, 1, 0), FillStyle::solid(ODD));
    assert_eq!(fill_at(ws, 2, 0), FillStyle::solid(EVEN));
    assert_eq!(fill_at(ws, 3, 1), FillStyle::solid(EVEN));
    assert_eq!(fill_at(ws, 4, 0), FillStyle::solid(ODD));
    assert_eq!(fill_at(ws, 5, 1), FillStyle::solid(EVEN));
}

/// A 16-row invoice: placeholders in rows 0-5 and 10-15, line items at 7/8
fn invoice_template() -> Vec<u8> {
    let mut wb = Workbook::with_sheet("Invoice").unwrap();
    let ws = wb.worksheet_mut(0).unwrap();
    ws.set_cell_value_at(0, 0, "Invoice {{number}}").unwrap();
    ws.set_cell_value_at(2, 0, "Customer: ${customer}").unwrap();
    ws.set_cell_value_at(3, 0, "Date: {{date}}").unwrap();
    ws.set_cell_value_at(6, 0, "Item").unwrap();
    ws.set_cell_value_at(6, 1, "Amount").unwrap();
    for col in 0..2 {
        ws.set_cell_style_at(7, col, &Style::new().fill_color(ODD))
            .unwrap();
        ws.set_cell_style_at(8, col, &Style::new().fill_color(EVEN))
            .unwrap();
    }
    ws.set_cell_value_at(10, 0, "Total: {{total}}").unwrap();
    ws.set_cell_value_at(12, 0, "Paid: {{paid}}").unwrap();
    ws.set_cell_value_at(15, 0, "Questions? {{email}}").unwrap();
    XlsxWriter::to_bytes(&wb).unwrap()
}

#[test]
fn test_form_with_five_items_moves_footer() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let bytes = ExcelIo::form_template(invoice_template())
        .set_value("number", "INV-0042")
        .set_value("customer", "ACME Corp")
        .set_value("date", date)
        .set_value("total", 150)
        .set_value("paid", true)
        .set_value("email", "billing@example.com")
        .line_items((1..=5).map(|i| values![format!("Widget {}", i), i * 10]))
        .to_bytes()
        .unwrap();

    let wb = XlsxReader::read_bytes(&bytes).unwrap();
    let ws = wb.worksheet(0).unwrap();
    assert_eq!(ws.get_value_at(0, 0), CellValue::string("Invoice INV-0042"));
    assert_eq!(
        ws.get_value_at(2, 0),
        CellValue::string("Customer: ACME Corp")
    );
    assert_eq!(ws.get_value_at(3, 0), CellValue::string("Date: 2024-03-01"));
    for i in 0..5u32 {
        let row = 7 + i;
        assert_eq!(ws.get_value_at(row, 1), CellValue::Number(f64::from(i + 1) * 10.0));
        let expected = if i % 2 == 0 { ODD } else { EVEN };
        assert_eq!(fill_at(ws, row, 1), FillStyle::solid(expected));
    }
    // Three extra items push the footer down by three rows
    assert_eq!(ws.get_value_at(13, 0), CellValue::string("Total: 150"));
    assert_eq!(ws.get_value_at(15, 0), CellValue::string("Paid: true"));
    assert_eq!(
        ws.get_value_at(18, 0),
        CellValue::string("Questions? billing@example.com")
    );
}

/// Values of the footer region (six rows) starting at `start`
fn footer_values(ws: &Worksheet, start: u32) -> Vec<Vec<CellValue>> {
    (start..start + 6)
        .map(|row| {
            (0..ws.row_len(row))
                .map(|col| ws.get_value_at(row, col))
                .collect()
        })
        .collect()
}

fn render_invoice(line_items: usize) -> Workbook {
    let bytes = ExcelIo::form_template(invoice_template())
        .set_values([("number", "INV-9"), ("customer", "Initech")])
        .set_value("total", 99.5)
        .line_items((0..line_items).map(|i| values![format!("Part {}", i), i]))
        .to_bytes()
        .unwrap();
    XlsxReader::read_bytes(&bytes).unwrap()
}

#[test]
fn test_form_footer_is_unchanged_by_shifting() {
    let native = render_invoice(2);
    let native = native.worksheet(0).unwrap();
    let expected = footer_values(native, 10);
    assert_eq!(expected[0], vec![CellValue::string("Total: 99.5")]);
    assert_eq!(native.last_row(), Some(15));

    for count in [3usize, 4, 7] {
        let extra = count as u32 - 2;
        let wb = render_invoice(count);
        let ws = wb.worksheet(0).unwrap();
        assert_eq!(footer_values(ws, 10 + extra), expected, "{} line items", count);
        assert_eq!(ws.last_row(), Some(15 + extra), "{} line items", count);
        // Table header stays put; items fill the rows above the footer
        assert_eq!(ws.get_value_at(6, 0), CellValue::string("Item"));
        assert_eq!(
            ws.get_value_at(6 + count as u32, 0),
            CellValue::string(format!("Part {}", count - 1))
        );
    }
}

#[test]
fn test_form_leaves_no_placeholder_behind() {
    let bytes = ExcelIo::form_template(invoice_template())
        .set_values([("number", "7"), ("customer", "Globex")])
        .line_item(values!["Service", 1])
        .to_bytes()
        .unwrap();

    let wb = XlsxReader::read_bytes(&bytes).unwrap();
    let ws = wb.worksheet(0).unwrap();
    for row in ws.row_indices() {
        for col in 0..ws.row_len(row) {
            if let Some(text) = ws.get_value_at(row, col).as_string() {
                assert!(
                    !text.contains("{{") && !text.contains("${"),
                    "placeholder left at ({}, {}): {}",
                    row,
                    col,
                    text
                );
            }
        }
    }
}

#[test]
fn test_short_templates_are_rejected() {
    let mut wb = Workbook::with_sheet("Tiny").unwrap();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value_at(1, 0, "only two rows")
        .unwrap();
    let tiny = XlsxWriter::to_bytes(&wb).unwrap();

    let err = ExcelIo::alternating_rows(tiny.clone())
        .row(values!["x"])
        .to_bytes()
        .unwrap_err();
    assert!(err.message().contains("at least 3 rows"), "{}", err);

    let err = ExcelIo::form_template(tiny).to_bytes().unwrap_err();
    assert!(err.message().contains("at least 16 rows"), "{}", err);
}

#[test]
fn test_template_save_as_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("report.xlsx");
    let template = dir.path().join("template.xlsx");
    std::fs::write(&template, striped_template()).unwrap();

    ExcelIo::alternating_rows(template.as_path())
        .sheet("Saved")
        .row(values!["kept"])
        .save_as(&out)
        .unwrap();

    let wb = XlsxReader::read_file(&out).unwrap();
    assert_eq!(wb.worksheet(0).unwrap().name(), "Saved");
}

#[test]
fn test_write_to_stream() {
    let mut out = Vec::new();
    ExcelIo::categorized_from_template(striped_template())
        .category(values!["Only"])
        .write_to(&mut out)
        .unwrap();
    let wb = XlsxReader::read_bytes(&out).unwrap();
    assert_eq!(
        wb.worksheet(0).unwrap().get_value_at(1, 0),
        CellValue::string("Only")
    );
}
