//! Write a workbook, read it back, and compare what a template relies on.

use pretty_assertions::assert_eq;
use sheetcraft_core::style::{BorderLineStyle, Color, Style};
use sheetcraft_core::{CellRange, CellValue, Workbook};
use sheetcraft_xlsx::{XlsxReader, XlsxWriter};

fn template() -> Workbook {
    let mut wb = Workbook::with_sheet("Template").unwrap();
    let ws = wb.worksheet_mut(0).unwrap();

    let header = Style::new()
        .bold(true)
        .fill_color(Color::GREY_25_PERCENT)
        .outline(BorderLineStyle::Thin, Color::BLACK);
    let odd = Style::new().fill_color(Color::rgb(0xEE, 0xF3, 0xFF));

    ws.set_cell_value_at(0, 0, "Name").unwrap();
    ws.set_cell_value_at(0, 1, "Amount").unwrap();
    ws.set_cell_style_at(0, 0, &header).unwrap();
    ws.set_cell_style_at(0, 1, &header).unwrap();
    // Style-only donor row
    ws.set_cell_style_at(1, 0, &odd).unwrap();
    ws.set_cell_style_at(1, 1, &odd.clone().number_format("#,##0.00"))
        .unwrap();

    ws.set_cell_value_at(2, 0, true).unwrap();
    ws.set_cell_value_at(2, 1, 1234.5).unwrap();
    ws.set_cell_value_at(
        2,
        2,
        CellValue::Formula {
            text: "B3*2".into(),
            cached_value: Some(Box::new(CellValue::Number(2469.0))),
        },
    )
    .unwrap();

    ws.set_row_height(0, 24.0);
    ws.set_row_hidden(5, true);
    ws.set_column_width(0, 30.0);
    ws.merge_cells(&CellRange::parse("A8:C8").unwrap()).unwrap();

    wb.add_worksheet_with_name("Notes & more").unwrap();
    wb
}

#[test]
fn test_roundtrip_preserves_template_structure() {
    let original = template();
    let bytes = XlsxWriter::to_bytes(&original).unwrap();
    let read = XlsxReader::read_bytes(&bytes).unwrap();

    assert_eq!(read.sheet_count(), 2);
    assert_eq!(read.worksheet(1).unwrap().name(), "Notes & more");

    let (a, b) = (original.worksheet(0).unwrap(), read.worksheet(0).unwrap());
    for (row, col) in [(0, 0), (0, 1), (2, 0), (2, 1), (2, 2)] {
        assert_eq!(a.get_value_at(row, col), b.get_value_at(row, col));
    }
    for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        assert_eq!(a.cell_style_at(row, col), b.cell_style_at(row, col));
    }
    assert!(b.get_value_at(1, 0).is_empty());
    assert_eq!(b.row_len(1), 2);

    assert_eq!(b.row_height(0), 24.0);
    assert!(b.is_row_hidden(5));
    assert_eq!(b.column_width(0), 30.0);
    assert_eq!(b.merged_regions(), a.merged_regions());
}

#[test]
fn test_write_file_and_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    XlsxWriter::write_file(&template(), &path).unwrap();

    let read = XlsxReader::read_file(&path).unwrap();
    assert_eq!(
        read.worksheet(0).unwrap().get_value_at(0, 0),
        CellValue::string("Name")
    );
}
