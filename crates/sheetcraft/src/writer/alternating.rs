//! Zebra-striped rows styled from a template

use std::io::Write;
use std::path::Path;

use log::debug;
use sheetcraft_core::Worksheet;

use super::{
    collect_values, current_sheet, open_template, serialize, template_last_row,
    template_save_failed, template_sheet, template_sheet_ref, IntoRecord, SheetData, NO_SHEETS,
    TEMPLATE_TO_BYTES_FAILED, TEMPLATE_WRITE_TO_FAILED,
};
use crate::encoding::Encoding;
use crate::error::{ExcelIoError, Result};
use crate::layout::{AlternatingLayout, RowPlan, RowRole};
use crate::materialize::{DecimalMode, Materializer, Value};
use crate::output::{save_rendered, write_rendered, Rendered};
use crate::styles::DonorStyles;
use crate::template::TemplateSource;

const TOO_SHORT: &str = "Template sheet must have at least 3 rows (header, odd style, even style)";

/// Header, odd and even donor styles of the template
struct StripeDonors {
    header: DonorStyles,
    odd: DonorStyles,
    even: DonorStyles,
}

impl StripeDonors {
    fn extract(sheet: &mut Worksheet) -> Self {
        Self {
            header: DonorStyles::extract(sheet, AlternatingLayout::HEADER_DONOR_ROW),
            odd: DonorStyles::extract(sheet, AlternatingLayout::ODD_DONOR_ROW),
            even: DonorStyles::extract(sheet, AlternatingLayout::EVEN_DONOR_ROW),
        }
    }

    fn transfer(&self, from: &Worksheet, to: &mut Worksheet) -> Self {
        Self {
            header: self.header.transfer(from, to),
            odd: self.odd.transfer(from, to),
            even: self.even.transfer(from, to),
        }
    }

    fn for_role(&self, role: RowRole) -> &DonorStyles {
        match role {
            RowRole::Header => &self.header,
            RowRole::Even => &self.even,
            _ => &self.odd,
        }
    }
}

/// Writes rows that alternate between the odd (row 1) and even (row 2)
/// styles of a template, under the template's header row.
///
/// The first sheet reuses the template sheet; later sheets are created
/// with copies of the same styles.
#[derive(Debug, Clone)]
pub struct AlternatingRowsWriter {
    template: TemplateSource,
    sheets: Vec<SheetData>,
    encoding: Encoding,
    decimal_mode: DecimalMode,
}

impl AlternatingRowsWriter {
    pub fn new<T: Into<TemplateSource>>(template: T) -> Self {
        Self {
            template: template.into(),
            sheets: Vec::new(),
            encoding: Encoding::default(),
            decimal_mode: DecimalMode::default(),
        }
    }

    pub fn encoding(mut self, label: &str) -> Result<Self> {
        self.encoding = Encoding::for_label(label)?;
        Ok(self)
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn decimal_mode(mut self, mode: DecimalMode) -> Self {
        self.decimal_mode = mode;
        self
    }

    pub fn sheet<S: Into<String>>(mut self, name: S) -> Self {
        self.sheets.push(SheetData::new(name));
        self
    }

    pub fn sheet_with<I, R>(mut self, name: &str, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoRecord,
    {
        self.sheets.push(SheetData::from_records(name, records));
        self
    }

    pub fn header<I, S>(mut self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        current_sheet(&mut self.sheets, SheetData::new).set_headers(headers)?;
        Ok(self)
    }

    pub fn row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        current_sheet(&mut self.sheets, SheetData::new)
            .rows
            .push(collect_values(values));
        self
    }

    pub fn rows<I, R, V>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let sheet = current_sheet(&mut self.sheets, SheetData::new);
        sheet.rows.extend(rows.into_iter().map(collect_values));
        self
    }

    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        save_rendered(path, &template_save_failed(path), |failure| {
            self.render(failure)
        })
    }

    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        write_rendered(out, TEMPLATE_WRITE_TO_FAILED, |failure| {
            self.render(failure)
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.render(TEMPLATE_TO_BYTES_FAILED)?.into_bytes())
    }

    fn render(&self, failure: &str) -> Result<Rendered> {
        let Some((first, rest)) = self.sheets.split_first() else {
            return Err(ExcelIoError::new(NO_SHEETS));
        };
        let mut workbook = open_template(&self.template, failure)?;
        let materializer = Materializer::new(self.encoding, self.decimal_mode);

        let donors = {
            let template = template_sheet(&mut workbook)?;
            let last = template_last_row(template, 3, TOO_SHORT)?;
            let donors = StripeDonors::extract(template);
            fill_template(template, first, &donors, last, &materializer)?;
            donors
        };
        if workbook.worksheet(0).map(Worksheet::name) != Some(first.name.as_str()) {
            workbook.rename_worksheet(0, &first.name)?;
        }

        for data in rest {
            let mut sheet = Worksheet::new(data.name.as_str());
            let template = template_sheet_ref(&workbook)?;
            let donors = donors.transfer(template, &mut sheet);
            let plan = AlternatingLayout::plan(!data.headers.is_empty(), data.rows.len(), None);
            write_plan(&mut sheet, data, &plan, &donors, &donors.header, &materializer)?;
            Materializer::auto_size(&mut sheet, data.width());
            workbook.add_existing_worksheet(sheet)?;
        }

        serialize(&workbook, failure)
    }
}

/// Populate the template sheet in place. Header cells keep the template's
/// own styles; data rows take the odd/even donors.
fn fill_template(
    sheet: &mut Worksheet,
    data: &SheetData,
    donors: &StripeDonors,
    template_last_row: u32,
    materializer: &Materializer,
) -> Result<()> {
    let plan = AlternatingLayout::plan(
        !data.headers.is_empty(),
        data.rows.len(),
        Some(template_last_row),
    );
    for planned in &plan.rows {
        sheet.clear_row_values(planned.row);
    }
    write_plan(sheet, data, &plan, donors, &DonorStyles::default(), materializer)?;

    if let Some(removals) = plan.removals.clone() {
        debug!("removing template rows {:?}", removals);
        for row in removals {
            sheet.remove_row(row);
        }
    }
    Materializer::auto_size(sheet, data.width());
    Ok(())
}

fn write_plan(
    sheet: &mut Worksheet,
    data: &SheetData,
    plan: &RowPlan,
    donors: &StripeDonors,
    header_styles: &DonorStyles,
    materializer: &Materializer,
) -> Result<()> {
    let mut rows = data.rows.iter();
    for planned in &plan.rows {
        if planned.role == RowRole::Header {
            materializer.write_header(sheet, planned.row, data.headers.labels(), header_styles)?;
        } else if let Some(values) = rows.next() {
            materializer.write_row(sheet, planned.row, values, donors.for_role(planned.role))?;
        }
    }
    debug!(
        "wrote {} striped rows to sheet '{}'",
        data.rows.len(),
        sheet.name()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;
    use sheetcraft_core::{CellValue, Color, FillStyle, Style, Workbook};
    use sheetcraft_xlsx::{XlsxReader, XlsxWriter};

    const ODD: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    const EVEN: Color = Color::rgb(0xE8, 0xF0, 0xFE);

    fn odd() -> Style {
        Style::new().fill_color(ODD)
    }

    fn even() -> Style {
        Style::new().fill_color(EVEN)
    }

    fn fill_at(ws: &Worksheet, row: u32, col: u16) -> FillStyle {
        ws.cell_style_at(row, col).map(|s| s.fill.clone()).unwrap_or_default()
    }

    fn template(extra_rows: u32) -> Vec<u8> {
        let mut wb = Workbook::with_sheet("Template").unwrap();
        let ws = wb.worksheet_mut(0).unwrap();
        let header = Style::new().bold(true);
        for col in 0..3 {
            ws.set_cell_style_at(0, col, &header).unwrap();
            ws.set_cell_style_at(1, col, &odd()).unwrap();
            ws.set_cell_style_at(2, col, &even()).unwrap();
        }
        ws.set_cell_value_at(0, 0, "Placeholder header").unwrap();
        ws.set_cell_value_at(1, 2, "sample odd").unwrap();
        for row in 3..3 + extra_rows {
            ws.set_cell_value_at(row, 0, "leftover").unwrap();
        }
        XlsxWriter::to_bytes(&wb).unwrap()
    }

    fn render(writer: &AlternatingRowsWriter) -> Workbook {
        XlsxReader::read_bytes(&writer.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_stripes_and_header() {
        let writer = AlternatingRowsWriter::new(template(0))
            .sheet("People")
            .header(["ID", "Name"])
            .unwrap()
            .rows([values!["1", "A"], values!["2", "B"], values!["3", "C"]]);
        let wb = render(&writer);
        let ws = wb.worksheet(0).unwrap();

        assert_eq!(ws.name(), "People");
        assert_eq!(ws.get_value_at(0, 1), CellValue::string("Name"));
        assert!(ws.cell_style_at(0, 1).unwrap().font.bold);
        assert_eq!(fill_at(ws, 1, 0), FillStyle::solid(ODD));
        assert_eq!(fill_at(ws, 2, 0), FillStyle::solid(EVEN));
        assert_eq!(fill_at(ws, 3, 1), FillStyle::solid(ODD));
        assert_eq!(ws.get_value_at(3, 1), CellValue::string("C"));
        // Donor sample text does not leak into data rows
        assert!(ws.get_value_at(1, 2).is_empty());
        assert_eq!(ws.last_row(), Some(3));
    }

    #[test]
    fn test_trailing_template_rows_removed() {
        let writer = AlternatingRowsWriter::new(template(4))
            .header(["Only"])
            .unwrap()
            .row(values!["x"]);
        let wb = render(&writer);
        let ws = wb.worksheet(0).unwrap();
        assert_eq!(ws.name(), "Sheet1");
        assert_eq!(ws.last_row(), Some(1));
    }

    #[test]
    fn test_extra_sheets_get_copied_styles() {
        let writer = AlternatingRowsWriter::new(template(0))
            .sheet("First")
            .row(values![1])
            .sheet("Second")
            .header(["H"])
            .unwrap()
            .rows([values![1], values![2]]);
        let wb = render(&writer);
        assert_eq!(wb.sheet_count(), 2);

        let first = wb.worksheet(0).unwrap();
        assert_eq!(first.get_value_at(0, 0), CellValue::Number(1.0));
        assert_eq!(fill_at(first, 0, 0), FillStyle::solid(ODD));

        let second = wb.worksheet(1).unwrap();
        assert_eq!(second.name(), "Second");
        assert!(second.cell_style_at(0, 0).unwrap().font.bold);
        assert_eq!(fill_at(second, 1, 0), FillStyle::solid(ODD));
        assert_eq!(fill_at(second, 2, 0), FillStyle::solid(EVEN));
    }

    #[test]
    fn test_short_template_is_rejected() {
        let mut wb = Workbook::with_sheet("T").unwrap();
        wb.worksheet_mut(0)
            .unwrap()
            .set_cell_value_at(1, 0, "two rows")
            .unwrap();
        let bytes = XlsxWriter::to_bytes(&wb).unwrap();

        let err = AlternatingRowsWriter::new(bytes)
            .row(values![1])
            .to_bytes()
            .unwrap_err();
        assert_eq!(err.to_string(), TOO_SHORT);
    }

    #[test]
    fn test_no_sheets_and_bad_template() {
        let err = AlternatingRowsWriter::new(template(0)).to_bytes().unwrap_err();
        assert_eq!(err.to_string(), NO_SHEETS);

        let err = AlternatingRowsWriter::new(b"garbage".to_vec())
            .row(values![1])
            .to_bytes()
            .unwrap_err();
        assert_eq!(err.to_string(), TEMPLATE_TO_BYTES_FAILED);
    }
}
