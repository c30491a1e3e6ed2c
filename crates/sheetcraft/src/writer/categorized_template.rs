//! Category/detail rows styled from a template

use std::io::Write;
use std::path::Path;

use log::debug;
use sheetcraft_core::Worksheet;

use super::{
    collect_values, current_sheet, open_template, serialize, template_last_row,
    template_save_failed, template_sheet, template_sheet_ref, CategorizedSheet, NO_SHEETS,
    TEMPLATE_TO_BYTES_FAILED, TEMPLATE_WRITE_TO_FAILED,
};
use crate::encoding::Encoding;
use crate::error::{ExcelIoError, Result};
use crate::layout::{CategorizedLayout, RowPlan, RowRole};
use crate::materialize::{DecimalMode, Materializer, Value};
use crate::output::{save_rendered, write_rendered, Rendered};
use crate::styles::DonorStyles;
use crate::template::TemplateSource;

const TOO_SHORT: &str = "Template sheet must have at least 3 rows (header, category, detail)";

struct GroupDonors {
    header: DonorStyles,
    category: DonorStyles,
    detail: DonorStyles,
}

impl GroupDonors {
    fn extract(sheet: &mut Worksheet) -> Self {
        Self {
            header: DonorStyles::extract(sheet, CategorizedLayout::HEADER_DONOR_ROW),
            category: DonorStyles::extract(sheet, CategorizedLayout::CATEGORY_DONOR_ROW),
            detail: DonorStyles::extract(sheet, CategorizedLayout::DETAIL_DONOR_ROW),
        }
    }

    fn transfer(&self, from: &Worksheet, to: &mut Worksheet) -> Self {
        Self {
            header: self.header.transfer(from, to),
            category: self.category.transfer(from, to),
            detail: self.detail.transfer(from, to),
        }
    }
}

/// Writes category rows with their details nested beneath, taking the
/// header, category and detail styles from rows 0, 1 and 2 of a template.
///
/// ```no_run
/// use sheetcraft::{values, CategorizedTemplateWriter};
///
/// CategorizedTemplateWriter::new("templates/report.xlsx")
///     .sheet("Q3")
///     .header(["Region", "Revenue"])?
///     .category(values!["North"])
///     .detail(values!["Oslo", 1200.5])?
///     .save_as("out/q3.xlsx")?;
/// # Ok::<(), sheetcraft::ExcelIoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CategorizedTemplateWriter {
    template: TemplateSource,
    sheets: Vec<CategorizedSheet>,
    encoding: Encoding,
    decimal_mode: DecimalMode,
}

impl CategorizedTemplateWriter {
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
        self.sheets.push(CategorizedSheet::new(name));
        self
    }

    pub fn header<I, S>(mut self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        current_sheet(&mut self.sheets, CategorizedSheet::new).set_headers(headers)?;
        Ok(self)
    }

    pub fn category<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        current_sheet(&mut self.sheets, CategorizedSheet::new)
            .add_category(collect_values(values));
        self
    }

    pub fn detail<I, V>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        current_sheet(&mut self.sheets, CategorizedSheet::new)
            .add_detail(collect_values(values))?;
        Ok(self)
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
            let donors = GroupDonors::extract(template);

            // Row 0 stays the header row even when no header was given
            let plan = CategorizedLayout::plan(true, &first.detail_counts(), Some(last));
            for planned in plan.body() {
                template.clear_row_values(planned.row);
            }
            if !first.headers.is_empty() {
                template.clear_row_values(CategorizedLayout::HEADER_DONOR_ROW);
            }
            let keep_header_styles = DonorStyles::default();
            write_plan(template, first, &plan, &donors, &keep_header_styles, &materializer)?;
            if let Some(removals) = plan.removals.clone() {
                debug!("removing template rows {:?}", removals);
                for row in removals {
                    template.remove_row(row);
                }
            }
            Materializer::auto_size(template, first.width());
            donors
        };
        if workbook.worksheet(0).map(Worksheet::name) != Some(first.name.as_str()) {
            workbook.rename_worksheet(0, &first.name)?;
        }

        for data in rest {
            let mut sheet = Worksheet::new(data.name.as_str());
            let donors = donors.transfer(template_sheet_ref(&workbook)?, &mut sheet);
            let plan =
                CategorizedLayout::plan(!data.headers.is_empty(), &data.detail_counts(), None);
            write_plan(&mut sheet, data, &plan, &donors, &donors.header, &materializer)?;
            Materializer::auto_size(&mut sheet, data.width());
            workbook.add_existing_worksheet(sheet)?;
        }

        serialize(&workbook, failure)
    }
}

fn write_plan(
    sheet: &mut Worksheet,
    data: &CategorizedSheet,
    plan: &RowPlan,
    donors: &GroupDonors,
    header_styles: &DonorStyles,
    materializer: &Materializer,
) -> Result<()> {
    let mut body = data.body_rows();
    for planned in &plan.rows {
        match planned.role {
            RowRole::Header => {
                if !data.headers.is_empty() {
                    materializer.write_header(
                        sheet,
                        planned.row,
                        data.headers.labels(),
                        header_styles,
                    )?;
                }
            }
            role => {
                let Some(values) = body.next() else { break };
                let styles = if role == RowRole::Category {
                    &donors.category
                } else {
                    &donors.detail
                };
                materializer.write_row(sheet, planned.row, values, styles)?;
            }
        }
    }
    debug!(
        "wrote {} categories to sheet '{}'",
        data.groups.len(),
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

    const CATEGORY: Color = Color::rgb(0xCC, 0xE5, 0xFF);
    const DETAIL: Color = Color::rgb(0xF5, 0xF5, 0xF5);

    fn template() -> Vec<u8> {
        let mut wb = Workbook::with_sheet("Report").unwrap();
        let ws = wb.worksheet_mut(0).unwrap();
        for col in 0..2 {
            ws.set_cell_style_at(0, col, &Style::new().bold(true)).unwrap();
            ws.set_cell_style_at(1, col, &Style::new().fill_color(CATEGORY))
                .unwrap();
            ws.set_cell_style_at(2, col, &Style::new().fill_color(DETAIL))
                .unwrap();
        }
        ws.set_cell_value_at(0, 0, "Template title").unwrap();
        ws.set_cell_value_at(4, 0, "notes").unwrap();
        XlsxWriter::to_bytes(&wb).unwrap()
    }

    fn fill_at(ws: &Worksheet, row: u32, col: u16) -> FillStyle {
        ws.cell_style_at(row, col).map(|s| s.fill.clone()).unwrap_or_default()
    }

    #[test]
    fn test_groups_take_template_styles() {
        let bytes = CategorizedTemplateWriter::new(template())
            .sheet("Report")
            .header(["Name", "Total"])
            .unwrap()
            .category(values!["Fruit", 16])
            .detail(values!["Apple", 12])
            .unwrap()
            .detail(values!["Pear", 4])
            .unwrap()
            .category(values!["Veg", 0])
            .to_bytes()
            .unwrap();
        let wb = XlsxReader::read_bytes(&bytes).unwrap();
        let ws = wb.worksheet(0).unwrap();

        assert_eq!(ws.get_value_at(0, 0), CellValue::string("Name"));
        assert!(ws.cell_style_at(0, 1).unwrap().font.bold);
        assert_eq!(fill_at(ws, 1, 0), FillStyle::solid(CATEGORY));
        assert_eq!(fill_at(ws, 2, 1), FillStyle::solid(DETAIL));
        assert_eq!(fill_at(ws, 3, 0), FillStyle::solid(DETAIL));
        assert_eq!(ws.get_value_at(3, 0), CellValue::string("Pear"));
        assert_eq!(fill_at(ws, 4, 0), FillStyle::solid(CATEGORY));
        assert_eq!(ws.get_value_at(4, 0), CellValue::string("Veg"));
        assert_eq!(ws.last_row(), Some(4));
    }

    #[test]
    fn test_without_header_keeps_template_row_zero() {
        let bytes = CategorizedTemplateWriter::new(template())
            .category(values!["Only"])
            .to_bytes()
            .unwrap();
        let wb = XlsxReader::read_bytes(&bytes).unwrap();
        let ws = wb.worksheet(0).unwrap();

        assert_eq!(ws.name(), "Sheet1");
        assert_eq!(ws.get_value_at(0, 0), CellValue::string("Template title"));
        assert_eq!(ws.get_value_at(1, 0), CellValue::string("Only"));
        assert_eq!(ws.last_row(), Some(1));
    }

    #[test]
    fn test_extra_sheet_without_header_starts_at_zero() {
        let bytes = CategorizedTemplateWriter::new(template())
            .sheet("First")
            .category(values!["A"])
            .sheet("Second")
            .category(values!["B"])
            .detail(values!["b1"])
            .unwrap()
            .to_bytes()
            .unwrap();
        let wb = XlsxReader::read_bytes(&bytes).unwrap();
        let second = wb.worksheet(1).unwrap();

        assert_eq!(second.get_value_at(0, 0), CellValue::string("B"));
        assert_eq!(fill_at(second, 0, 0), FillStyle::solid(CATEGORY));
        assert_eq!(fill_at(second, 1, 0), FillStyle::solid(DETAIL));
    }

    #[test]
    fn test_short_template() {
        let mut wb = Workbook::with_sheet("T").unwrap();
        wb.worksheet_mut(0)
            .unwrap()
            .set_cell_value_at(0, 0, "one row")
            .unwrap();
        let err = CategorizedTemplateWriter::new(XlsxWriter::to_bytes(&wb).unwrap())
            .category(values!["x"])
            .to_bytes()
            .unwrap_err();
        assert_eq!(err.to_string(), TOO_SHORT);
    }
}
