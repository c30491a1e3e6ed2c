//! Category/detail writer with built-in formatting

use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use sheetcraft_core::{BorderLineStyle, Color, Style, Workbook};

use super::{collect_values, current_sheet, serialize, CategorizedSheet, NO_SHEETS};
use crate::encoding::Encoding;
use crate::error::{ExcelIoError, Result};
use crate::layout::{CategorizedLayout, RowRole};
use crate::materialize::{DecimalMode, Materializer, Value};
use crate::output::{save_rendered, write_rendered, Rendered};
use crate::styles::DonorStyles;

const TO_BYTES_FAILED: &str = "Failed to write Excel workbook to byte array";
const WRITE_TO_FAILED: &str = "Failed to write Excel workbook to output stream";

/// Bold 12pt on 25% grey, thin borders
pub fn header_style() -> Style {
    Style::new()
        .bold(true)
        .font_size(12.0)
        .fill_color(Color::GREY_25_PERCENT)
        .outline(BorderLineStyle::Thin, Color::Auto)
}

/// Bold 11pt on light blue, thin borders
pub fn category_style() -> Style {
    Style::new()
        .bold(true)
        .font_size(11.0)
        .fill_color(Color::LIGHT_BLUE)
        .outline(BorderLineStyle::Thin, Color::Auto)
}

/// 10pt, thin borders
pub fn detail_style() -> Style {
    Style::new()
        .font_size(10.0)
        .outline(BorderLineStyle::Thin, Color::Auto)
}

/// Writes category rows with their detail rows nested beneath, styled
/// without a template.
///
/// ```no_run
/// use sheetcraft::{values, CategorizedWriter};
///
/// CategorizedWriter::new("stock.xlsx")
///     .sheet("Stock")
///     .header(["Item", "Qty"])?
///     .category(values!["Fruit"])
///     .detail(values!["Apple", 12])?
///     .detail(values!["Pear", 4])?
///     .save()?;
/// # Ok::<(), sheetcraft::ExcelIoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CategorizedWriter {
    path: PathBuf,
    sheets: Vec<CategorizedSheet>,
    encoding: Encoding,
    decimal_mode: DecimalMode,
}

impl CategorizedWriter {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            sheets: Vec::new(),
            encoding: Encoding::default(),
            decimal_mode: DecimalMode::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
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

    /// Open a new category; following details nest under it
    pub fn category<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        current_sheet(&mut self.sheets, CategorizedSheet::new)
            .add_category(collect_values(values));
        self
    }

    /// Add a detail row to the open category
    pub fn detail<I, V>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        current_sheet(&mut self.sheets, CategorizedSheet::new)
            .add_detail(collect_values(values))?;
        Ok(self)
    }

    pub fn save(&self) -> Result<()> {
        let failure = format!("Failed to save Excel file: {}", self.path.display());
        save_rendered(&self.path, &failure, |failure| self.render(failure))
    }

    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        write_rendered(out, WRITE_TO_FAILED, |failure| self.render(failure))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.render(TO_BYTES_FAILED)?.into_bytes())
    }

    pub fn build(&self) -> Result<Workbook> {
        if self.sheets.is_empty() {
            return Err(ExcelIoError::new(NO_SHEETS));
        }
        let materializer = Materializer::new(self.encoding, self.decimal_mode);
        let mut workbook = Workbook::empty();

        for data in &self.sheets {
            let index = workbook.add_worksheet_with_name(&data.name)?;
            let Some(sheet) = workbook.worksheet_mut(index) else {
                continue;
            };
            let width = data.width();
            let header = DonorStyles::uniform(sheet, header_style(), width);
            let category = DonorStyles::uniform(sheet, category_style(), width);
            let detail = DonorStyles::uniform(sheet, detail_style(), width);

            let plan =
                CategorizedLayout::plan(!data.headers.is_empty(), &data.detail_counts(), None);
            let mut body = data.body_rows();
            for planned in &plan.rows {
                match planned.role {
                    RowRole::Header => materializer.write_header(
                        sheet,
                        planned.row,
                        data.headers.labels(),
                        &header,
                    )?,
                    role => {
                        let Some(values) = body.next() else { break };
                        let styles = if role == RowRole::Category {
                            &category
                        } else {
                            &detail
                        };
                        materializer.write_row(sheet, planned.row, values, styles)?;
                    }
                }
            }
            Materializer::auto_size(sheet, width);
            debug!(
                "built categorized sheet '{}' with {} categories",
                data.name,
                data.groups.len()
            );
        }
        Ok(workbook)
    }

    fn render(&self, failure: &str) -> Result<Rendered> {
        let workbook = self.build()?;
        serialize(&workbook, failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;
    use sheetcraft_core::{CellValue, FillStyle};

    fn writer() -> CategorizedWriter {
        CategorizedWriter::new("unused.xlsx")
            .sheet("Stock")
            .header(["Item", "Qty"])
            .unwrap()
            .category(values!["Fruit"])
            .detail(values!["Apple", 12])
            .unwrap()
            .detail(values!["Pear", 4])
            .unwrap()
            .category(values!["Veg"])
    }

    #[test]
    fn test_rows_and_styles() {
        let wb = writer().build().unwrap();
        let ws = wb.worksheet(0).unwrap();

        assert_eq!(ws.get_value_at(0, 0), CellValue::string("Item"));
        let header = ws.cell_style_at(0, 1).unwrap();
        assert!(header.font.bold);
        assert_eq!(header.font.size, 12.0);
        assert_eq!(header.fill, FillStyle::solid(Color::GREY_25_PERCENT));

        assert_eq!(ws.get_value_at(1, 0), CellValue::string("Fruit"));
        assert_eq!(
            ws.cell_style_at(1, 0).unwrap().fill,
            FillStyle::solid(Color::LIGHT_BLUE)
        );
        assert_eq!(ws.get_value_at(3, 1), CellValue::Number(4.0));
        let detail = ws.cell_style_at(3, 1).unwrap();
        assert_eq!(detail.font.size, 10.0);
        assert!(!detail.font.bold);
        assert_eq!(ws.get_value_at(4, 0), CellValue::string("Veg"));
        assert_eq!(ws.last_row(), Some(4));
    }

    #[test]
    fn test_without_header_starts_at_row_zero() {
        let wb = CategorizedWriter::new("x.xlsx")
            .category(values!["Only"])
            .build()
            .unwrap();
        let ws = wb.worksheet(0).unwrap();
        assert_eq!(ws.name(), "Sheet1");
        assert_eq!(ws.get_value_at(0, 0), CellValue::string("Only"));
    }

    #[test]
    fn test_detail_first_is_rejected() {
        let err = CategorizedWriter::new("x.xlsx")
            .sheet("S")
            .detail(values!["orphan"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot add detail row without a category. Call category() first."
        );
    }
}
