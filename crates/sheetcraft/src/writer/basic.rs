//! Plain tabular writer: bold header, unstyled rows

use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use sheetcraft_core::{Style, Workbook};

use super::{collect_values, current_sheet, serialize, IntoRecord, SheetData, NO_SHEETS};
use crate::encoding::Encoding;
use crate::error::{ExcelIoError, Result};
use crate::materialize::{DecimalMode, Materializer, Value};
use crate::output::{save_rendered, write_rendered, Rendered};
use crate::styles::DonorStyles;

const TO_BYTES_FAILED: &str = "Failed to write Excel workbook to byte array";
const WRITE_TO_FAILED: &str = "Failed to write Excel workbook to output stream";

/// Builds a workbook of header + rows sheets and saves it to a path.
///
/// ```no_run
/// use sheetcraft::{values, ExcelWriter};
///
/// ExcelWriter::new("people.xlsx")
///     .sheet("People")
///     .header(["Name", "Age"])?
///     .row(values!["Ann", 34])
///     .row(values!["Bob", 27])
///     .save()?;
/// # Ok::<(), sheetcraft::ExcelIoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExcelWriter {
    path: PathBuf,
    sheets: Vec<SheetData>,
    encoding: Encoding,
    decimal_mode: DecimalMode,
}

impl ExcelWriter {
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

    /// Character set for every string written; fails for unknown labels
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

    /// Start a new sheet; later header and row calls go to it
    pub fn sheet<S: Into<String>>(mut self, name: S) -> Self {
        self.sheets.push(SheetData::new(name));
        self
    }

    /// Start a new sheet filled from `records`
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

    /// Render and write to the path given at construction
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

    /// The workbook as it would be saved
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

            let mut next_row = 0;
            if !data.headers.is_empty() {
                let bold =
                    DonorStyles::uniform(sheet, Style::new().bold(true), data.headers.len());
                materializer.write_header(sheet, 0, data.headers.labels(), &bold)?;
                next_row = 1;
            }
            for values in &data.rows {
                materializer.write_row(sheet, next_row, values, &DonorStyles::default())?;
                next_row += 1;
            }
            Materializer::auto_size(sheet, data.width());
            debug!("built sheet '{}' with {} rows", data.name, data.rows.len());
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
    use sheetcraft_core::CellValue;
    use sheetcraft_xlsx::XlsxReader;

    #[test]
    fn test_build_header_and_rows() {
        let writer = ExcelWriter::new("unused.xlsx")
            .sheet("People")
            .header(["Name", "Age"])
            .unwrap()
            .row(values!["Ann", 34])
            .rows([values!["Bob", 27], values![None::<&str>, true]]);
        let wb = writer.build().unwrap();
        let ws = wb.worksheet(0).unwrap();

        assert_eq!(ws.name(), "People");
        assert!(ws.cell_style_at(0, 1).unwrap().font.bold);
        assert_eq!(ws.get_value_at(1, 1), CellValue::Number(34.0));
        assert_eq!(ws.get_value_at(3, 0), CellValue::string(""));
        assert_eq!(ws.get_value_at(3, 1), CellValue::Boolean(true));
        assert_eq!(ws.last_row(), Some(3));
    }

    #[test]
    fn test_rows_without_sheet_use_sheet1() {
        let wb = ExcelWriter::new("x.xlsx")
            .row(values![1, 2])
            .build()
            .unwrap();
        let ws = wb.worksheet(0).unwrap();
        assert_eq!(ws.name(), "Sheet1");
        assert_eq!(ws.get_value_at(0, 0), CellValue::Number(1.0));
    }

    #[test]
    fn test_no_sheets() {
        let err = ExcelWriter::new("x.xlsx").save().unwrap_err();
        assert_eq!(err.to_string(), NO_SHEETS);
    }

    #[test]
    fn test_unknown_encoding() {
        let err = ExcelWriter::new("x.xlsx").encoding("EBCDIC-ish").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported encoding: EBCDIC-ish");
    }

    #[test]
    fn test_save_and_write_to_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.xlsx");
        let writer = ExcelWriter::new(&path)
            .sheet("A")
            .row(values!["x"])
            .sheet("B")
            .header(["only"])
            .unwrap();

        writer.save().unwrap();
        let mut sink = Vec::new();
        writer.write_to(&mut sink).unwrap();

        let from_file = XlsxReader::read_file(&path).unwrap();
        let from_sink = XlsxReader::read_bytes(&sink).unwrap();
        assert_eq!(from_file.sheet_count(), 2);
        assert_eq!(from_sink.worksheet(1).unwrap().name(), "B");
        assert_eq!(writer.to_bytes().unwrap().len(), sink.len());
    }
}
