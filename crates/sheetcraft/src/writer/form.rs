//! Business forms: placeholders in fixed regions around a growable table

use std::io::Write;
use std::path::Path;

use log::debug;
use sheetcraft_core::Worksheet;

use super::{collect_values, open_template, serialize, template_last_row, template_sheet};
use crate::encoding::Encoding;
use crate::error::Result;
use crate::layout::{FormLayout, RowRole};
use crate::materialize::{DecimalMode, Materializer, Value};
use crate::output::{save_rendered, write_rendered, Rendered};
use crate::placeholder::{substitute, Placeholders};
use crate::styles::DonorStyles;
use crate::template::TemplateSource;

const TOO_SHORT: &str =
    "Form template must have at least 16 rows (0-15) for the standard form structure";
const WRITE_TO_FAILED: &str = "Failed to process form template and write to output stream";
const TO_BYTES_FAILED: &str = "Failed to process form template to byte array";

fn save_failed(path: &Path) -> String {
    format!(
        "Failed to process form template and save Excel file: {}",
        path.display()
    )
}

/// Fills a 16-row form template.
///
/// `{{key}}` and `${key}` in the header (rows 0-5) and footer (rows 10-15)
/// are replaced with the values set here. Line items go into the table
/// starting at row 7, alternating the styles of rows 7 and 8; the footer
/// moves down when there are more than two.
///
/// ```no_run
/// use sheetcraft::{values, FormTemplateWriter};
///
/// FormTemplateWriter::new("templates/invoice.xlsx")
///     .set_value("customer", "ACME Corp")
///     .set_value("invoice", "INV-0042")
///     .line_item(values!["Widget", 3, 9.99])
///     .line_item(values!["Gadget", 1, 24.5])
///     .save_as("out/invoice.xlsx")?;
/// # Ok::<(), sheetcraft::ExcelIoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FormTemplateWriter {
    template: TemplateSource,
    placeholders: Placeholders,
    line_items: Vec<Vec<Value>>,
    encoding: Encoding,
    decimal_mode: DecimalMode,
}

impl FormTemplateWriter {
    pub fn new<T: Into<TemplateSource>>(template: T) -> Self {
        Self {
            template: template.into(),
            placeholders: Placeholders::new(),
            line_items: Vec::new(),
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

    /// Value for `{{key}}` / `${key}`; a later call for the same key wins
    pub fn set_value<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.placeholders.set(key, value);
        self
    }

    pub fn set_values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.placeholders.extend(values);
        self
    }

    pub fn line_item<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.line_items.push(collect_values(values));
        self
    }

    pub fn line_items<I, R, V>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.line_items
            .extend(items.into_iter().map(collect_values));
        self
    }

    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        save_rendered(path, &save_failed(path), |failure| self.render(failure))
    }

    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        write_rendered(out, WRITE_TO_FAILED, |failure| self.render(failure))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.render(TO_BYTES_FAILED)?.into_bytes())
    }

    fn render(&self, failure: &str) -> Result<Rendered> {
        let mut workbook = open_template(&self.template, failure)?;
        let sheet = template_sheet(&mut workbook)?;
        let last = template_last_row(sheet, FormLayout::MIN_ROWS, TOO_SHORT)?;
        self.fill(sheet, last)?;
        serialize(&workbook, failure)
    }

    fn fill(&self, sheet: &mut Worksheet, template_last_row: u32) -> Result<()> {
        let materializer = Materializer::new(self.encoding, self.decimal_mode);
        for row in FormLayout::HEADER_REGION.chain(FormLayout::footer_region()) {
            self.replace_placeholders(sheet, row);
        }

        let plan = FormLayout::plan(self.line_items.len(), template_last_row);
        if let Some(shift) = plan.shift {
            debug!("moving form footer down {} rows", shift.count);
            sheet.shift_rows(shift.start, shift.count)?;
        }

        let odd = DonorStyles::extract(sheet, FormLayout::ODD_DONOR_ROW);
        let even = DonorStyles::extract(sheet, FormLayout::EVEN_DONOR_ROW);
        for (planned, values) in plan.rows.iter().zip(&self.line_items) {
            if planned.row <= FormLayout::EVEN_DONOR_ROW {
                sheet.clear_row_values(planned.row);
            }
            let styles = if planned.role == RowRole::LineItemOdd {
                &odd
            } else {
                &even
            };
            materializer.write_row(sheet, planned.row, values, styles)?;
        }
        for &row in &plan.blanks {
            sheet.clear_row_values(row);
        }
        if let Some(removals) = plan.removals {
            debug!("removing rows {:?} past the form footer", removals);
            for row in removals {
                sheet.remove_row(row);
            }
        }

        // Width of the topmost row drives the column fit
        let first_row = sheet.row_indices().next();
        if let Some(first) = first_row {
            let columns = sheet.row_len(first) as usize;
            Materializer::auto_size(sheet, columns);
        }
        debug!(
            "filled form with {} placeholders and {} line items",
            self.placeholders.len(),
            self.line_items.len()
        );
        Ok(())
    }

    /// Rewrite string cells of `row` whose text contains a placeholder.
    /// Cells whose text does not change are left as they are.
    fn replace_placeholders(&self, sheet: &mut Worksheet, row: u32) {
        let encoding = self.encoding;
        sheet.map_row_strings(row, |text| {
            let replaced = substitute(text, &self.placeholders);
            (replaced != text).then(|| encoding.normalize(&replaced).into_owned())
        });
    }
}
