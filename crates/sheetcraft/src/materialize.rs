//! Typed values and writing them into cells

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sheetcraft_core::{CellValue, Worksheet, MAX_COLS};

use crate::encoding::Encoding;
use crate::error::{ExcelIoError, Result};
use crate::styles::DonorStyles;

/// A value supplied by the caller or produced by a reader
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Anything else, already rendered as text
    Other(String),
}

impl Value {
    /// Wrap any displayable value as [`Value::Other`]
    pub fn other<T: fmt::Display>(value: T) -> Self {
        Value::Other(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Other(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Any numeric variant as `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Text form used for placeholders and for the `Other` fallback.
/// Dates and times use ISO 8601; null is empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) | Value::Other(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Build a `Vec<Value>` from mixed literals: `values!["Widget", 3, 9.99, None::<i32>]`
#[macro_export]
macro_rules! values {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::Value::from($value)),*]
    };
}

/// How [`Value::Decimal`] is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalMode {
    /// A numeric cell; digits beyond `f64` precision are lost
    #[default]
    Float,
    /// A text cell holding the exact decimal
    Text,
}

/// Writes logical rows into a sheet with one encoding and decimal policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Materializer {
    encoding: Encoding,
    decimal_mode: DecimalMode,
}

impl Materializer {
    pub fn new(encoding: Encoding, decimal_mode: DecimalMode) -> Self {
        Self {
            encoding,
            decimal_mode,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// A text cell normalized through the configured encoding
    pub fn text(&self, s: &str) -> CellValue {
        CellValue::string(self.encoding.normalize(s))
    }

    /// The cell a value becomes: null is an empty string, numbers are
    /// `f64`, everything without a native cell type is its text form.
    pub fn cell_value(&self, value: &Value) -> CellValue {
        match value {
            Value::Null => CellValue::string(""),
            Value::Text(s) | Value::Other(s) => self.text(s),
            Value::Int(n) => CellValue::Number(*n as f64),
            Value::Float(n) => CellValue::Number(*n),
            Value::Decimal(d) => match self.decimal_mode {
                DecimalMode::Float => d
                    .to_f64()
                    .map_or_else(|| self.text(&d.to_string()), CellValue::Number),
                DecimalMode::Text => self.text(&d.to_string()),
            },
            Value::Bool(b) => CellValue::Boolean(*b),
            other => self.text(&other.to_string()),
        }
    }

    /// Write `values` from column 0, attaching the donor style of each
    /// column where the donor had one. Other cells keep their own style.
    pub fn write_row(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        values: &[Value],
        styles: &DonorStyles,
    ) -> Result<()> {
        for (i, value) in values.iter().enumerate() {
            let col = column(i)?;
            if let Some(handle) = styles.get(col) {
                sheet.apply_style(row, col, handle)?;
            }
            sheet.set_cell_value_at(row, col, self.cell_value(value))?;
        }
        Ok(())
    }

    /// Write header labels the same way as a data row
    pub fn write_header(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        headers: &[String],
        styles: &DonorStyles,
    ) -> Result<()> {
        for (i, header) in headers.iter().enumerate() {
            let col = column(i)?;
            if let Some(handle) = styles.get(col) {
                sheet.apply_style(row, col, handle)?;
            }
            sheet.set_cell_value_at(row, col, self.text(header))?;
        }
        Ok(())
    }

    /// Fit columns `0..columns` to their content
    pub fn auto_size(sheet: &mut Worksheet, columns: usize) {
        let columns = u16::try_from(columns).unwrap_or(MAX_COLS).min(MAX_COLS);
        for col in 0..columns {
            sheet.auto_size_column(col);
        }
    }
}

fn column(index: usize) -> Result<u16> {
    u16::try_from(index)
        .ok()
        .filter(|&col| col < MAX_COLS)
        .ok_or_else(|| {
            ExcelIoError::new(format!(
                "Row has {} values; a sheet holds at most {} columns",
                index + 1,
                MAX_COLS
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetcraft_core::{Color, Style, Workbook};
    use std::str::FromStr;

    #[test]
    fn test_coercion() {
        let m = Materializer::default();
        assert_eq!(m.cell_value(&Value::Null), CellValue::string(""));
        assert_eq!(m.cell_value(&7i32.into()), CellValue::Number(7.0));
        assert_eq!(m.cell_value(&Value::from(2.5f32)), CellValue::Number(2.5));
        assert_eq!(m.cell_value(&true.into()), CellValue::Boolean(true));
        assert_eq!(m.cell_value(&None::<i32>.into()), CellValue::string(""));

        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(m.cell_value(&date.into()), CellValue::string("2024-03-09"));
        let at = date.and_hms_opt(14, 5, 0).unwrap();
        assert_eq!(m.cell_value(&at.into()), CellValue::string("2024-03-09T14:05:00"));
    }

    #[test]
    fn test_decimal_modes() {
        let price = Decimal::from_str("12345678901234.5678").unwrap();
        let float = Materializer::default().cell_value(&price.into());
        let n = float.as_number().unwrap();
        assert!((n - 12345678901234.5678).abs() < 0.01);

        let exact = Materializer::new(Encoding::UTF_8, DecimalMode::Text).cell_value(&price.into());
        assert_eq!(exact, CellValue::string("12345678901234.5678"));
    }

    #[test]
    fn test_text_is_normalized() {
        let latin = Encoding::for_label("latin1").unwrap();
        let m = Materializer::new(latin, DecimalMode::Float);
        assert_eq!(m.cell_value(&"Zoë 東".into()), CellValue::string("Zoë ?"));
    }

    #[test]
    fn test_values_macro() {
        let row = crate::values!["Widget", 3, 9.5, None::<&str>, false];
        assert_eq!(
            row,
            vec![
                Value::Text("Widget".into()),
                Value::Int(3),
                Value::Float(9.5),
                Value::Null,
                Value::Bool(false),
            ]
        );
    }

    #[test]
    fn test_write_row_applies_donor_styles() {
        let mut wb = Workbook::with_sheet("S").unwrap();
        let ws = wb.worksheet_mut(0).unwrap();
        let shaded = Style::new().fill_color(Color::LIGHT_BLUE);
        let kept = Style::new().italic(true);
        ws.set_cell_style_at(1, 0, &shaded).unwrap();
        ws.set_cell_style_at(4, 1, &kept).unwrap();
        let donors = DonorStyles::extract(ws, 1);

        Materializer::default()
            .write_row(ws, 4, &crate::values!["a", 1], &donors)
            .unwrap();

        assert_eq!(ws.cell_style_at(4, 0), Some(&shaded));
        assert_eq!(ws.cell_style_at(4, 1), Some(&kept));
        assert_eq!(ws.get_value_at(4, 1), CellValue::Number(1.0));
    }

    #[test]
    fn test_auto_size_widens_columns() {
        let mut ws = Worksheet::new("S");
        ws.set_cell_value_at(0, 0, "a fairly long label").unwrap();
        let before = ws.column_width(0);
        Materializer::auto_size(&mut ws, 2);
        assert!(ws.column_width(0) > before);
    }
}
