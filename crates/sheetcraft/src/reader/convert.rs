//! Cell to [`Value`] conversion, untyped and typed

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sheetcraft_core::{serial_to_datetime, CellData, CellValue, Worksheet};

use super::DataType;
use crate::error::{ExcelIoError, Result};
use crate::materialize::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

fn is_date_formatted(sheet: &Worksheet, cell: &CellData) -> bool {
    sheet
        .style_by_index(cell.style_index)
        .is_some_and(|style| style.number_format.is_date_format())
}

/// Integral numbers become `Int`, others `Float`
fn number(n: f64) -> Value {
    if n.is_finite() && n == n.floor() {
        Value::Int(n as i64)
    } else {
        Value::Float(n)
    }
}

/// The natural value of a cell: text, integer or float, date-time for
/// date-formatted numbers, boolean, or the cached result of a formula.
/// Blank and error cells are null.
pub(crate) fn natural_value(sheet: &Worksheet, cell: &CellData) -> Value {
    match &cell.value {
        CellValue::String(s) => Value::Text(s.as_str().to_string()),
        CellValue::Number(n) if is_date_formatted(sheet, cell) => {
            serial_to_datetime(*n).map_or_else(|| number(*n), Value::DateTime)
        }
        CellValue::Number(n) => number(*n),
        CellValue::Boolean(b) => Value::Bool(*b),
        CellValue::Formula {
            cached_value: Some(cached),
            ..
        } => match cached.effective_value() {
            CellValue::Number(n) => number(*n),
            CellValue::String(s) => Value::Text(s.as_str().to_string()),
            CellValue::Boolean(b) => Value::Bool(*b),
            other => Value::Text(other.to_string()),
        },
        CellValue::Formula { .. } | CellValue::Error(_) | CellValue::Empty => Value::Null,
    }
}

/// Header label of a cell
pub(crate) fn cell_text(cell: Option<&CellData>) -> String {
    cell.map(|c| c.value.to_string()).unwrap_or_default()
}

fn parse<T: FromStr>(text: &str) -> Option<T> {
    text.trim().parse().ok()
}

fn parse_with<T>(
    text: &str,
    formats: &[&str],
    f: fn(&str, &str) -> chrono::ParseResult<T>,
) -> Option<T> {
    let text = text.trim();
    formats.iter().find_map(|format| f(text, format).ok())
}

/// Convert the cell at (`row`, `col`) to `data_type`.
///
/// A numeric cell is cast to the target number type; any other cell is
/// parsed from its text. Dates, times and date-times come from
/// date-formatted numbers or ISO-8601 text. A missing or blank cell is null.
pub(crate) fn typed_value(
    sheet: &Worksheet,
    row: u32,
    col: u16,
    data_type: DataType,
) -> Result<Value> {
    let Some(cell) = sheet.cell_at(row, col).filter(|c| !c.value.is_empty()) else {
        return Ok(Value::Null);
    };
    let text = cell.value.to_string();
    let numeric = match &cell.value {
        CellValue::Number(n) => Some(*n),
        _ => None,
    };
    let serial = numeric
        .filter(|_| is_date_formatted(sheet, cell))
        .and_then(serial_to_datetime);

    let converted = match data_type {
        DataType::String => Some(Value::Text(text.clone())),
        DataType::Boolean => Some(Value::Bool(match cell.value {
            CellValue::Boolean(b) => b,
            _ => text.trim().eq_ignore_ascii_case("true"),
        })),
        DataType::Integer => numeric
            .map(|n| Value::Int((n as i32).into()))
            .or_else(|| parse::<i32>(&text).map(|n| Value::Int(n.into()))),
        DataType::Long => numeric
            .map(|n| Value::Int(n as i64))
            .or_else(|| parse::<i64>(&text).map(Value::Int)),
        DataType::Short => numeric
            .map(|n| Value::Int((n as i16).into()))
            .or_else(|| parse::<i16>(&text).map(|n| Value::Int(n.into()))),
        DataType::Byte => numeric
            .map(|n| Value::Int((n as i8).into()))
            .or_else(|| parse::<i8>(&text).map(|n| Value::Int(n.into()))),
        DataType::Float => numeric
            .map(|n| Value::Float((n as f32).into()))
            .or_else(|| parse::<f32>(&text).map(|n| Value::Float(n.into()))),
        DataType::Double => numeric
            .map(Value::Float)
            .or_else(|| parse::<f64>(&text).map(Value::Float)),
        DataType::Decimal => numeric
            .and_then(|n| Decimal::from_str(&n.to_string()).ok())
            .or_else(|| parse::<Decimal>(&text))
            .map(Value::Decimal),
        DataType::Date => serial
            .map(|dt| dt.date())
            .or_else(|| parse_with(&text, &[DATE_FORMAT], NaiveDate::parse_from_str))
            .map(Value::Date),
        DataType::Time => serial
            .map(|dt| dt.time())
            .or_else(|| parse_with(&text, &TIME_FORMATS, NaiveTime::parse_from_str))
            .map(Value::Time),
        DataType::DateTime => serial
            .or_else(|| parse_with(&text, &DATETIME_FORMATS, NaiveDateTime::parse_from_str))
            .map(Value::DateTime),
    };

    converted.ok_or_else(|| {
        ExcelIoError::new(format!(
            "Failed to convert cell value '{}' to type {} at row {}, column {}",
            text, data_type, row, col
        ))
    })
}
