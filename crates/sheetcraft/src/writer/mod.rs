//! Report writers.
//!
//! Every writer collects logical rows per sheet and renders them only when
//! asked for output, so a writer can be saved more than once. Template
//! writers re-read the template for each render.

mod alternating;
mod basic;
mod categorized;
mod categorized_template;
mod form;

pub use alternating::AlternatingRowsWriter;
pub use basic::ExcelWriter;
pub use categorized::CategorizedWriter;
pub use categorized_template::CategorizedTemplateWriter;
pub use form::FormTemplateWriter;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::path::Path;

use sheetcraft_core::{Workbook, Worksheet};

use crate::error::{ExcelIoError, Result};
use crate::materialize::Value;
use crate::output::Rendered;
use crate::template::{TemplateBuffer, TemplateSource};

pub(crate) const DEFAULT_SHEET_NAME: &str = "Sheet1";
pub(crate) const NO_SHEETS: &str = "No sheets defined. Call sheet() method first.";
pub(crate) const DETAIL_WITHOUT_CATEGORY: &str =
    "Cannot add detail row without a category. Call category() first.";
pub(crate) const TEMPLATE_WRITE_TO_FAILED: &str =
    "Failed to process template and write to output stream";
pub(crate) const TEMPLATE_TO_BYTES_FAILED: &str = "Failed to process template to byte array";
const TEMPLATE_WITHOUT_SHEETS: &str = "Template workbook has no sheets";

pub(crate) fn template_save_failed(path: &Path) -> String {
    format!(
        "Failed to process template and save Excel file: {}",
        path.display()
    )
}

/// Read the template and open a private workbook from it
pub(crate) fn open_template(source: &TemplateSource, failure: &str) -> Result<Workbook> {
    TemplateBuffer::load(source)
        .and_then(|buffer| buffer.open())
        .map_err(|e| ExcelIoError::with_source(failure, e))
}

pub(crate) fn serialize(workbook: &Workbook, failure: &str) -> Result<Rendered> {
    Rendered::from_workbook(workbook).map_err(|e| ExcelIoError::with_source(failure, e))
}

pub(crate) fn template_sheet(workbook: &mut Workbook) -> Result<&mut Worksheet> {
    workbook
        .worksheet_mut(0)
        .ok_or_else(|| ExcelIoError::new(TEMPLATE_WITHOUT_SHEETS))
}

pub(crate) fn template_sheet_ref(workbook: &Workbook) -> Result<&Worksheet> {
    workbook
        .worksheet(0)
        .ok_or_else(|| ExcelIoError::new(TEMPLATE_WITHOUT_SHEETS))
}

/// The template's last row, if it has at least `min_rows` rows
pub(crate) fn template_last_row(sheet: &Worksheet, min_rows: u32, message: &str) -> Result<u32> {
    sheet
        .last_row()
        .filter(|&last| last + 1 >= min_rows)
        .ok_or_else(|| ExcelIoError::new(message))
}

/// One item passed to `sheet_with`
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Named fields; the first record's field order defines the columns
    Fields(Vec<(String, Value)>),
    /// A value written as text into a single `Data` column
    Item(String),
}

impl Record {
    pub fn fields<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Record::Fields(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn item<T: fmt::Display>(value: T) -> Self {
        Record::Item(value.to_string())
    }

    fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Record::Fields(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Record::Item(_) => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Item(s) => f.write_str(s),
            Record::Fields(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Conversion into a [`Record`] for `sheet_with`
pub trait IntoRecord {
    fn into_record(self) -> Record;
}

impl IntoRecord for Record {
    fn into_record(self) -> Record {
        self
    }
}

impl<K: Into<String>, V: Into<Value>> IntoRecord for BTreeMap<K, V> {
    fn into_record(self) -> Record {
        Record::fields(self)
    }
}

/// Columns follow the map's iteration order
impl<K: Into<String>, V: Into<Value>, S: BuildHasher> IntoRecord for HashMap<K, V, S> {
    fn into_record(self) -> Record {
        Record::fields(self)
    }
}

impl<K: Into<String>, V: Into<Value>> IntoRecord for Vec<(K, V)> {
    fn into_record(self) -> Record {
        Record::fields(self)
    }
}

impl IntoRecord for &str {
    fn into_record(self) -> Record {
        Record::Item(self.to_string())
    }
}

impl IntoRecord for String {
    fn into_record(self) -> Record {
        Record::Item(self)
    }
}

/// Header labels of one sheet; settable once
#[derive(Debug, Clone, Default)]
pub(crate) struct Headers {
    labels: Vec<String>,
    set: bool,
}

impl Headers {
    pub(crate) fn set<I, S>(&mut self, sheet_name: &str, labels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.set {
            return Err(ExcelIoError::new(format!(
                "Headers already set for sheet: {}",
                sheet_name
            )));
        }
        self.labels = labels.into_iter().map(Into::into).collect();
        self.set = true;
        Ok(())
    }

    pub(crate) fn labels(&self) -> &[String] {
        &self.labels
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.labels.len()
    }
}

/// Header plus flat data rows
#[derive(Debug, Clone)]
pub(crate) struct SheetData {
    pub(crate) name: String,
    pub(crate) headers: Headers,
    pub(crate) rows: Vec<Vec<Value>>,
}

impl SheetData {
    pub(crate) fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            headers: Headers::default(),
            rows: Vec::new(),
        }
    }

    /// Records whose first element is a field map become header + rows in
    /// that map's field order; anything else becomes a single `Data` column.
    pub(crate) fn from_records<I, R>(name: &str, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoRecord,
    {
        let mut sheet = Self::new(name);
        let records: Vec<Record> = records.into_iter().map(IntoRecord::into_record).collect();
        let Some(first) = records.first() else {
            return sheet;
        };

        match first {
            Record::Fields(fields) => {
                let keys: Vec<String> = fields.iter().map(|(k, _)| k.clone()).collect();
                sheet.rows = records
                    .iter()
                    .map(|record| {
                        keys.iter()
                            .map(|k| record.field(k).cloned().unwrap_or_default())
                            .collect()
                    })
                    .collect();
                sheet.headers = Headers {
                    labels: keys,
                    set: true,
                };
            }
            Record::Item(_) => {
                sheet.rows = records
                    .iter()
                    .map(|record| vec![Value::Text(record.to_string())])
                    .collect();
                sheet.headers = Headers {
                    labels: vec!["Data".to_string()],
                    set: true,
                };
            }
        }
        sheet
    }

    pub(crate) fn set_headers<I, S>(&mut self, labels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.set(&self.name, labels)
    }

    /// Widest of the header and every row
    pub(crate) fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.headers.len())
    }
}

/// A category row and the detail rows added after it
#[derive(Debug, Clone)]
pub(crate) struct CategoryGroup {
    pub(crate) values: Vec<Value>,
    pub(crate) details: Vec<Vec<Value>>,
}

/// Header plus category groups
#[derive(Debug, Clone)]
pub(crate) struct CategorizedSheet {
    pub(crate) name: String,
    pub(crate) headers: Headers,
    pub(crate) groups: Vec<CategoryGroup>,
}

impl CategorizedSheet {
    pub(crate) fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            headers: Headers::default(),
            groups: Vec::new(),
        }
    }

    pub(crate) fn set_headers<I, S>(&mut self, labels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.set(&self.name, labels)
    }

    pub(crate) fn add_category(&mut self, values: Vec<Value>) {
        self.groups.push(CategoryGroup {
            values,
            details: Vec::new(),
        });
    }

    pub(crate) fn add_detail(&mut self, values: Vec<Value>) -> Result<()> {
        let group = self
            .groups
            .last_mut()
            .ok_or_else(|| ExcelIoError::new(DETAIL_WITHOUT_CATEGORY))?;
        group.details.push(values);
        Ok(())
    }

    pub(crate) fn detail_counts(&self) -> Vec<usize> {
        self.groups.iter().map(|g| g.details.len()).collect()
    }

    /// Category and detail rows in output order
    pub(crate) fn body_rows(&self) -> impl Iterator<Item = &[Value]> {
        self.groups.iter().flat_map(|g| {
            std::iter::once(g.values.as_slice()).chain(g.details.iter().map(Vec::as_slice))
        })
    }

    pub(crate) fn width(&self) -> usize {
        self.body_rows()
            .map(<[Value]>::len)
            .max()
            .unwrap_or(0)
            .max(self.headers.len())
    }
}

/// The sheet being built, creating `Sheet1` when none was declared
pub(crate) fn current_sheet<T>(
    sheets: &mut Vec<T>,
    create: impl FnOnce(&'static str) -> T,
) -> &mut T {
    if sheets.is_empty() {
        sheets.push(create(DEFAULT_SHEET_NAME));
    }
    let last = sheets.len() - 1;
    &mut sheets[last]
}

pub(crate) fn collect_values<I, V>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values.into_iter().map(Into::into).collect()
}
