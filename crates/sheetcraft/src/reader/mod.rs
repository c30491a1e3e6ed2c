//! Reading sheets back as rows or header-keyed maps.
//!
//! Without column metadata every cell keeps its natural type. With
//! metadata ([`ExcelReader::with_types`] or [`ExcelReader::with_metadata`])
//! each column is converted to its declared [`DataType`] and a cell that
//! does not convert fails the read.

mod convert;
mod data_type;

pub use data_type::DataType;

use std::io::Read;
use std::path::PathBuf;

use log::debug;
use sheetcraft_core::{Workbook, Worksheet};
use sheetcraft_xlsx::XlsxReader;

use crate::error::{ExcelIoError, Result};
use crate::materialize::Value;
use crate::writer::{IntoRecord, Record};
use convert::{cell_text, natural_value, typed_value};

const READ_FAILED: &str = "Failed to read Excel file";
const METADATA_TOO_SHORT: &str = "Metadata file must have at least 2 rows: names and types";

/// One row keyed by column name, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap {
    entries: Vec<(String, Value)>,
}

impl RowMap {
    /// A repeated key keeps its first position and takes the new value
    fn insert(&mut self, key: String, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for RowMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Read maps can be written straight back with `sheet_with`
impl IntoRecord for RowMap {
    fn into_record(self) -> Record {
        Record::Fields(self.entries)
    }
}

/// Declared column names and types, index-aligned
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMetadata {
    names: Vec<String>,
    types: Vec<DataType>,
}

impl ColumnMetadata {
    fn new(names: Vec<String>, types: Vec<DataType>) -> Result<Self> {
        if names.len() != types.len() {
            return Err(ExcelIoError::new("Column names and types must have the same size"));
        }
        Ok(Self { names, types })
    }

    /// `name:type` definitions
    fn parse<S: AsRef<str>>(definitions: &[S]) -> Result<Self> {
        let mut names = Vec::with_capacity(definitions.len());
        let mut types = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let definition = definition.as_ref();
            let parts: Vec<&str> = definition.split(':').collect();
            let (name, type_name) = match parts.as_slice() {
                [name, type_name] => (*name, *type_name),
                _ => {
                    return Err(ExcelIoError::new(format!(
                        "Invalid column definition: {}. Use 'name:type' format.",
                        definition
                    )))
                }
            };
            let data_type = type_name.parse::<DataType>().map_err(|e| {
                ExcelIoError::new(format!(
                    "Unsupported data type: {} in definition: {}. {}",
                    type_name,
                    definition,
                    e.message()
                ))
            })?;
            names.push(name.trim().to_string());
            types.push(data_type);
        }
        Self::new(names, types)
    }

    /// Row 0 of the first sheet holds names, row 1 the types. A name
    /// without a type cell is read as text.
    fn from_workbook(workbook: &Workbook) -> Result<Self> {
        let sheet = workbook
            .worksheet(0)
            .filter(|s| s.row_exists(0) && s.row_exists(1))
            .ok_or_else(|| ExcelIoError::new(METADATA_TOO_SHORT))?;

        let names: Vec<String> = (0..sheet.row_len(0))
            .map(|col| cell_text(sheet.cell_at(0, col)))
            .collect();
        let mut types = Vec::with_capacity(names.len());
        for col in 0..sheet.row_len(0) {
            let type_name = sheet
                .cell_at(1, col)
                .map(|c| c.value.to_string().trim().to_string())
                .unwrap_or_else(|| DataType::String.java_name().to_string());
            let data_type = type_name.parse::<DataType>().map_err(|e| {
                ExcelIoError::new(format!(
                    "Unsupported data type: {} at column {}. {}",
                    type_name,
                    col,
                    e.message()
                ))
            })?;
            types.push(data_type);
        }
        Self::new(names, types)
    }
}

#[derive(Debug, Clone)]
enum Input {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl Input {
    fn workbook(&self) -> Result<Workbook> {
        let workbook = match self {
            Input::Path(path) => XlsxReader::read_file(path),
            Input::Bytes(bytes) => XlsxReader::read_bytes(bytes),
        };
        workbook.map_err(|e| ExcelIoError::with_source(READ_FAILED, e))
    }
}

/// Reads one sheet (or every sheet) of a workbook.
///
/// ```no_run
/// use sheetcraft::ExcelReader;
///
/// let people = ExcelReader::open("people.xlsx")
///     .with_types(&["name:string", "age:i32", "joined:date"])?
///     .sheet_named("People")
///     .as_maps()?;
/// for person in &people {
///     println!("{:?} is {:?}", person.get("name"), person.get("age"));
/// }
/// # Ok::<(), sheetcraft::ExcelIoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExcelReader {
    input: Input,
    sheet: Option<String>,
    has_headers: bool,
    metadata: Option<ColumnMetadata>,
}

impl ExcelReader {
    fn with_input(input: Input) -> Self {
        Self {
            input,
            sheet: None,
            has_headers: true,
            metadata: None,
        }
    }

    /// Read from `path`; the file is opened by each query
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_input(Input::Path(path.into()))
    }

    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self::with_input(Input::Bytes(bytes.into()))
    }

    /// Drain `reader` into memory
    pub fn from_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ExcelIoError::with_source(READ_FAILED, e))?;
        Ok(Self::from_bytes(bytes))
    }

    /// Column names and types from a metadata workbook at `path`
    pub fn with_metadata<P: Into<PathBuf>>(self, path: P) -> Result<Self> {
        let path = path.into();
        let workbook = XlsxReader::read_file(&path).map_err(|e| {
            ExcelIoError::with_source(
                format!("Failed to read metadata file: {}", path.display()),
                e,
            )
        })?;
        self.metadata_from(&workbook)
    }

    /// Column names and types from an in-memory metadata workbook
    pub fn with_metadata_bytes(self, bytes: &[u8]) -> Result<Self> {
        let workbook = XlsxReader::read_bytes(bytes)
            .map_err(|e| ExcelIoError::with_source("Failed to read metadata stream", e))?;
        self.metadata_from(&workbook)
    }

    fn metadata_from(mut self, workbook: &Workbook) -> Result<Self> {
        let metadata = ColumnMetadata::from_workbook(workbook)?;
        debug!("loaded metadata for {} columns", metadata.names.len());
        self.metadata = Some(metadata);
        Ok(self)
    }

    /// Inline column types, one `name:type` definition per column
    pub fn with_types<S: AsRef<str>>(mut self, definitions: &[S]) -> Result<Self> {
        self.metadata = Some(ColumnMetadata::parse(definitions)?);
        Ok(self)
    }

    /// Select a sheet by name. A name that matches no sheet but parses as
    /// a number selects by index.
    pub fn sheet_named<S: Into<String>>(mut self, name: S) -> Self {
        self.sheet = Some(name.into());
        self
    }

    pub fn sheet_index(mut self, index: usize) -> Self {
        self.sheet = Some(index.to_string());
        self
    }

    /// Whether the first row holds column names (default `true`)
    pub fn has_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn as_maps(&self) -> Result<Vec<RowMap>> {
        let workbook = self.input.workbook()?;
        self.sheet_maps(self.selected(&workbook)?)
    }

    pub fn as_rows(&self) -> Result<Vec<Vec<Value>>> {
        let workbook = self.input.workbook()?;
        let sheet = self.selected(&workbook)?;
        match &self.metadata {
            Some(metadata) => self
                .data_rows(sheet)
                .map(|row| typed_values(sheet, row, metadata))
                .collect(),
            None => Ok(sheet
                .row_indices()
                .map(|row| {
                    (0..sheet.row_len(row))
                        .map(|col| natural_at(sheet, row, col))
                        .collect()
                })
                .collect()),
        }
    }

    /// Every sheet as maps, in workbook order
    pub fn all_sheets_as_maps(&self) -> Result<Vec<(String, Vec<RowMap>)>> {
        let workbook = self.input.workbook()?;
        workbook
            .worksheets()
            .map(|sheet| Ok((sheet.name().to_string(), self.sheet_maps(sheet)?)))
            .collect()
    }

    pub fn sheet_names(&self) -> Result<Vec<String>> {
        let workbook = self.input.workbook()?;
        Ok(workbook.worksheets().map(|s| s.name().to_string()).collect())
    }

    fn selected<'a>(&self, workbook: &'a Workbook) -> Result<&'a Worksheet> {
        let found = match &self.sheet {
            None => workbook.worksheet(0),
            Some(name) => workbook.worksheet_by_name(name).or_else(|| {
                name.parse::<usize>()
                    .ok()
                    .and_then(|index| workbook.worksheet(index))
            }),
        };
        found.ok_or_else(|| {
            ExcelIoError::new(format!(
                "Sheet not found: {}",
                self.sheet.as_deref().unwrap_or("0")
            ))
        })
    }

    /// Rows holding data, skipping the header row when there is one
    fn data_rows<'a>(&self, sheet: &'a Worksheet) -> impl Iterator<Item = u32> + 'a {
        sheet.row_indices().skip(usize::from(self.has_headers))
    }

    fn sheet_maps(&self, sheet: &Worksheet) -> Result<Vec<RowMap>> {
        let maps = match &self.metadata {
            Some(metadata) => self
                .data_rows(sheet)
                .map(|row| typed_row(sheet, row, metadata))
                .collect::<Result<Vec<_>>>()?,
            None => self.natural_maps(sheet),
        };
        debug!("read {} rows from sheet '{}'", maps.len(), sheet.name());
        Ok(maps)
    }

    fn natural_maps(&self, sheet: &Worksheet) -> Vec<RowMap> {
        let mut rows = sheet.row_indices();
        let Some(first) = rows.next() else {
            return Vec::new();
        };
        let first_width = sheet.row_len(first);
        let headers: Vec<String> = if self.has_headers {
            (0..first_width)
                .map(|col| cell_text(sheet.cell_at(first, col)))
                .collect()
        } else {
            (0..first_width).map(generated_name).collect()
        };

        let data = if self.has_headers {
            None
        } else {
            Some(first)
        };
        data.into_iter()
            .chain(rows)
            .map(|row| {
                let width = sheet.row_len(row);
                let columns = headers.len().max(width as usize);
                let mut map = RowMap::default();
                for i in 0..columns {
                    let key = headers
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| generated_name(i as u16));
                    let value = u16::try_from(i)
                        .ok()
                        .filter(|&col| col < width)
                        .map_or(Value::Null, |col| natural_at(sheet, row, col));
                    map.insert(key, value);
                }
                map
            })
            .collect()
    }
}

/// `Column1`, `Column2`, ... for 0-based `col`
fn generated_name(col: u16) -> String {
    format!("Column{}", u32::from(col) + 1)
}

fn natural_at(sheet: &Worksheet, row: u32, col: u16) -> Value {
    sheet
        .cell_at(row, col)
        .map_or(Value::Null, |cell| natural_value(sheet, cell))
}

/// One value per declared column
fn typed_values(sheet: &Worksheet, row: u32, metadata: &ColumnMetadata) -> Result<Vec<Value>> {
    metadata
        .types
        .iter()
        .enumerate()
        .map(|(i, data_type)| match u16::try_from(i) {
            Ok(col) => typed_value(sheet, row, col, *data_type),
            Err(_) => Ok(Value::Null),
        })
        .collect()
}

fn typed_row(sheet: &Worksheet, row: u32, metadata: &ColumnMetadata) -> Result<RowMap> {
    let mut map = RowMap::default();
    for (name, value) in metadata.names.iter().zip(typed_values(sheet, row, metadata)?) {
        map.insert(name.clone(), value);
    }
    Ok(map)
}
