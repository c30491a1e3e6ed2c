//! Template loading.
//!
//! A template is read into memory once per render. Every workbook a render
//! works on is parsed from that buffer, so two renders never share cells or
//! style pools and the template file itself is never written.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use sheetcraft_core::Workbook;
use sheetcraft_xlsx::XlsxReader;

use crate::error::{ExcelIoError, Result};

/// Where template bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Read from disk at render time
    Path(PathBuf),
    /// Already in memory
    Bytes(Vec<u8>),
}

impl TemplateSource {
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        TemplateSource::Path(path.into())
    }

    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Self {
        TemplateSource::Bytes(bytes.into())
    }

    /// Drain `reader` into memory. The reader stays with the caller.
    pub fn from_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ExcelIoError::with_source("Failed to read template stream", e))?;
        Ok(TemplateSource::Bytes(bytes))
    }

    /// Find a template by relative name: the filesystem first, then the
    /// `bundled` `(name, bytes)` pairs (typically `include_bytes!` data).
    /// A leading `/` on `name` is ignored for the bundled lookup.
    pub fn resolve(name: &str, bundled: &[(&str, &[u8])]) -> Result<Self> {
        let path = Path::new(name);
        if path.is_file() {
            return Ok(TemplateSource::Path(path.to_path_buf()));
        }
        let wanted = name.trim_start_matches('/');
        bundled
            .iter()
            .find(|(bundled_name, _)| bundled_name.trim_start_matches('/') == wanted)
            .map(|(_, bytes)| TemplateSource::Bytes(bytes.to_vec()))
            .ok_or_else(|| ExcelIoError::new(format!("Template not found: {}", name)))
    }
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        TemplateSource::Path(path)
    }
}

impl From<&Path> for TemplateSource {
    fn from(path: &Path) -> Self {
        TemplateSource::Path(path.to_path_buf())
    }
}

impl From<&str> for TemplateSource {
    fn from(path: &str) -> Self {
        TemplateSource::Path(PathBuf::from(path))
    }
}

impl From<String> for TemplateSource {
    fn from(path: String) -> Self {
        TemplateSource::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for TemplateSource {
    fn from(bytes: Vec<u8>) -> Self {
        TemplateSource::Bytes(bytes)
    }
}

impl From<&[u8]> for TemplateSource {
    fn from(bytes: &[u8]) -> Self {
        TemplateSource::Bytes(bytes.to_vec())
    }
}

/// Template bytes held for the duration of one render
#[derive(Debug, Clone)]
pub struct TemplateBuffer {
    bytes: Vec<u8>,
}

impl TemplateBuffer {
    /// Read the source once
    pub fn load(source: &TemplateSource) -> Result<Self> {
        let bytes = match source {
            TemplateSource::Path(path) => fs::read(path).map_err(|e| {
                ExcelIoError::with_source(format!("Failed to read template: {}", path.display()), e)
            })?,
            TemplateSource::Bytes(bytes) => bytes.clone(),
        };
        debug!("loaded template ({} bytes)", bytes.len());
        Ok(Self { bytes })
    }

    /// Parse a new, independent workbook from the buffer
    pub fn open(&self) -> Result<Workbook> {
        XlsxReader::read_bytes(&self.bytes)
            .map_err(|e| ExcelIoError::with_source("Failed to open template workbook", e))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetcraft_core::CellValue;
    use sheetcraft_xlsx::XlsxWriter;
    use std::error::Error as _;

    fn template_bytes() -> Vec<u8> {
        let mut wb = Workbook::with_sheet("Template").unwrap();
        let ws = wb.worksheet_mut(0).unwrap();
        ws.set_cell_value_at(0, 0, "Header").unwrap();
        XlsxWriter::to_bytes(&wb).unwrap()
    }

    #[test]
    fn test_open_gives_independent_workbooks() {
        let buffer = TemplateBuffer::load(&TemplateSource::from_bytes(template_bytes())).unwrap();
        let mut first = buffer.open().unwrap();
        let second = buffer.open().unwrap();

        first
            .worksheet_mut(0)
            .unwrap()
            .set_cell_value_at(0, 0, "Changed")
            .unwrap();

        assert_eq!(
            second.worksheet(0).unwrap().get_value_at(0, 0),
            CellValue::string("Header")
        );
        assert_ne!(
            first.worksheet(0).unwrap().id(),
            second.worksheet(0).unwrap().id()
        );
    }

    #[test]
    fn test_strings_are_paths() {
        let source = TemplateSource::from("templates/invoice.xlsx");
        assert!(matches!(
            &source,
            TemplateSource::Path(p) if p.as_path() == Path::new("templates/invoice.xlsx")
        ));
        let source: TemplateSource = String::from("report.xlsx").into();
        assert!(matches!(
            &source,
            TemplateSource::Path(p) if p.as_path() == Path::new("report.xlsx")
        ));
        assert!(matches!(TemplateSource::from(vec![1u8]), TemplateSource::Bytes(_)));
    }

    #[test]
    fn test_missing_file() {
        let source = TemplateSource::from_path("/definitely/not/here.xlsx");
        let err = TemplateBuffer::load(&source).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read template"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_corrupt_archive() {
        let buffer = TemplateBuffer::load(&TemplateSource::from_bytes(b"not a zip".to_vec())).unwrap();
        let err = buffer.open().unwrap_err();
        assert_eq!(err.to_string(), "Failed to open template workbook");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_reader_drains_once() {
        let bytes = template_bytes();
        let mut cursor = std::io::Cursor::new(bytes.clone());
        let source = TemplateSource::from_reader(&mut cursor).unwrap();
        assert_eq!(source, TemplateSource::Bytes(bytes));
        assert_eq!(cursor.position() as usize, cursor.get_ref().len());
    }

    #[test]
    fn test_resolve_prefers_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.xlsx");
        fs::write(&path, b"disk").unwrap();
        let name = path.to_str().unwrap();

        let bundled: &[(&str, &[u8])] = &[(name, b"bundled")];
        assert_eq!(
            TemplateSource::resolve(name, bundled).unwrap(),
            TemplateSource::Path(path.clone())
        );

        let bundled: &[(&str, &[u8])] = &[("templates/form.xlsx", b"bundled")];
        assert_eq!(
            TemplateSource::resolve("/templates/form.xlsx", bundled).unwrap(),
            TemplateSource::Bytes(b"bundled".to_vec())
        );
        assert!(TemplateSource::resolve("templates/none.xlsx", bundled).is_err());
    }
}
