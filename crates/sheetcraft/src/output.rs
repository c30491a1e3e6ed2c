//! A finished workbook as bytes, and the three ways to deliver it

use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;
use sheetcraft_core::Workbook;
use sheetcraft_xlsx::XlsxWriter;

use crate::error::{ExcelIoError, Result};

/// Serialized XLSX bytes of one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    bytes: Vec<u8>,
}

impl Rendered {
    pub fn from_workbook(workbook: &Workbook) -> Result<Self> {
        let bytes = XlsxWriter::to_bytes(workbook)?;
        debug!(
            "serialized {} sheet(s) into {} bytes",
            workbook.sheet_count(),
            bytes.len()
        );
        Ok(Self { bytes })
    }

    /// Write to `path`, creating missing parent directories
    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ExcelIoError::with_source(
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        fs::write(path, &self.bytes).map_err(|e| {
            ExcelIoError::with_source(format!("Failed to write file: {}", path.display()), e)
        })
    }

    /// Write everything to `out` and flush it
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.bytes)?;
        out.flush()?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Render once, then deliver to a file.
///
/// Failures of the render or the write are reported as `failure`, with the
/// underlying error as cause. Nothing is written unless the render succeeds.
pub(crate) fn save_rendered<P, F>(path: P, failure: &str, render: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&str) -> Result<Rendered>,
{
    render(failure)?
        .save_as(path)
        .map_err(|e| ExcelIoError::with_source(failure, e))
}

pub(crate) fn write_rendered<W, F>(out: &mut W, failure: &str, render: F) -> Result<()>
where
    W: Write + ?Sized,
    F: FnOnce(&str) -> Result<Rendered>,
{
    render(failure)?
        .write_to(out)
        .map_err(|e| ExcelIoError::with_source(failure, e))
}
