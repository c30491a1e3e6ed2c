//! One place to start every reader and writer

use std::io::Read;
use std::path::PathBuf;

use crate::error::Result;
use crate::reader::ExcelReader;
use crate::template::TemplateSource;
use crate::writer::{
    AlternatingRowsWriter, CategorizedTemplateWriter, CategorizedWriter, ExcelWriter,
    FormTemplateWriter,
};

/// Entry points for reading workbooks and building reports.
///
/// ```no_run
/// use sheetcraft::{values, ExcelIo};
///
/// ExcelIo::write("out/people.xlsx")
///     .sheet("People")
///     .header(["Name", "Age"])?
///     .row(values!["Ann", 34])
///     .save()?;
///
/// let rows = ExcelIo::read("out/people.xlsx").as_maps()?;
/// assert_eq!(rows.len(), 1);
/// # Ok::<(), sheetcraft::ExcelIoError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ExcelIo;

impl ExcelIo {
    pub fn write<P: Into<PathBuf>>(path: P) -> ExcelWriter {
        ExcelWriter::new(path)
    }

    pub fn write_categorized<P: Into<PathBuf>>(path: P) -> CategorizedWriter {
        CategorizedWriter::new(path)
    }

    pub fn read<P: Into<PathBuf>>(path: P) -> ExcelReader {
        ExcelReader::open(path)
    }

    pub fn read_bytes<B: Into<Vec<u8>>>(bytes: B) -> ExcelReader {
        ExcelReader::from_bytes(bytes)
    }

    /// Reader over the whole of `reader`, drained now
    pub fn read_stream<R: Read + ?Sized>(reader: &mut R) -> Result<ExcelReader> {
        ExcelReader::from_reader(reader)
    }

    pub fn form_template<T: Into<TemplateSource>>(template: T) -> FormTemplateWriter {
        FormTemplateWriter::new(template)
    }

    pub fn categorized_from_template<T: Into<TemplateSource>>(
        template: T,
    ) -> CategorizedTemplateWriter {
        CategorizedTemplateWriter::new(template)
    }

    pub fn alternating_rows<T: Into<TemplateSource>>(template: T) -> AlternatingRowsWriter {
        AlternatingRowsWriter::new(template)
    }
}
