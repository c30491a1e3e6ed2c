//! # sheetcraft-xlsx
//!
//! XLSX (Office Open XML) reader and writer for sheetcraft workbooks.
//!
//! Cell values, cell styles, row heights, column widths and merged
//! regions survive a read/write round trip. Charts, drawings, comments,
//! conditional formats and data validations are dropped on read.

pub mod error;
pub mod reader;
pub mod writer;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
