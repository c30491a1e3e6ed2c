//! # sheetcraft
//!
//! Template-driven XLSX reports and typed spreadsheet reading.
//!
//! A designer formats a small template workbook in Excel; sheetcraft copies
//! the formatting of its donor rows onto generated data. Four report shapes
//! are supported:
//!
//! - [`AlternatingRowsWriter`] - header plus zebra-striped rows
//! - [`CategorizedTemplateWriter`] - category rows with nested detail rows
//! - [`FormTemplateWriter`] - a fixed 16-row form with `{{placeholders}}`
//!   and a line-item table that grows
//! - [`ExcelWriter`] and [`CategorizedWriter`] - the same shapes without a
//!   template, using built-in styles
//!
//! [`ExcelReader`] reads sheets back as header-keyed maps or rows, either
//! with each cell's natural type or converted per declared column
//! [`DataType`].
//!
//! Templates are read into memory once per render and never modified;
//! every render parses its own workbook from those bytes.
//!
//! ## Example
//!
//! ```no_run
//! use sheetcraft::prelude::*;
//!
//! ExcelIo::alternating_rows("templates/striped.xlsx")
//!     .sheet("Orders")
//!     .header(["Order", "Customer", "Total"])?
//!     .row(values![1001, "ACME", 250.0])
//!     .row(values![1002, "Globex", 99.5])
//!     .save_as("out/orders.xlsx")?;
//!
//! let _orders = ExcelIo::read("out/orders.xlsx")
//!     .with_types(&["order:i64", "customer:string", "total:decimal"])?
//!     .as_maps()?;
//! # Ok::<(), sheetcraft::ExcelIoError>(())
//! ```

pub mod encoding;
pub mod error;
pub mod io;
pub mod layout;
pub mod materialize;
pub mod output;
pub mod placeholder;
pub mod prelude;
pub mod reader;
pub mod styles;
pub mod template;
pub mod writer;

pub use encoding::Encoding;
pub use error::{ExcelIoError, Result};
pub use io::ExcelIo;
pub use materialize::{DecimalMode, Materializer, Value};
pub use placeholder::Placeholders;
pub use reader::{DataType, ExcelReader, RowMap};
pub use template::TemplateSource;
pub use writer::{
    AlternatingRowsWriter, CategorizedTemplateWriter, CategorizedWriter, ExcelWriter,
    FormTemplateWriter, IntoRecord, Record,
};

// Re-export the model for callers that post-process workbooks
pub use sheetcraft_core::{
    CellValue, Color, FillStyle, FontStyle, NumberFormat, Style, Workbook, Worksheet,
};
pub use sheetcraft_xlsx::{XlsxError, XlsxReader, XlsxWriter};
