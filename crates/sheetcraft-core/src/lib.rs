//! # sheetcraft-core
//!
//! In-memory spreadsheet model shared by the sheetcraft reader, writer and
//! template engine.
//!
//! - [`CellValue`] - what a cell holds
//! - [`CellAddress`] and [`CellRange`] - A1 addressing
//! - [`Style`] and [`StylePool`] - formatting, deduplicated per worksheet
//! - [`Worksheet`] - sparse cells plus the row operations templates need
//!   (shifting, removal, blanking) and [`StyleHandle`]s bound to one sheet
//! - [`Workbook`] - ordered worksheets
//!
//! ## Example
//!
//! ```rust
//! use sheetcraft_core::{CellValue, Style, Workbook};
//!
//! let mut workbook = Workbook::with_sheet("Report").unwrap();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value_at(0, 0, "Name").unwrap();
//! let bold = sheet.register_style(Style::new().bold(true));
//! sheet.apply_style(0, 0, bold).unwrap();
//!
//! sheet.shift_rows(0, 2).unwrap();
//! assert_eq!(sheet.get_value_at(2, 0), CellValue::string("Name"));
//! ```

pub mod cell;
pub mod error;
pub mod style;
pub mod workbook;
pub mod worksheet;

pub use cell::{
    datetime_to_serial, serial_to_datetime, CellAddress, CellData, CellError, CellRange, CellValue,
    SharedString,
};
pub use error::{Error, Result};
pub use workbook::Workbook;
pub use worksheet::{SheetId, StyleHandle, Worksheet};

pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, PatternType, Protection, Style, StylePool,
    VerticalAlignment,
};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
