//! Cell-level types: values, addresses, ranges and the sparse storage
//! backing a worksheet.

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange};
pub use storage::{CellData, CellStorage};
pub use value::{datetime_to_serial, serial_to_datetime, CellError, CellValue, SharedString};
