//! Prelude module for convenient imports
//!
//! ```rust
//! use sheetcraft::prelude::*;
//! ```

pub use crate::values;
pub use crate::{
    AlternatingRowsWriter, CategorizedTemplateWriter, CategorizedWriter, DataType, DecimalMode,
    Encoding, ExcelIo, ExcelIoError, ExcelReader, ExcelWriter, FormTemplateWriter, Record,
    RowMap, TemplateSource, Value,
};
