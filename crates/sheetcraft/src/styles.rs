//! Donor styles: the formatting of one template row, captured per column

use log::warn;
use sheetcraft_core::{Style, StyleHandle, Worksheet};

/// One optional style handle per column of a donor row.
///
/// Handles belong to the worksheet they were extracted into; applying one
/// to any other sheet fails. Use [`DonorStyles::transfer`] to carry the
/// same formatting to a sheet created later in the render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorStyles {
    handles: Vec<Option<StyleHandle>>,
}

impl DonorStyles {
    /// Capture the style of every cell in `row`, up to its last populated
    /// column. Columns without a cell get `None`. A missing row yields an
    /// empty set.
    pub fn extract(sheet: &mut Worksheet, row: u32) -> Self {
        if !sheet.row_exists(row) {
            warn!(
                "donor row {} is missing from sheet '{}'; cells will be unstyled",
                row,
                sheet.name()
            );
            return Self::default();
        }

        let mut copies: Vec<Option<Style>> = vec![None; sheet.row_len(row) as usize];
        for (col, cell) in sheet.row_cells(row) {
            copies[col as usize] = Some(
                sheet
                    .style_by_index(cell.style_index)
                    .cloned()
                    .unwrap_or_default(),
            );
        }
        Self::register_all(sheet, copies)
    }

    /// The same formatting registered in `to`, for sheets that have no donor
    /// rows of their own
    pub fn transfer(&self, from: &Worksheet, to: &mut Worksheet) -> Self {
        let copies = self
            .handles
            .iter()
            .map(|handle| handle.and_then(|h| from.resolve_style(h)).cloned())
            .collect();
        Self::register_all(to, copies)
    }

    /// `style` for every column in `0..columns`, registered once
    pub fn uniform(sheet: &mut Worksheet, style: Style, columns: usize) -> Self {
        let handle = sheet.register_style(style);
        Self {
            handles: vec![Some(handle); columns],
        }
    }

    fn register_all(sheet: &mut Worksheet, copies: Vec<Option<Style>>) -> Self {
        let handles = copies
            .into_iter()
            .map(|style| style.map(|s| sheet.register_style(s)))
            .collect();
        Self { handles }
    }

    /// Handle for `col`, if the donor had a cell there
    pub fn get(&self, col: u16) -> Option<StyleHandle> {
        self.handles.get(col as usize).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
