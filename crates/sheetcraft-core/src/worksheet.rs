//! Worksheet type

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::style::{Style, StylePool};
use crate::{MAX_COLS, MAX_ROWS};

static NEXT_SHEET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one worksheet instance.
///
/// Two sheets parsed from the same bytes still get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetId(u64);

impl SheetId {
    fn next() -> Self {
        SheetId(NEXT_SHEET_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// A style registered in one worksheet's pool.
///
/// The handle remembers its owner; [`Worksheet::apply_style`] refuses
/// handles minted by any other sheet instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleHandle {
    owner: SheetId,
    index: u32,
}

impl StyleHandle {
    pub fn owner(&self) -> SheetId {
        self.owner
    }

    /// Pool index inside the owning sheet
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// A single sheet of a workbook
#[derive(Debug)]
pub struct Worksheet {
    id: SheetId,
    name: String,
    cells: CellStorage,
}

impl Worksheet {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            id: SheetId::next(),
            name: name.into(),
            cells: CellStorage::new(),
        }
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Value at `row`/`col`, [`CellValue::Empty`] if absent
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Value by A1 address
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    pub fn cell_style_index_at(&self, row: u32, col: u16) -> u32 {
        self.cells.get(row, col).map_or(0, |c| c.style_index)
    }

    pub fn style_by_index(&self, style_index: u32) -> Option<&Style> {
        self.cells.style_pool().get(style_index)
    }

    /// Resolved style of a cell, `None` when the cell does not exist
    pub fn cell_style_at(&self, row: u32, col: u16) -> Option<&Style> {
        self.cells
            .get(row, col)
            .and_then(|c| self.style_by_index(c.style_index))
    }

    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        Self::validate_cell_position(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Register `style` and attach it to a cell
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        let handle = self.register_style(style.clone());
        self.apply_style(row, col, handle)
    }

    /// Attach a pool index read from a file (no ownership check)
    pub fn set_cell_style_index_at(&mut self, row: u32, col: u16, style_index: u32) -> Result<()> {
        Self::validate_cell_position(row, col)?;
        self.cells.set_style(row, col, style_index);
        Ok(())
    }

    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(row, col);
    }

    // === Styles ===

    /// Add a style to this sheet's pool and return a handle owned by this sheet
    pub fn register_style(&mut self, style: Style) -> StyleHandle {
        StyleHandle {
            owner: self.id,
            index: self.cells.style_pool_mut().get_or_insert(style),
        }
    }

    /// Handle for a style already in this sheet's pool
    pub fn handle_for_index(&self, style_index: u32) -> Option<StyleHandle> {
        self.style_by_index(style_index).map(|_| StyleHandle {
            owner: self.id,
            index: style_index,
        })
    }

    /// Style behind a handle, whichever sheet owns it
    pub fn resolve_style(&self, handle: StyleHandle) -> Option<&Style> {
        (handle.owner == self.id)
            .then(|| self.style_by_index(handle.index))
            .flatten()
    }

    /// Attach a style to a cell, creating a blank cell if needed.
    ///
    /// Fails with [`Error::ForeignStyle`] for handles created by another sheet.
    pub fn apply_style(&mut self, row: u32, col: u16, handle: StyleHandle) -> Result<()> {
        if handle.owner != self.id {
            return Err(Error::ForeignStyle {
                owner: handle.owner.get(),
                sheet: self.name.clone(),
            });
        }
        Self::validate_cell_position(row, col)?;
        self.cells.set_style(row, col, handle.index);
        Ok(())
    }

    pub fn style_pool(&self) -> &StylePool {
        self.cells.style_pool()
    }

    // === Rows ===

    /// Highest row with a cell or row property
    pub fn last_row(&self) -> Option<u32> {
        self.cells.last_row()
    }

    /// One past the last populated column of `row` (0 for a missing row)
    pub fn row_len(&self, row: u32) -> u16 {
        self.cells
            .iter_row(row)
            .last()
            .map_or(0, |(col, _)| col + 1)
    }

    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells.iter_row(row)
    }

    pub fn row_exists(&self, row: u32) -> bool {
        self.cells.iter_row(row).next().is_some()
            || self.cells.custom_row_heights().contains_key(&row)
            || self.cells.is_row_hidden(row)
    }

    /// Move every row at or after `start` down by `count`, including
    /// heights, hidden flags and merged regions. A merged region that
    /// straddles `start` grows by `count`.
    ///
    /// Formula text is not rewritten: references to moved rows keep
    /// their old addresses.
    pub fn shift_rows(&mut self, start: u32, count: u32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        if let Some(last) = self.last_row().filter(|&last| last >= start) {
            let moved = last as u64 + count as u64;
            if moved >= MAX_ROWS as u64 {
                return Err(Error::RowOutOfBounds(
                    moved.min(u32::MAX as u64) as u32,
                    MAX_ROWS - 1,
                ));
            }
        }
        self.cells.shift_rows_down(start, count);
        Ok(())
    }

    /// Delete a row's cells and properties without moving later rows
    pub fn remove_row(&mut self, row: u32) {
        self.cells.remove_row(row);
    }

    /// Blank every value in `row`, keeping each cell's style
    pub fn clear_row_values(&mut self, row: u32) {
        let cols: Vec<u16> = self.cells.iter_row(row).map(|(col, _)| col).collect();
        for col in cols {
            self.cells.set_value(row, col, CellValue::Empty);
        }
    }

    /// Rewrite string values of `row` in place; other cells are untouched
    pub fn map_row_strings<F>(&mut self, row: u32, mut f: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        for (_, cell) in self.cells.iter_row_mut(row) {
            if let CellValue::String(s) = &cell.value {
                if let Some(replacement) = f(s.as_str()) {
                    cell.value = CellValue::string(replacement);
                }
            }
        }
    }

    pub fn row_height(&self, row: u32) -> f64 {
        self.cells.row_height(row)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.cells.set_row_height(row, height);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.cells.is_row_hidden(row)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        self.cells.set_row_hidden(row, hidden);
    }

    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        self.cells.custom_row_heights()
    }

    pub fn hidden_rows(&self) -> &BTreeMap<u32, bool> {
        self.cells.hidden_rows()
    }

    // === Columns ===

    pub fn column_width(&self, col: u16) -> f64 {
        self.cells.column_width(col)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.cells.set_column_width(col, width);
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.cells.is_column_hidden(col)
    }

    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        self.cells.set_column_hidden(col, hidden);
    }

    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        self.cells.custom_column_widths()
    }

    pub fn hidden_columns(&self) -> &BTreeMap<u16, bool> {
        self.cells.hidden_columns()
    }

    /// Fit a column to its widest displayed text.
    ///
    /// Width is measured in characters of the default font, scaled by each
    /// cell's font size; wide (CJK) characters count double. Columns with
    /// no text keep their width.
    pub fn auto_size_column(&mut self, col: u16) {
        let mut widest: f64 = 0.0;
        for (_, _, cell) in self.cells.iter().filter(|(_, c, _)| *c == col) {
            let text = cell.value.to_string();
            if text.is_empty() {
                continue;
            }
            let scale = self
                .style_by_index(cell.style_index)
                .map_or(1.0, |s| s.font.size / 11.0);
            let units = text
                .lines()
                .map(|line| line.chars().map(char_units).sum::<f64>())
                .fold(0.0, f64::max);
            widest = widest.max(units * scale);
        }
        if widest > 0.0 {
            self.set_column_width(col, (widest + 1.7).min(255.0));
        }
    }

    // === Merged Cells ===

    pub fn merged_regions(&self) -> &[CellRange] {
        self.cells.merged_regions()
    }

    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        if self.merged_regions().iter().any(|r| r.overlaps(range)) {
            return Err(Error::MergedCellConflict(range.to_string()));
        }
        self.cells.add_merged_region(*range);
        Ok(())
    }

    // === Bulk access ===

    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .used_bounds()
            .map(|(r1, c1, r2, c2)| CellRange::from_indices(r1, c1, r2, c2))
    }

    /// All cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    /// Row indices that hold at least one cell
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.row_indices()
    }

    fn validate_cell_position(row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        Ok(())
    }
}

fn char_units(c: char) -> f64 {
    match c as u32 {
        0x1100..=0x115F | 0x2E80..=0xA4CF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF | 0xFF00..=0xFF60 => {
            2.0
        }
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn test_set_cell_values() {
        let mut ws = Worksheet::new("Test");

        ws.set_cell_value("A1", "Hello").unwrap();
        ws.set_cell_value("B1", 42.0).unwrap();
        ws.set_cell_value_at(0, 2, true).unwrap();

        assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("Hello"));
        assert_eq!(ws.get_value_at(0, 1).as_number(), Some(42.0));
        assert_eq!(ws.get_value_at(0, 2).as_bool(), Some(true));
        assert_eq!(ws.row_len(0), 3);
        assert_eq!(ws.row_len(1), 0);
    }

    #[test]
    fn test_style_handles_are_bound_to_their_sheet() {
        let mut a = Worksheet::new("A");
        let mut b = Worksheet::new("A");

        let handle = a.register_style(Style::new().fill_color(Color::LIGHT_BLUE));
        a.apply_style(0, 0, handle).unwrap();
        assert_eq!(a.cell_style_at(0, 0).map(|s| s.fill.is_none()), Some(false));

        let err = b.apply_style(0, 0, handle).unwrap_err();
        assert!(matches!(err, Error::ForeignStyle { .. }));
        assert!(b.resolve_style(handle).is_none());
        assert!(b.is_empty());
    }

    #[test]
    fn test_shift_rows_checks_limit() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value_at(MAX_ROWS - 2, 0, "x").unwrap();
        assert!(ws.shift_rows(0, 5).is_err());
        assert!(ws.shift_rows(0, 1).is_ok());
        assert_eq!(ws.get_value_at(MAX_ROWS - 1, 0).as_string(), Some("x"));
    }

    #[test]
    fn test_clear_row_values_keeps_styles() {
        let mut ws = Worksheet::new("Test");
        let bold = ws.register_style(Style::new().bold(true));
        ws.set_cell_value_at(3, 0, "a").unwrap();
        ws.set_cell_value_at(3, 1, 1.5).unwrap();
        ws.apply_style(3, 1, bold).unwrap();

        ws.clear_row_values(3);

        assert!(ws.cell_at(3, 0).is_none());
        assert!(ws.get_value_at(3, 1).is_empty());
        assert_eq!(ws.cell_style_at(3, 1).map(|s| s.font.bold), Some(true));
    }

    #[test]
    fn test_map_row_strings() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value_at(0, 0, "Hello {{name}}").unwrap();
        ws.set_cell_value_at(0, 1, 7).unwrap();

        ws.map_row_strings(0, |s| Some(s.replace("{{name}}", "Ada")));

        assert_eq!(ws.get_value_at(0, 0).as_string(), Some("Hello Ada"));
        assert_eq!(ws.get_value_at(0, 1).as_number(), Some(7.0));
    }

    #[test]
    fn test_auto_size_column() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value_at(0, 0, "short").unwrap();
        ws.set_cell_value_at(1, 0, "a considerably longer value").unwrap();
        ws.auto_size_column(0);
        ws.auto_size_column(3);

        assert!(ws.column_width(0) > 27.0);
        assert_eq!(ws.column_width(3), 8.43);
    }

    #[test]
    fn test_merge_cells() {
        let mut ws = Worksheet::new("Test");
        ws.merge_cells(&CellRange::parse("A1:C3").unwrap()).unwrap();
        assert!(ws.merge_cells(&CellRange::parse("B2:D4").unwrap()).is_err());
        assert_eq!(ws.merged_regions().len(), 1);
    }
}
