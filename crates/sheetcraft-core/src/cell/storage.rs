//! Sparse cell storage
//!
//! Only populated cells are kept, in a row-major `BTreeMap` so iteration is
//! ordered the way XLSX worksheets are written.

use std::collections::BTreeMap;

use super::{CellRange, CellValue};
use crate::style::StylePool;

/// Value plus style of one cell
#[derive(Debug, Clone, Default)]
pub struct CellData {
    pub value: CellValue,
    /// Index into the owning worksheet's style pool (0 = default style)
    pub style_index: u32,
}

impl CellData {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style_index: 0,
        }
    }

    pub fn with_style(value: CellValue, style_index: u32) -> Self {
        Self { value, style_index }
    }

    /// No value and default style
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style_index == 0
    }
}

/// Cells, row/column dimensions and merged regions of one worksheet.
///
/// Structure: `BTreeMap<row_index, BTreeMap<col_index, CellData>>`
#[derive(Debug)]
pub struct CellStorage {
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,
    pub(crate) style_pool: StylePool,
    default_row_height: f64,
    default_column_width: f64,
    row_heights: BTreeMap<u32, f64>,
    hidden_rows: BTreeMap<u32, bool>,
    column_widths: BTreeMap<u16, f64>,
    hidden_columns: BTreeMap<u16, bool>,
    merged_regions: Vec<CellRange>,
}

impl CellStorage {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            style_pool: StylePool::new(),
            default_row_height: 15.0,
            default_column_width: 8.43,
            row_heights: BTreeMap::new(),
            hidden_rows: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            hidden_columns: BTreeMap::new(),
            merged_regions: Vec::new(),
        }
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Store a cell; an empty cell (no value, default style) is removed instead.
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        if data.is_empty() {
            self.remove(row, col);
        } else {
            self.rows.entry(row).or_default().insert(col, data);
        }
    }

    /// Replace the value, keeping the style
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        let style_index = self.get(row, col).map_or(0, |c| c.style_index);
        self.set(row, col, CellData::with_style(value, style_index));
    }

    /// Replace the style, keeping the value
    pub fn set_style(&mut self, row: u32, col: u16, style_index: u32) {
        let value = self
            .get_mut(row, col)
            .map(|c| std::mem::take(&mut c.value))
            .unwrap_or_default();
        self.set(row, col, CellData::with_style(value, style_index));
    }

    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellData> {
        let row_map = self.rows.get_mut(&row)?;
        let removed = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (min_row, min_col, max_row, max_col) of stored cells
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let min_row = *self.rows.keys().next()?;
        let max_row = *self.rows.keys().next_back()?;
        let min_col = self.rows.values().filter_map(|r| r.keys().next()).min()?;
        let max_col = self.rows.values().filter_map(|r| r.keys().next_back()).max()?;
        Some((min_row, *min_col, max_row, *max_col))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, data)| (row, col, data)))
    }

    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(&col, data)| (col, data)))
    }

    pub fn iter_row_mut(&mut self, row: u32) -> impl Iterator<Item = (u16, &mut CellData)> {
        self.rows
            .get_mut(&row)
            .into_iter()
            .flat_map(|cols| cols.iter_mut().map(|(&col, data)| (col, data)))
    }

    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    /// Highest row holding a cell or a custom height/hidden flag
    pub fn last_row(&self) -> Option<u32> {
        [
            self.rows.keys().next_back(),
            self.row_heights.keys().next_back(),
            self.hidden_rows.keys().next_back(),
        ]
        .into_iter()
        .flatten()
        .max()
        .copied()
    }

    /// Move everything at or below `start` down by `count` rows.
    ///
    /// Callers check the sheet row limit beforehand.
    pub fn shift_rows_down(&mut self, start: u32, count: u32) {
        if count == 0 {
            return;
        }
        shift_keys(&mut self.rows, start, count);
        shift_keys(&mut self.row_heights, start, count);
        shift_keys(&mut self.hidden_rows, start, count);
        for region in &mut self.merged_regions {
            if region.start.row >= start {
                *region = region.offset_rows(count);
            } else if region.end.row >= start {
                // Straddles the insertion point: grow to cover the gap
                region.end.row += count;
            }
        }
    }

    /// Drop every cell and row property of `row`.
    ///
    /// A merged region with `row` as its first or last row loses that row;
    /// one left covering a single cell, or lying wholly in `row`, is dropped.
    pub fn remove_row(&mut self, row: u32) {
        self.rows.remove(&row);
        self.row_heights.remove(&row);
        self.hidden_rows.remove(&row);
        self.merged_regions.retain_mut(|region| {
            if region.start.row == row && region.end.row == row {
                return false;
            }
            if region.start.row == row {
                region.start.row += 1;
            } else if region.end.row == row {
                region.end.row -= 1;
            }
            region.row_count() > 1 || region.col_count() > 1
        });
    }

    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    pub fn row_height(&self, row: u32) -> f64 {
        self.row_heights
            .get(&row)
            .copied()
            .unwrap_or(self.default_row_height)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        if (height - self.default_row_height).abs() < 0.001 {
            self.row_heights.remove(&row);
        } else {
            self.row_heights.insert(row, height);
        }
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden_rows.contains_key(&row)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        if hidden {
            self.hidden_rows.insert(row, true);
        } else {
            self.hidden_rows.remove(&row);
        }
    }

    pub fn default_column_width(&self) -> f64 {
        self.default_column_width
    }

    pub fn column_width(&self, col: u16) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        if (width - self.default_column_width).abs() < 0.001 {
            self.column_widths.remove(&col);
        } else {
            self.column_widths.insert(col, width);
        }
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.hidden_columns.contains_key(&col)
    }

    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        if hidden {
            self.hidden_columns.insert(col, true);
        } else {
            self.hidden_columns.remove(&col);
        }
    }

    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    pub fn hidden_rows(&self) -> &BTreeMap<u32, bool> {
        &self.hidden_rows
    }

    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    pub fn hidden_columns(&self) -> &BTreeMap<u16, bool> {
        &self.hidden_columns
    }

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    pub fn add_merged_region(&mut self, range: CellRange) {
        self.merged_regions.push(range);
    }

    pub fn style_pool(&self) -> &StylePool {
        &self.style_pool
    }

    pub fn style_pool_mut(&mut self) -> &mut StylePool {
        &mut self.style_pool
    }
}

impl Default for CellStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-key every entry at or after `start` by `+count`
fn shift_keys<V>(map: &mut BTreeMap<u32, V>, start: u32, count: u32) {
    let moved = map.split_off(&start);
    map.extend(moved.into_iter().map(|(k, v)| (k + count, v)));
}
