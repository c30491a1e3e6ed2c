//! Row layout planning.
//!
//! A planner decides, before any cell is touched, where each logical row
//! lands, which donor style it takes, and what happens to the template rows
//! around it. Plans are plain data; writers execute them in order:
//! shift, write [`RowPlan::rows`], blank [`RowPlan::blanks`], remove
//! [`RowPlan::removals`].

use std::ops::RangeInclusive;

/// Which donor style a planned row takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowRole {
    Header,
    /// Data row at an odd 1-based position
    Odd,
    /// Data row at an even 1-based position
    Even,
    Category,
    Detail,
    LineItemOdd,
    LineItemEven,
}

impl RowRole {
    /// Role for the data row at 0-based `position`
    pub fn for_position(position: usize) -> Self {
        if position % 2 == 0 {
            RowRole::Odd
        } else {
            RowRole::Even
        }
    }
}

/// One output row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedRow {
    pub row: u32,
    pub role: RowRole,
}

/// Rows at and below `start` move down by `count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowShift {
    pub start: u32,
    pub count: u32,
}

/// The target shape of one sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPlan {
    /// Output rows in emission order
    pub rows: Vec<PlannedRow>,
    /// Applied before any row is written
    pub shift: Option<RowShift>,
    /// Template rows whose values are cleared, styles kept
    pub blanks: Vec<u32>,
    /// Leftover template rows to delete after writing
    pub removals: Option<RangeInclusive<u32>>,
}

impl RowPlan {
    /// Planned rows other than the header
    pub fn body(&self) -> impl Iterator<Item = &PlannedRow> {
        self.rows.iter().filter(|r| r.role != RowRole::Header)
    }

    /// One past the last planned row (0 for an empty plan)
    pub fn end_row(&self) -> u32 {
        self.rows.iter().map(|r| r.row + 1).max().unwrap_or(0)
    }
}

/// Rows from `first_unused` through `last` (the template's original last row)
fn trailing(first_unused: u32, last: Option<u32>) -> Option<RangeInclusive<u32>> {
    last.filter(|&last| last >= first_unused)
        .map(|last| first_unused..=last)
}

fn row_at(base: u32, offset: usize) -> u32 {
    base.saturating_add(u32::try_from(offset).unwrap_or(u32::MAX))
}

/// Header, then zebra-striped data rows
pub struct AlternatingLayout;

impl AlternatingLayout {
    pub const HEADER_DONOR_ROW: u32 = 0;
    pub const ODD_DONOR_ROW: u32 = 1;
    pub const EVEN_DONOR_ROW: u32 = 2;

    /// `template_last_row` is the sheet's last row before rendering
    /// (`None` for a sheet created during the render).
    pub fn plan(has_header: bool, row_count: usize, template_last_row: Option<u32>) -> RowPlan {
        let mut rows = Vec::with_capacity(row_count + 1);
        let first = if has_header {
            rows.push(PlannedRow {
                row: Self::HEADER_DONOR_ROW,
                role: RowRole::Header,
            });
            1
        } else {
            0
        };
        rows.extend((0..row_count).map(|i| PlannedRow {
            row: row_at(first, i),
            role: RowRole::for_position(i),
        }));

        let end = row_at(first, row_count);
        RowPlan {
            rows,
            removals: trailing(end, template_last_row),
            ..RowPlan::default()
        }
    }
}

/// Header, then each category followed by its details
pub struct CategorizedLayout;

impl CategorizedLayout {
    pub const HEADER_DONOR_ROW: u32 = 0;
    pub const CATEGORY_DONOR_ROW: u32 = 1;
    pub const DETAIL_DONOR_ROW: u32 = 2;

    /// `header_row` reserves row 0 for the header; `detail_counts` has one
    /// entry per category, in insertion order.
    pub fn plan(
        header_row: bool,
        detail_counts: &[usize],
        template_last_row: Option<u32>,
    ) -> RowPlan {
        let total = detail_counts.len() + detail_counts.iter().sum::<usize>();
        let mut rows = Vec::with_capacity(total + 1);
        let mut next = 0u32;
        if header_row {
            rows.push(PlannedRow {
                row: Self::HEADER_DONOR_ROW,
                role: RowRole::Header,
            });
            next = 1;
        }
        for &details in detail_counts {
            rows.push(PlannedRow {
                row: next,
                role: RowRole::Category,
            });
            next = next.saturating_add(1);
            for _ in 0..details {
                rows.push(PlannedRow {
                    row: next,
                    role: RowRole::Detail,
                });
                next = next.saturating_add(1);
            }
        }

        RowPlan {
            rows,
            removals: trailing(next, template_last_row),
            ..RowPlan::default()
        }
    }
}

/// The fixed 16-row business form with a growable line-item table.
///
/// | rows   | region                        |
/// |--------|-------------------------------|
/// | 0-5    | header, placeholders          |
/// | 6      | table header                  |
/// | 7, 8   | odd / even line-item donors   |
/// | 9      | separator                     |
/// | 10-15  | footer, placeholders          |
pub struct FormLayout;

impl FormLayout {
    pub const HEADER_REGION: RangeInclusive<u32> = 0..=5;
    pub const TABLE_HEADER_ROW: u32 = 6;
    pub const ODD_DONOR_ROW: u32 = 7;
    pub const EVEN_DONOR_ROW: u32 = 8;
    pub const SEPARATOR_ROW: u32 = 9;
    pub const FOOTER_START: u32 = 10;
    pub const FOOTER_END: u32 = 15;
    /// Line items the template holds without shifting
    pub const NATIVE_LINE_ITEMS: usize = 2;
    pub const MIN_ROWS: u32 = Self::FOOTER_END + 1;

    pub fn footer_region() -> RangeInclusive<u32> {
        Self::FOOTER_START..=Self::FOOTER_END
    }

    /// Rows the footer moves down by for `line_item_count` items
    pub fn extra_rows(line_item_count: usize) -> u32 {
        u32::try_from(line_item_count.saturating_sub(Self::NATIVE_LINE_ITEMS))
            .unwrap_or(u32::MAX)
    }

    pub fn plan(line_item_count: usize, template_last_row: u32) -> RowPlan {
        let extra = Self::extra_rows(line_item_count);
        let shift = (extra > 0).then_some(RowShift {
            start: Self::FOOTER_START,
            count: extra,
        });

        let rows = (0..line_item_count)
            .map(|i| PlannedRow {
                row: row_at(Self::ODD_DONOR_ROW, i),
                role: if i % 2 == 0 {
                    RowRole::LineItemOdd
                } else {
                    RowRole::LineItemEven
                },
            })
            .collect();

        let blanks = (line_item_count..Self::NATIVE_LINE_ITEMS)
            .map(|i| row_at(Self::ODD_DONOR_ROW, i))
            .collect();

        // The sheet's last row after the shift
        let shifted_last = if template_last_row >= Self::FOOTER_START {
            template_last_row.saturating_add(extra)
        } else {
            template_last_row
        };
        let footer_end = Self::FOOTER_END.saturating_add(extra);

        RowPlan {
            rows,
            shift,
            blanks,
            removals: trailing(footer_end.saturating_add(1), Some(shifted_last)),
        }
    }

    /// First footer row once `line_item_count` items are in place
    pub fn footer_start(line_item_count: usize) -> u32 {
        Self::FOOTER_START.saturating_add(Self::extra_rows(line_item_count))
    }
}
