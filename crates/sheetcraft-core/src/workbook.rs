//! Workbook type - an ordered list of worksheets

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A spreadsheet document
#[derive(Debug, Default)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// A workbook without worksheets
    pub fn empty() -> Self {
        Self::default()
    }

    /// A workbook with one worksheet named `name`
    pub fn with_sheet(name: &str) -> Result<Self> {
        let mut wb = Self::empty();
        wb.add_worksheet_with_name(name)?;
        Ok(wb)
    }

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name, None)?;
        self.worksheets.push(Worksheet::new(name));
        Ok(self.worksheets.len() - 1)
    }

    /// Append a worksheet built elsewhere, keeping its name
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name(), None)?;
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.validate_sheet_name(new_name, Some(index))?;
        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    /// Names are 1-31 characters, free of `: \ / ? * [ ]`, and unique
    /// ignoring case. `exclude` skips one sheet in the duplicate check.
    fn validate_sheet_name(&self, name: &str, exclude: Option<usize>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters): {}",
                MAX_SHEET_NAME_LEN, name
            )));
        }
        if let Some(c) = name.chars().find(|c| ":\\/?*[]".contains(*c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}': {}",
                c, name
            )));
        }

        let lower = name.to_lowercase();
        let clash = self
            .worksheets
            .iter()
            .enumerate()
            .any(|(i, ws)| Some(i) != exclude && ws.name().to_lowercase() == lower);
        if clash {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut wb = Workbook::with_sheet("Summary").unwrap();
        assert_eq!(wb.add_worksheet_with_name("Data").unwrap(), 1);
        assert_eq!(wb.sheet_index("Data"), Some(1));
        assert!(wb.worksheet_by_name("Missing").is_none());
    }

    #[test]
    fn test_duplicate_name_is_case_insensitive() {
        let mut wb = Workbook::with_sheet("Sheet1").unwrap();
        assert!(wb.add_worksheet_with_name("SHEET1").is_err());
    }

    #[test]
    fn test_invalid_names() {
        let mut wb = Workbook::empty();
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name("Q1/Q2").is_err());
        assert!(wb.add_worksheet_with_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn test_add_existing_worksheet() {
        let mut wb = Workbook::with_sheet("First").unwrap();
        let mut ws = Worksheet::new("Second");
        ws.set_cell_value_at(0, 0, 1.5).unwrap();
        assert_eq!(wb.add_existing_worksheet(ws).unwrap(), 1);
        assert!(wb.add_existing_worksheet(Worksheet::new("first")).is_err());
        assert_eq!(wb.sheet_count(), 2);
    }

    #[test]
    fn test_rename_allows_same_name() {
        let mut wb = Workbook::with_sheet("Template").unwrap();
        wb.add_worksheet_with_name("Other").unwrap();
        wb.rename_worksheet(0, "template").unwrap();
        assert!(wb.rename_worksheet(0, "other").is_err());
        assert_eq!(wb.worksheet(0).unwrap().name(), "template");
    }
}
