//! Workbook type - the main document structure

use parking_lot::{RwLock, RwLockReadGuard};

use crate::cell::{format_number, CellAddress, CellValue};
use crate::error::{Error, Result};
use crate::shared_strings::SharedStringTable;
use crate::worksheet::{validate_cell_position, Worksheet};
use crate::MAX_SHEET_NAME_LEN;

/// Default bound on recursive passes during one calculation request
pub const DEFAULT_MAX_CALC_ITERATIONS: u32 = 100;

/// A workbook (spreadsheet document)
///
/// Adding or renaming sheets needs `&mut self`; reading and writing cells
/// works through `&self`, so a workbook can be shared behind an `Arc` while
/// the per-sheet locks serialize access to each grid.
#[derive(Debug)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    shared_strings: RwLock<SharedStringTable>,
    settings: WorkbookSettings,
}

impl Workbook {
    /// Create a new empty workbook with one worksheet named "Sheet1"
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.worksheets.push(Worksheet::new("Sheet1"));
        wb
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            shared_strings: RwLock::new(SharedStringTable::new()),
            settings: WorkbookSettings::default(),
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    /// Look a worksheet up by name, failing with [`Error::SheetNotFound`]
    pub fn require_sheet(&self, name: &str) -> Result<(usize, &Worksheet)> {
        self.worksheets
            .iter()
            .enumerate()
            .find(|(_, ws)| ws.name() == name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Add a new worksheet with default name
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.generate_sheet_name();
        self.add_worksheet_with_name(&name)
    }

    /// Add a new worksheet with specified name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;

        let index = self.worksheets.len();
        self.worksheets.push(Worksheet::new(name));
        Ok(index)
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    // ==================== Shared strings ====================

    /// Read access to the shared-string table
    pub fn shared_strings(&self) -> RwLockReadGuard<'_, SharedStringTable> {
        self.shared_strings.read()
    }

    /// Add a string to the shared-string table, returning its index
    pub fn intern_string(&self, s: &str) -> u32 {
        self.shared_strings.write().intern(s)
    }

    /// Replace a shared-string reference with the string it points to
    pub fn resolve_value(&self, value: CellValue) -> Result<CellValue> {
        match value {
            CellValue::StringIndex(idx) => {
                Ok(CellValue::String(self.shared_strings().get(idx)?.clone()))
            }
            other => Ok(other),
        }
    }

    /// Render a stored value as the text a cell displays
    pub fn display_value(&self, value: &CellValue) -> Result<String> {
        match value {
            CellValue::StringIndex(idx) => Ok(self.shared_strings().get(*idx)?.to_string()),
            CellValue::Number(n) => Ok(format_number(*n)),
            other => Ok(other.to_string()),
        }
    }

    // ==================== Cell writes ====================

    /// Set a plain value on a cell, storing strings in the shared-string table
    ///
    /// Any formula on the cell is removed.
    pub fn set_cell_value<V: Into<CellValue>>(&self, sheet: &str, address: &str, value: V) -> Result<()> {
        let (_, ws) = self.require_sheet(sheet)?;
        let addr = CellAddress::parse(address)?;
        validate_cell_position(addr.row, addr.col)?;

        let value = match value.into() {
            CellValue::String(s) => CellValue::StringIndex(self.intern_string(s.as_str())),
            other => other,
        };
        ws.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Read a cell's stored value with shared strings resolved
    pub fn get_cell_value(&self, sheet: &str, address: &str) -> Result<CellValue> {
        let (_, ws) = self.require_sheet(sheet)?;
        self.resolve_value(ws.get_value(address)?)
    }

    /// Read a cell's stored value as display text
    pub fn get_cell_display(&self, sheet: &str, address: &str) -> Result<String> {
        let (_, ws) = self.require_sheet(sheet)?;
        self.display_value(&ws.get_value(address)?)
    }

    /// Validate a sheet name
    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        // Names are unique ignoring case
        let name_lower = name.to_lowercase();
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().to_lowercase() == name_lower)
        {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }

    /// Generate a unique sheet name
    fn generate_sheet_name(&self) -> String {
        let mut n = self.worksheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.validate_sheet_name(&name).is_ok() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Workbook-level settings
#[derive(Debug, Clone)]
pub struct WorkbookSettings {
    /// Upper bound on how many times one cell may be recomputed while a
    /// single formula is being calculated; limits circular references
    pub max_calc_iterations: u32,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            max_calc_iterations: DEFAULT_MAX_CALC_ITERATIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.worksheet(0).unwrap().name(), "Sheet1");
        assert_eq!(wb.settings().max_calc_iterations, 100);
    }

    #[test]
    fn test_add_worksheets() {
        let mut wb = Workbook::new();

        assert_eq!(wb.add_worksheet().unwrap(), 1);
        assert_eq!(wb.worksheet(1).unwrap().name(), "Sheet2");

        assert_eq!(wb.add_worksheet_with_name("Data").unwrap(), 2);
        assert_eq!(wb.sheet_index("Data"), Some(2));
        assert!(wb.worksheet_by_name("Data").is_some());
    }

    #[test]
    fn test_invalid_sheet_names() {
        let mut wb = Workbook::new();

        assert!(wb.add_worksheet_with_name("sheet1").is_err());
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name("Sheet/1").is_err());
        assert!(wb
            .add_worksheet_with_name(&"A".repeat(MAX_SHEET_NAME_LEN + 1))
            .is_err());
    }

    #[test]
    fn test_require_sheet() {
        let wb = Workbook::new();
        assert_eq!(wb.require_sheet("Sheet1").unwrap().0, 0);
        assert!(matches!(
            wb.require_sheet("Missing"),
            Err(Error::SheetNotFound(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_strings_go_through_shared_table() {
        let wb = Workbook::new();

        wb.set_cell_value("Sheet1", "A1", "hello").unwrap();
        wb.set_cell_value("Sheet1", "A2", "hello").unwrap();
        wb.set_cell_value("Sheet1", "A3", 2.5).unwrap();

        let ws = wb.worksheet(0).unwrap();
        assert_eq!(ws.get_value("A1").unwrap(), CellValue::StringIndex(0));
        assert_eq!(ws.get_value("A2").unwrap(), CellValue::StringIndex(0));
        assert_eq!(wb.shared_strings().len(), 1);

        assert_eq!(wb.get_cell_display("Sheet1", "A1").unwrap(), "hello");
        assert_eq!(wb.get_cell_display("Sheet1", "A3").unwrap(), "2.5");
        assert_eq!(
            wb.get_cell_value("Sheet1", "A2").unwrap().as_string(),
            Some("hello")
        );
    }

    #[test]
    fn test_dangling_shared_string_is_an_error() {
        let wb = Workbook::new();
        assert!(matches!(
            wb.display_value(&CellValue::StringIndex(9)),
            Err(Error::InvalidSharedString(9, 0))
        ));
    }
}
