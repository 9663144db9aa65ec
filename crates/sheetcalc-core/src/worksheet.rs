//! Worksheet type

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::cell::{CellAddress, CellData, CellFormula, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// The cell grid sits behind one exclusive lock per sheet. Every accessor
/// below takes the lock for the duration of a single read or write; scans
/// that need a consistent view (enumeration, bulk writes) hold the guard
/// returned by [`Worksheet::lock`] instead. The lock is not re-entrant, so
/// code holding a guard must not call back into these accessors on the
/// same sheet.
#[derive(Debug)]
pub struct Worksheet {
    name: String,
    cells: Mutex<CellStorage>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: Mutex::new(CellStorage::new()),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Take the sheet lock
    pub fn lock(&self) -> MutexGuard<'_, CellStorage> {
        self.cells.lock()
    }

    /// Take the sheet lock, giving up after `timeout`
    pub fn try_lock_for(&self, timeout: Duration) -> Option<MutexGuard<'_, CellStorage>> {
        self.cells.try_lock_for(timeout)
    }

    // === Cell Access ===

    /// Get a copy of a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a copy of a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<CellData> {
        self.lock().get(row, col).cloned()
    }

    /// Get the stored value by address string
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get the stored value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.lock()
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Get the formula descriptor by address string
    pub fn formula(&self, address: &str) -> Result<Option<CellFormula>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.formula_at(addr.row, addr.col))
    }

    /// Get the formula descriptor by indices
    pub fn formula_at(&self, row: u32, col: u16) -> Option<CellFormula> {
        self.lock().get(row, col).and_then(|c| c.formula.clone())
    }

    // === Cell Modification ===

    /// Set a plain cell value by address string
    ///
    /// Any formula on the cell is removed.
    pub fn set_cell_value<V: Into<CellValue>>(&self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a plain cell value by row and column indices
    ///
    /// Any formula on the cell is removed.
    pub fn set_cell_value_at<V: Into<CellValue>>(&self, row: u32, col: u16, value: V) -> Result<()> {
        validate_cell_position(row, col)?;
        self.lock().set(row, col, CellData::new(value.into()));
        Ok(())
    }

    /// Set a cell formula by address string, keeping the stored value
    pub fn set_cell_formula(&self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_at(addr.row, addr.col, formula)
    }

    /// Set a cell formula by indices, keeping the stored value
    ///
    /// An empty formula removes the descriptor.
    pub fn set_cell_formula_at(&self, row: u32, col: u16, formula: &str) -> Result<()> {
        validate_cell_position(row, col)?;
        let formula = (!formula.is_empty()).then(|| CellFormula::normal(formula));
        self.lock().set_formula(row, col, formula);
        Ok(())
    }

    /// Make a cell part of a shared-formula group
    ///
    /// Pass the template text for the anchor cell and `""` for followers.
    pub fn set_shared_formula(&self, address: &str, index: u32, text: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_shared_formula_at(addr.row, addr.col, index, text)
    }

    /// Make a cell part of a shared-formula group by indices
    pub fn set_shared_formula_at(&self, row: u32, col: u16, index: u32, text: &str) -> Result<()> {
        validate_cell_position(row, col)?;
        let formula = CellFormula::Shared {
            index,
            text: text.to_string(),
        };
        self.lock().set_formula(row, col, Some(formula));
        Ok(())
    }

    /// Store a computed value without touching the cell's formula
    pub fn set_formula_result_at(&self, row: u32, col: u16, value: CellValue) -> Result<()> {
        validate_cell_position(row, col)?;
        self.lock().set_value(row, col, value);
        Ok(())
    }

    /// Remove a cell entirely
    pub fn clear_cell(&self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.lock().remove(addr.row, addr.col);
        Ok(())
    }

    /// Get the number of populated cells
    pub fn cell_count(&self) -> usize {
        self.lock().cell_count()
    }

    /// Check if the worksheet is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Reject positions outside the worksheet grid
pub(crate) fn validate_cell_position(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
    }
    Ok(())
}
