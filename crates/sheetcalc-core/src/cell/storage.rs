//! Cell storage implementation
//!
//! Sparse, row-major storage for worksheet cells. Only populated cells are
//! kept, so iteration order is exactly the enumeration order the calculation
//! layer promises: rows ascending, then columns ascending within a row.

use std::collections::BTreeMap;

use super::{CellFormula, CellRange, CellValue};

/// Complete data for a single cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellData {
    /// The stored value (last computed result for formula cells)
    pub value: CellValue,
    /// Formula descriptor, if the cell holds a formula
    pub formula: Option<CellFormula>,
}

impl CellData {
    /// Create a new cell holding a plain value
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            formula: None,
        }
    }

    /// Create a formula cell with its last computed value
    pub fn with_formula(value: CellValue, formula: CellFormula) -> Self {
        Self {
            value,
            formula: Some(formula),
        }
    }

    /// Check if this cell carries neither a value nor a formula
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.formula.is_none()
    }

    /// Text physically stored as this cell's formula, or `""`
    pub fn formula_text(&self) -> &str {
        self.formula.as_ref().map(CellFormula::text).unwrap_or("")
    }
}

/// Sparse row-based storage for worksheet cells
///
/// Structure: `BTreeMap<row_index, BTreeMap<col_index, CellData>>`
#[derive(Debug, Default)]
pub struct CellStorage {
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,
}

impl CellStorage {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell
    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a mutable cell
    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Replace a cell
    ///
    /// Storing an empty cell removes it.
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        if data.is_empty() {
            self.remove(row, col);
        } else {
            self.rows.entry(row).or_default().insert(col, data);
        }
    }

    /// Set just the cell value, keeping any formula
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        match self.get_mut(row, col) {
            Some(cell) => {
                cell.value = value;
                if cell.is_empty() {
                    self.remove(row, col);
                }
            }
            None if !value.is_empty() => self.set(row, col, CellData::new(value)),
            None => {}
        }
    }

    /// Set just the formula descriptor, keeping the value
    pub fn set_formula(&mut self, row: u32, col: u16, formula: Option<CellFormula>) {
        match self.get_mut(row, col) {
            Some(cell) => {
                cell.formula = formula;
                if cell.is_empty() {
                    self.remove(row, col);
                }
            }
            None => {
                if let Some(formula) = formula {
                    self.set(row, col, CellData::with_formula(CellValue::Empty, formula));
                }
            }
        }
    }

    /// Remove a cell
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellData> {
        let row_map = self.rows.get_mut(&row)?;
        let removed = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    /// Clear all cells
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Get the number of populated cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over all cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, data)| (row, col, data)))
    }

    /// Iterate over cells in a specific row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(&col, data)| (col, data)))
    }

    /// Iterate over the populated cells inside `range`, row-major
    pub fn iter_range(&self, range: CellRange) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .range(range.start.row..=range.end.row)
            .flat_map(move |(&row, cols)| {
                cols.range(range.start.col..=range.end.col)
                    .map(move |(&col, data)| (row, col, data))
            })
    }

    /// First cell, in scan order, carrying the template of a shared-formula group
    pub fn shared_formula_anchor(&self, index: u32) -> Option<(u32, u16, &CellData)> {
        self.iter().find(|(_, _, cell)| {
            cell.formula.as_ref().map_or(false, |f| {
                f.is_shared_anchor() && f.shared_index() == Some(index)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_operations() {
        let mut storage = CellStorage::new();

        storage.set(0, 0, CellData::new(CellValue::Number(42.0)));
        assert_eq!(storage.get(0, 0).unwrap().value.as_number(), Some(42.0));
        assert!(storage.get(1, 1).is_none());

        storage.set(0, 0, CellData::default());
        assert_eq!(storage.cell_count(), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_value_and_formula_are_independent() {
        let mut storage = CellStorage::new();

        storage.set_formula(2, 1, Some(CellFormula::normal("=1+1")));
        storage.set_value(2, 1, CellValue::Number(2.0));
        let cell = storage.get(2, 1).unwrap();
        assert_eq!(cell.formula_text(), "=1+1");
        assert_eq!(cell.value, CellValue::Number(2.0));

        storage.set_formula(2, 1, None);
        assert_eq!(storage.get(2, 1).unwrap().formula_text(), "");

        storage.set_value(2, 1, CellValue::Empty);
        assert!(storage.get(2, 1).is_none());
    }

    #[test]
    fn test_iteration_is_row_major() {
        let mut storage = CellStorage::new();

        storage.set(1, 0, CellData::new(CellValue::Number(3.0)));
        storage.set(0, 5, CellData::new(CellValue::Number(2.0)));
        storage.set(0, 1, CellData::new(CellValue::Number(1.0)));

        let order: Vec<_> = storage.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 1), (0, 5), (1, 0)]);

        let row0: Vec<_> = storage.iter_row(0).map(|(c, _)| c).collect();
        assert_eq!(row0, vec![1, 5]);
    }

    #[test]
    fn test_iter_range() {
        let mut storage = CellStorage::new();
        for (row, col) in [(0, 0), (1, 1), (1, 3), (2, 2), (5, 1)] {
            storage.set(row, col, CellData::new(CellValue::Number(1.0)));
        }

        let range = CellRange::parse("B2:C6").unwrap();
        let inside: Vec<_> = storage.iter_range(range).map(|(r, c, _)| (r, c)).collect();
        assert_eq!(inside, vec![(1, 1), (2, 2), (5, 1)]);
    }

    #[test]
    fn test_shared_formula_anchor_is_first_in_scan_order() {
        let mut storage = CellStorage::new();
        let shared = |text: &str| {
            Some(CellFormula::Shared {
                index: 7,
                text: text.into(),
            })
        };

        storage.set_formula(4, 2, shared(""));
        storage.set_formula(3, 2, shared("=A4*2"));

        let (row, col, cell) = storage.shared_formula_anchor(7).unwrap();
        assert_eq!((row, col), (3, 2));
        assert_eq!(cell.formula_text(), "=A4*2");
        assert!(storage.shared_formula_anchor(8).is_none());
    }
}
