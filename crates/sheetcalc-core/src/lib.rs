//! # sheetcalc-core
//!
//! Core data structures for the sheetcalc formula engine.
//!
//! This crate provides the in-memory document model the calculator works on:
//! - [`CellValue`] and [`CellFormula`] - What a cell stores
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//! - [`SharedStringTable`] - Workbook-wide string deduplication
//! - [`Workbook`], [`Worksheet`] - The document, with one lock per sheet
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_core::{CellValue, Workbook};
//!
//! let workbook = Workbook::new();
//! let sheet = workbook.worksheet(0).unwrap();
//!
//! sheet.set_cell_value("A1", 2.0).unwrap();
//! sheet.set_cell_formula("B1", "=A1+3").unwrap();
//!
//! assert_eq!(sheet.get_value("A1").unwrap(), CellValue::Number(2.0));
//! assert_eq!(sheet.cell("B1").unwrap().unwrap().formula_text(), "=A1+3");
//! ```

pub mod cell;
pub mod error;
pub mod shared_strings;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{
    format_number, CellAddress, CellData, CellError, CellFormula, CellRange, CellStorage,
    CellValue, SharedString,
};
pub use error::{Error, Result};
pub use shared_strings::SharedStringTable;
pub use workbook::{Workbook, WorkbookSettings, DEFAULT_MAX_CALC_ITERATIONS};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
