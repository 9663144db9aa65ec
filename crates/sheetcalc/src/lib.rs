//! # sheetcalc
//!
//! Spreadsheet formula calculation on top of an in-memory workbook.
//!
//! ## Features
//!
//! - Evaluate a formula for a cell and store the result with the formula
//! - Bounded iterative calculation for circular references
//! - Shared-formula expansion for follower cells
//! - Cell enumeration with formula text and display values
//! - Row-by-row streaming of a sheet from a producer thread
//! - Bulk value writers for large plain-value blocks
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc::prelude::*;
//!
//! let workbook = Workbook::new();
//!
//! workbook.set_row_cells("Sheet1", 1, &["2", "=A1*3"]).unwrap();
//!
//! let mut cells = Vec::new();
//! workbook
//!     .each_cell_formula_value("Sheet1", |cell, formula, value| {
//!         cells.push(format!("{cell} {formula} {value}"));
//!         false
//!     })
//!     .unwrap();
//!
//! assert_eq!(cells, ["A1  2", "B1 =A1*3 6"]);
//! ```

pub mod bulk;
pub mod calculation;
pub mod each;
pub mod error;
pub mod prelude;
pub mod stream;

pub use bulk::WorkbookBulkExt;
pub use calculation::{CalculationOptions, WorkbookCalculationExt};
pub use each::WorkbookEnumerationExt;
pub use error::{CalcError, CalcResult};
pub use stream::{IteratorCellValue, Row, RowIterator, WorkbookStreamExt};

// Re-export core types
pub use sheetcalc_core::{
    CellAddress, CellData, CellError, CellFormula, CellRange, CellValue, Error, Result, Workbook,
    WorkbookSettings, Worksheet, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export formula types
pub use sheetcalc_formula::{
    evaluate, evaluate_formula, parse_formula, resolve_shared_formula, tokenize, CalcContext,
    CellKey, EvaluationContext, FormulaError, FormulaExpr, FormulaResult, FormulaValue, Token,
};
