//! Prelude module - common imports for sheetcalc users
//!
//! ```rust
//! use sheetcalc::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalcError,
    CalcResult,
    CalculationOptions,
    CellAddress,
    CellError,
    CellFormula,
    // Cell types
    CellValue,
    // Error types
    Error,
    FormulaValue,
    // Streaming types
    IteratorCellValue,
    RowIterator,
    // Main types
    Workbook,
    // Extension traits
    WorkbookBulkExt,
    WorkbookCalculationExt,
    WorkbookEnumerationExt,
    WorkbookStreamExt,
    Worksheet,
};
