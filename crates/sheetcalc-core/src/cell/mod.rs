//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellFormula`] - A cell's formula, regular or shared
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`CellData`] - Value and formula of one cell

mod address;
mod formula;
mod storage;
mod value;

pub use address::{CellAddress, CellRange};
pub use formula::CellFormula;
pub use storage::{CellData, CellStorage};
pub use value::{format_number, CellError, CellValue, SharedString};
