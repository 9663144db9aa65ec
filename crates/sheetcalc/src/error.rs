//! Error type for workbook-level calculation operations

use sheetcalc_core::CellError;
use sheetcalc_formula::FormulaError;
use thiserror::Error;

/// Result type for calculation operations
pub type CalcResult<T> = std::result::Result<T, CalcError>;

/// Errors returned by calculation, enumeration and row iteration
#[derive(Debug, Error)]
pub enum CalcError {
    /// Workbook access failed (unknown sheet, bad address, bad shared string)
    #[error(transparent)]
    Core(#[from] sheetcalc_core::Error),

    /// Formula text could not be tokenized, parsed or expanded
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// The formula evaluated to a spreadsheet error
    ///
    /// The error value and the formula have already been stored on the cell.
    #[error("Formula in {cell} evaluated to {error}")]
    Evaluation { cell: String, error: CellError },

    /// The producer thread of a row iterator could not be started
    #[error("Failed to start row iterator producer: {0}")]
    Spawn(#[source] std::io::Error),

    /// The producer thread of a row iterator panicked
    #[error("Row iterator producer panicked")]
    ProducerPanicked,
}

impl CalcError {
    /// The spreadsheet error carried by an evaluation failure
    pub fn cell_error(&self) -> Option<CellError> {
        match self {
            CalcError::Evaluation { error, .. } => Some(*error),
            _ => None,
        }
    }
}
