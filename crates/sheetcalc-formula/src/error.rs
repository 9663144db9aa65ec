//! Formula error types

use sheetcalc_core::CellError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
///
/// Spreadsheet-level problems such as division by zero or a type mismatch
/// are not errors here; they evaluate to [`FormulaValue::Error`]. These
/// variants are reserved for failures that leave no value to return.
///
/// [`FormulaValue::Error`]: crate::FormulaValue::Error
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Formula text could not be tokenized or parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The formula produced no tokens
    #[error("Formula is empty")]
    EmptyFormula,

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Invalid argument passed to a built-in function
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// A reference inside a shared-formula template could not be parsed
    #[error("Invalid coordinates in '{reference}': {source}")]
    Coordinate {
        reference: String,
        #[source]
        source: sheetcalc_core::Error,
    },

    /// Workbook access failed
    #[error(transparent)]
    Core(#[from] sheetcalc_core::Error),
}

impl FormulaError {
    /// The error value written to a cell when this failure aborts its calculation
    pub fn fallback_error(&self) -> CellError {
        match self {
            FormulaError::Parse(_) | FormulaError::EmptyFormula => CellError::Name,
            FormulaError::UnknownFunction(_) => CellError::Name,
            FormulaError::Coordinate { .. } => CellError::Ref,
            FormulaError::Core(sheetcalc_core::Error::SheetNotFound(_)) => CellError::Ref,
            FormulaError::Evaluation(_)
            | FormulaError::Argument(_)
            | FormulaError::ArgumentCount { .. }
            | FormulaError::Core(_) => CellError::Value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_error() {
        assert_eq!(FormulaError::EmptyFormula.fallback_error(), CellError::Name);
        assert_eq!(
            FormulaError::Argument("x".into()).fallback_error(),
            CellError::Value
        );
        let coord = FormulaError::Coordinate {
            reference: "A0".into(),
            source: sheetcalc_core::Error::InvalidAddress("A0".into()),
        };
        assert_eq!(coord.fallback_error(), CellError::Ref);
        assert!(coord.to_string().contains("A0"));
    }
}
