//! Values produced by formula evaluation

use std::fmt;

use sheetcalc_core::{format_number, CellError, CellValue};

/// Value types during formula evaluation
///
/// Spreadsheet errors are ordinary values of this type. They flow through
/// operators and functions like any other result.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    /// Rows of values from a range reference or array literal
    Array(Vec<Vec<FormulaValue>>),
    #[default]
    Empty,
}

impl FormulaValue {
    /// Convert to number following spreadsheet coercion rules
    ///
    /// Booleans become 1/0, empty becomes 0 and numeric-looking text is parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FormulaValue::String(s) => s.trim().parse().ok(),
            FormulaValue::Empty => Some(0.0),
            FormulaValue::Error(_) | FormulaValue::Array(_) => None,
        }
    }

    /// Convert to number, or the error value an operator should yield instead
    pub fn coerce_number(&self) -> Result<f64, CellError> {
        match self {
            FormulaValue::Error(e) => Err(*e),
            other => other.as_number().ok_or(CellError::Value),
        }
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::Empty => Some(false),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("TRUE") => Some(true),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("FALSE") => Some(false),
            _ => None,
        }
    }

    /// Lossy conversion to display text
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
            // A whole array cannot sit in one cell; show its top-left value
            FormulaValue::Array(rows) => rows
                .first()
                .and_then(|r| r.first())
                .map(FormulaValue::as_string)
                .unwrap_or_else(|| CellError::Value.to_string()),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Collapse an array to its top-left element; other values pass through
    pub fn into_scalar(self) -> FormulaValue {
        match self {
            FormulaValue::Array(rows) => rows
                .into_iter()
                .next()
                .and_then(|r| r.into_iter().next())
                .unwrap_or(FormulaValue::Error(CellError::Value)),
            other => other,
        }
    }

    /// Visit every scalar in this value, descending into arrays
    pub fn for_each_scalar<'a>(&'a self, f: &mut impl FnMut(&'a FormulaValue)) {
        match self {
            FormulaValue::Array(rows) => rows.iter().flatten().for_each(|v| v.for_each_scalar(f)),
            scalar => f(scalar),
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<CellValue> for FormulaValue {
    /// Shared-string indices must be resolved by the workbook first; an
    /// unresolved index becomes `#VALUE!`.
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Empty => FormulaValue::Empty,
            CellValue::Number(n) => FormulaValue::Number(n),
            CellValue::String(s) => FormulaValue::String(s.as_str().to_string()),
            CellValue::StringIndex(_) => FormulaValue::Error(CellError::Value),
            CellValue::Boolean(b) => FormulaValue::Boolean(b),
            CellValue::Error(e) => FormulaValue::Error(e),
        }
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value.into_scalar() {
            FormulaValue::Empty => CellValue::Empty,
            FormulaValue::Number(n) if !n.is_finite() => CellValue::Error(CellError::Num),
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::String(s) => CellValue::string(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            FormulaValue::Array(_) => CellValue::Error(CellError::Value),
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<&str> for FormulaValue {
    fn from(s: &str) -> Self {
        FormulaValue::String(s.to_string())
    }
}

impl From<CellError> for FormulaValue {
    fn from(e: CellError) -> Self {
        FormulaValue::Error(e)
    }
}
