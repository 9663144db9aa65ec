//! Parsed formula trees
//!
//! The parser produces a [`FormulaExpr`]; the evaluator walks it. Besides
//! evaluation, the tree is also read for the cells a formula depends on, see
//! [`FormulaExpr::references`].

use sheetcalc_core::{CellAddress, CellError, CellRange};

/// One node of a parsed formula
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    Number(f64),
    String(String),
    Boolean(bool),
    /// Error literal such as `#N/A`
    Error(CellError),

    /// `A1`, `$B$2`, `Data!C3`
    CellRef(CellReference),
    /// `A1:B4`; the corners are normalized
    RangeRef(RangeReference),
    /// Any other identifier; evaluates to `#NAME?`
    NameRef(String),

    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    /// Call with its arguments unevaluated; `name` is upper case
    Function { name: String, args: Vec<FormulaExpr> },

    /// `{1,2;3,4}`, rows of expressions
    Array(Vec<Vec<FormulaExpr>>),
}

/// A single-cell reference, optionally qualified by sheet name
#[derive(Debug, Clone, PartialEq)]
pub struct CellReference {
    pub sheet: Option<String>,
    pub address: CellAddress,
}

/// A rectangular reference, optionally qualified by sheet name
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReference {
    pub sheet: Option<String>,
    pub range: CellRange,
}

/// A cell or range read by a formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reference<'a> {
    Cell(&'a CellReference),
    Range(&'a RangeReference),
}

impl<'a> Reference<'a> {
    /// Sheet name the reference is qualified with
    pub fn sheet(&self) -> Option<&'a str> {
        match self {
            Reference::Cell(r) => r.sheet.as_deref(),
            Reference::Range(r) => r.sheet.as_deref(),
        }
    }

    /// Covered cells as a range; a single cell is a one-cell range
    pub fn range(&self) -> CellRange {
        match self {
            Reference::Cell(r) => CellRange::new(r.address, r.address),
            Reference::Range(r) => r.range,
        }
    }
}

impl FormulaExpr {
    /// Every reference in the expression, in source order
    pub fn references(&self) -> Vec<Reference<'_>> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<Reference<'a>>) {
        match self {
            FormulaExpr::CellRef(r) => refs.push(Reference::Cell(r)),
            FormulaExpr::RangeRef(r) => refs.push(Reference::Range(r)),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_references(refs);
                right.collect_references(refs);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_references(refs),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_references(refs);
                }
            }
            FormulaExpr::Array(rows) => {
                for expr in rows.iter().flatten() {
                    expr.collect_references(refs);
                }
            }
            FormulaExpr::Number(_)
            | FormulaExpr::String(_)
            | FormulaExpr::Boolean(_)
            | FormulaExpr::Error(_)
            | FormulaExpr::NameRef(_) => {}
        }
    }
}

/// Infix operators, lowest precedence group first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    /// `&`
    Concat,
    Add,
    Subtract,
    Multiply,
    Divide,
    /// `^`, right associative
    Power,
}

/// Prefix `-` and postfix `%`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Percent,
}
