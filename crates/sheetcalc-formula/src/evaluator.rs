//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values. Cell references are looked up in
//! the workbook; a referenced formula cell is computed recursively under the
//! request's [`CalcContext`].

use std::cmp::Ordering;

use ahash::AHashSet;

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::calc_context::{CalcContext, CellKey};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::{parse_formula, parse_tokens};
use crate::shared::resolve_shared_formula;
use crate::tokenizer::{tokenize, Token};
use crate::value::FormulaValue;
use sheetcalc_core::{CellError, CellFormula, CellStorage, Workbook};

/// Nesting depth from which a formula's precedents are computed before it
const PRECEDENT_DEPTH: u32 = 32;

/// Context for formula evaluation
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Reference to the workbook for cell lookups
    pub workbook: Option<&'a Workbook>,
    /// Current worksheet index
    pub current_sheet: usize,
    /// Current cell row
    pub current_row: u32,
    /// Current cell column
    pub current_col: u16,
    /// Iteration state of the request; without it formula cells yield their stored value
    pub calc: Option<&'a CalcContext>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(workbook: Option<&'a Workbook>, sheet: usize, row: u32, col: u16) -> Self {
        Self {
            workbook,
            current_sheet: sheet,
            current_row: row,
            current_col: col,
            calc: None,
        }
    }

    /// Create a simple context without workbook (for testing)
    pub fn simple() -> Self {
        Self::new(None, 0, 0, 0)
    }

    /// Attach the iteration state of a calculation request
    pub fn with_calc(mut self, calc: &'a CalcContext) -> Self {
        self.calc = Some(calc);
        self
    }

    /// The same context, positioned on another cell
    fn at(&self, sheet: usize, row: u32, col: u16) -> Self {
        Self {
            current_sheet: sheet,
            current_row: row,
            current_col: col,
            ..*self
        }
    }

    fn sheet_index(&self, workbook: &Workbook, sheet: Option<&str>) -> Option<usize> {
        match sheet {
            Some(name) => workbook.sheet_index(name),
            None => Some(self.current_sheet).filter(|&idx| idx < workbook.sheet_count()),
        }
    }

    /// Get a cell value from the workbook
    ///
    /// An unknown sheet yields `#REF!`. Formula cells are computed when a
    /// [`CalcContext`] is attached.
    pub fn get_cell_value(
        &self,
        sheet: Option<&str>,
        row: u32,
        col: u16,
    ) -> FormulaResult<FormulaValue> {
        let workbook = match self.workbook {
            Some(wb) => wb,
            None => return Ok(FormulaValue::Empty),
        };
        match self.sheet_index(workbook, sheet) {
            Some(idx) => self.cell_value_at(workbook, CellKey::new(idx, row, col)),
            None => Ok(FormulaValue::Error(CellError::Ref)),
        }
    }

    fn cell_value_at(&self, workbook: &Workbook, key: CellKey) -> FormulaResult<FormulaValue> {
        let worksheet = match workbook.worksheet(key.sheet) {
            Some(ws) => ws,
            None => return Ok(FormulaValue::Error(CellError::Ref)),
        };

        // Cloned out so no sheet lock is held while recursing
        let data = match worksheet.cell_at(key.row, key.col) {
            Some(data) => data,
            None => return Ok(FormulaValue::Empty),
        };

        let stored = || -> FormulaResult<FormulaValue> {
            Ok(workbook.resolve_value(data.value.clone())?.into())
        };

        match (&data.formula, self.calc) {
            (Some(formula), Some(calc)) => calc.resolve(key, stored, || {
                let text = formula_text_at(&worksheet.lock(), key.row, key.col, formula)?;
                let expr = parse_formula(&text)?;
                let ctx = self.at(key.sheet, key.row, key.col);
                if calc.depth() >= PRECEDENT_DEPTH {
                    ctx.evaluate_precedents(workbook, calc, key, &expr)?;
                }
                evaluate(&expr, &ctx)
            }),
            _ => stored(),
        }
    }

    /// Compute the uncached formula cells `root` depends on, deepest first
    ///
    /// Once they are cached, evaluating `root` itself only nests one level,
    /// however long the chain below it is.
    fn evaluate_precedents(
        &self,
        workbook: &Workbook,
        calc: &CalcContext,
        root: CellKey,
        expr: &FormulaExpr,
    ) -> FormulaResult<()> {
        let pending = |key: &CellKey| *key != calc.entry() && calc.cached(*key).is_none();

        let mut visited = AHashSet::new();
        visited.insert(root);
        let mut order = Vec::new();
        // (cell, whether its precedents are already on the stack)
        let mut stack: Vec<(CellKey, bool)> = formula_precedents(workbook, root.sheet, expr)
            .into_iter()
            .filter(|key| pending(key))
            .rev()
            .map(|key| (key, false))
            .collect();

        while let Some((key, expanded)) = stack.pop() {
            if expanded {
                order.push(key);
                continue;
            }
            if !visited.insert(key) {
                continue;
            }
            stack.push((key, true));
            for precedent in cell_precedents(workbook, key) {
                if pending(&precedent) && !visited.contains(&precedent) {
                    stack.push((precedent, false));
                }
            }
        }

        tracing::debug!("evaluating {} precedents of {root:?} first", order.len());
        for key in order {
            self.cell_value_at(workbook, key)?;
        }
        Ok(())
    }

    /// Get a range of cell values as an array
    pub fn get_range_values(
        &self,
        sheet: Option<&str>,
        start_row: u32,
        start_col: u16,
        end_row: u32,
        end_col: u16,
    ) -> FormulaResult<FormulaValue> {
        if let Some(workbook) = self.workbook {
            if self.sheet_index(workbook, sheet).is_none() {
                return Ok(FormulaValue::Error(CellError::Ref));
            }
        }

        let mut rows = Vec::with_capacity((end_row - start_row + 1) as usize);
        for row in start_row..=end_row {
            let mut cols = Vec::with_capacity((end_col - start_col + 1) as usize);
            for col in start_col..=end_col {
                cols.push(self.get_cell_value(sheet, row, col)?);
            }
            rows.push(cols);
        }

        Ok(FormulaValue::Array(rows))
    }
}

/// Formula cells read by the formula stored at `key`
///
/// Formulas that cannot be expanded or parsed contribute nothing here; the
/// failure surfaces when the cell itself is evaluated.
fn cell_precedents(workbook: &Workbook, key: CellKey) -> Vec<CellKey> {
    let Some(worksheet) = workbook.worksheet(key.sheet) else {
        return Vec::new();
    };
    let text = {
        let cells = worksheet.lock();
        match cells.get(key.row, key.col).and_then(|data| data.formula.as_ref()) {
            Some(formula) => formula_text_at(&cells, key.row, key.col, formula),
            None => return Vec::new(),
        }
    };
    match text.and_then(|text| parse_formula(&text)) {
        Ok(expr) => formula_precedents(workbook, key.sheet, &expr),
        Err(_) => Vec::new(),
    }
}

/// Formula cells covered by the references in `expr`, evaluated on `sheet`
fn formula_precedents(workbook: &Workbook, sheet: usize, expr: &FormulaExpr) -> Vec<CellKey> {
    let mut keys = Vec::new();
    for reference in expr.references() {
        let sheet_idx = match reference.sheet() {
            Some(name) => match workbook.sheet_index(name) {
                Some(idx) => idx,
                None => continue,
            },
            None => sheet,
        };
        let Some(worksheet) = workbook.worksheet(sheet_idx) else {
            continue;
        };

        let cells = worksheet.lock();
        keys.extend(
            cells
                .iter_range(reference.range())
                .filter(|(_, _, data)| data.formula.is_some())
                .map(|(row, col, _)| CellKey::new(sheet_idx, row, col)),
        );
    }
    keys
}

/// Concrete formula text of the cell at (`row`, `col`)
///
/// A shared-formula follower gets its group's template shifted by its offset
/// from the anchor.
pub fn formula_text_at(
    cells: &CellStorage,
    row: u32,
    col: u16,
    formula: &CellFormula,
) -> FormulaResult<String> {
    match formula {
        CellFormula::Shared { index, text } if text.is_empty() => {
            let (anchor_row, anchor_col, anchor) =
                cells.shared_formula_anchor(*index).ok_or_else(|| {
                    FormulaError::Evaluation(format!("Shared formula {} has no anchor cell", index))
                })?;
            resolve_shared_formula(
                col as i64 - anchor_col as i64,
                row as i64 - anchor_row as i64,
                anchor.formula_text(),
            )
        }
        other => Ok(other.text().to_string()),
    }
}

/// Tokenize, parse and evaluate formula text
pub fn evaluate_formula(formula: &str, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    evaluate_tokens(&tokenize(formula)?, ctx)
}

/// Evaluate a token stream
///
/// An empty stream is [`FormulaError::EmptyFormula`].
///
/// # Example
/// ```rust
/// use sheetcalc_formula::{evaluate_tokens, tokenize, EvaluationContext, FormulaValue};
///
/// let tokens = tokenize("=2*(3+4)").unwrap();
/// let value = evaluate_tokens(&tokens, &EvaluationContext::simple()).unwrap();
/// assert_eq!(value, FormulaValue::Number(14.0));
/// ```
pub fn evaluate_tokens(tokens: &[Token], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let ast = parse_tokens(tokens)?;
    evaluate(&ast, ctx)
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::String(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
        FormulaExpr::Error(e) => Ok(FormulaValue::Error(*e)),

        // === References ===
        FormulaExpr::CellRef(cell_ref) => ctx.get_cell_value(
            cell_ref.sheet.as_deref(),
            cell_ref.address.row,
            cell_ref.address.col,
        ),

        FormulaExpr::RangeRef(range_ref) => ctx.get_range_values(
            range_ref.sheet.as_deref(),
            range_ref.range.start.row,
            range_ref.range.start.col,
            range_ref.range.end.row,
            range_ref.range.end.col,
        ),

        FormulaExpr::NameRef(name) => {
            tracing::debug!("defined name '{name}' is not supported");
            Ok(FormulaValue::Error(CellError::Name))
        }

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),

        // === Arrays ===
        FormulaExpr::Array(rows) => {
            let mut result_rows = Vec::with_capacity(rows.len());
            for row in rows {
                let mut result_row = Vec::with_capacity(row.len());
                for expr in row {
                    result_row.push(evaluate(expr, ctx)?);
                }
                result_rows.push(result_row);
            }
            Ok(FormulaValue::Array(result_rows))
        }
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    // A range used as an operand contributes its top-left value
    let left_val = evaluate(left, ctx)?.into_scalar();
    let right_val = evaluate(right, ctx)?.into_scalar();

    // Propagate errors
    if let Some(e) = left_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }
    if let Some(e) = right_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    let numbers = || -> Result<(f64, f64), CellError> {
        Ok((left_val.coerce_number()?, right_val.coerce_number()?))
    };

    let value = match op {
        // Arithmetic operators
        BinaryOperator::Add => numbers().map(|(l, r)| l + r),
        BinaryOperator::Subtract => numbers().map(|(l, r)| l - r),
        BinaryOperator::Multiply => numbers().map(|(l, r)| l * r),
        BinaryOperator::Divide => numbers().and_then(|(l, r)| {
            if r == 0.0 {
                Err(CellError::Div0)
            } else {
                Ok(l / r)
            }
        }),
        BinaryOperator::Power => numbers().and_then(|(l, r)| {
            let result = l.powf(r);
            if result.is_finite() {
                Ok(result)
            } else {
                Err(CellError::Num)
            }
        }),

        // Comparison operators
        BinaryOperator::Equal => return Ok(compare(&left_val, &right_val, Ordering::is_eq)),
        BinaryOperator::NotEqual => return Ok(compare(&left_val, &right_val, Ordering::is_ne)),
        BinaryOperator::LessThan => return Ok(compare(&left_val, &right_val, Ordering::is_lt)),
        BinaryOperator::LessEqual => return Ok(compare(&left_val, &right_val, Ordering::is_le)),
        BinaryOperator::GreaterThan => return Ok(compare(&left_val, &right_val, Ordering::is_gt)),
        BinaryOperator::GreaterEqual => {
            return Ok(compare(&left_val, &right_val, Ordering::is_ge))
        }

        // Concatenation
        BinaryOperator::Concat => {
            let mut text = left_val.as_string();
            text.push_str(&right_val.as_string());
            return Ok(FormulaValue::String(text));
        }
    };

    Ok(value.map_or_else(FormulaValue::Error, FormulaValue::Number))
}

fn compare(
    left: &FormulaValue,
    right: &FormulaValue,
    test: fn(Ordering) -> bool,
) -> FormulaValue {
    FormulaValue::Boolean(test(compare_values(left, right)))
}

/// Compare two values for ordering (spreadsheet-style comparison)
fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    // Blank compares as 0 against numbers, "" against text, FALSE against booleans
    let blank_as = |other: &FormulaValue| match other {
        FormulaValue::String(_) => FormulaValue::String(String::new()),
        FormulaValue::Boolean(_) => FormulaValue::Boolean(false),
        _ => FormulaValue::Number(0.0),
    };
    let left = match left {
        FormulaValue::Empty => blank_as(right),
        v => v.clone(),
    };
    let right = match right {
        FormulaValue::Empty => blank_as(&left),
        v => v.clone(),
    };

    match (&left, &right) {
        // Numbers compare numerically
        (FormulaValue::Number(l), FormulaValue::Number(r)) => {
            l.partial_cmp(r).unwrap_or(Ordering::Equal)
        }

        // Strings compare case-insensitively
        (FormulaValue::String(l), FormulaValue::String(r)) => {
            l.to_lowercase().cmp(&r.to_lowercase())
        }

        // Booleans: FALSE < TRUE
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(r),

        // Mixed types: number < string < boolean
        (l, r) => type_rank(l).cmp(&type_rank(r)),
    }
}

fn type_rank(value: &FormulaValue) -> u8 {
    match value {
        FormulaValue::Number(_) | FormulaValue::Empty => 0,
        FormulaValue::String(_) => 1,
        FormulaValue::Boolean(_) => 2,
        FormulaValue::Error(_) | FormulaValue::Array(_) => 3,
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let val = evaluate(operand, ctx)?.into_scalar();

    let n = match val.coerce_number() {
        Ok(n) => n,
        Err(e) => return Ok(FormulaValue::Error(e)),
    };

    match op {
        UnaryOperator::Negate => Ok(FormulaValue::Number(-n)),
        UnaryOperator::Percent => Ok(FormulaValue::Number(n / 100.0)),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let func = match FunctionRegistry::global().get(name) {
        Some(func) => func,
        None => {
            tracing::debug!("unknown function {name}");
            return Ok(FormulaValue::Error(CellError::Name));
        }
    };

    if !func.accepts(args.len()) {
        tracing::debug!("{name} called with {} arguments", args.len());
        return Ok(FormulaValue::Error(CellError::Value));
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    match (func.implementation)(&evaluated_args) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::debug!("{name} failed: {e}");
            Ok(FormulaValue::Error(e.fallback_error()))
        }
    }
}
