//! Logical functions

use super::{first_error, FunctionDef};
use crate::error::FormulaResult;
use crate::value::FormulaValue;
use sheetcalc_core::CellError;

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::new("IF", 2, Some(3), fn_if),
    FunctionDef::new("AND", 1, None, fn_and),
    FunctionDef::new("OR", 1, None, fn_or),
    FunctionDef::new("NOT", 1, Some(1), fn_not),
    FunctionDef::new("IFERROR", 2, Some(2), fn_iferror),
];

/// Truth values among the arguments; text and blanks are skipped
fn truth_values(args: &[FormulaValue]) -> Vec<bool> {
    let mut out = Vec::new();
    for arg in args {
        arg.for_each_scalar(&mut |v| match v {
            FormulaValue::Boolean(b) => out.push(*b),
            FormulaValue::Number(n) => out.push(*n != 0.0),
            _ => {}
        });
    }
    out
}

/// IF(condition, value_if_true, [value_if_false])
pub fn fn_if(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let condition = match args.first().cloned().map(FormulaValue::into_scalar) {
        Some(FormulaValue::Error(e)) => return Ok(FormulaValue::Error(e)),
        Some(v) => v.as_bool(),
        None => None,
    };

    match condition {
        Some(true) => Ok(args.get(1).cloned().unwrap_or(FormulaValue::Boolean(true))),
        Some(false) => Ok(args.get(2).cloned().unwrap_or(FormulaValue::Boolean(false))),
        None => Ok(FormulaValue::Error(CellError::Value)),
    }
}

/// AND(logical1, ...)
pub fn fn_and(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    let values = truth_values(args);
    if values.is_empty() {
        return Ok(FormulaValue::Error(CellError::Value));
    }
    Ok(FormulaValue::Boolean(values.into_iter().all(|b| b)))
}

/// OR(logical1, ...)
pub fn fn_or(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    let values = truth_values(args);
    if values.is_empty() {
        return Ok(FormulaValue::Error(CellError::Value));
    }
    Ok(FormulaValue::Boolean(values.into_iter().any(|b| b)))
}

/// NOT(logical)
pub fn fn_not(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    match args.first().cloned().map(FormulaValue::into_scalar) {
        Some(FormulaValue::Error(e)) => Ok(FormulaValue::Error(e)),
        Some(v) => Ok(v
            .as_bool()
            .map_or(FormulaValue::Error(CellError::Value), |b| {
                FormulaValue::Boolean(!b)
            })),
        None => Ok(FormulaValue::Error(CellError::Value)),
    }
}

/// IFERROR(value, value_if_error)
pub fn fn_iferror(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    match (args.first(), args.get(1)) {
        (Some(FormulaValue::Error(_)), Some(fallback)) => Ok(fallback.clone()),
        (Some(value), _) => Ok(value.clone()),
        (None, _) => Ok(FormulaValue::Error(CellError::Value)),
    }
}
