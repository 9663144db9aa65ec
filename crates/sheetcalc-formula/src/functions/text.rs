//! Text functions

use super::{first_error, FunctionDef};
use crate::error::FormulaResult;
use crate::value::FormulaValue;
use sheetcalc_core::CellError;

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::new("CONCATENATE", 1, None, fn_concat),
    FunctionDef::new("CONCAT", 1, None, fn_concat),
    FunctionDef::new("LEN", 1, Some(1), fn_len),
    FunctionDef::new("UPPER", 1, Some(1), fn_upper),
    FunctionDef::new("LOWER", 1, Some(1), fn_lower),
    FunctionDef::new("LEFT", 1, Some(2), fn_left),
    FunctionDef::new("RIGHT", 1, Some(2), fn_right),
    FunctionDef::new("TRIM", 1, Some(1), fn_trim),
];

/// Text of the first argument, or the error value to return instead
fn text_arg(args: &[FormulaValue]) -> Result<String, CellError> {
    match args.first() {
        Some(FormulaValue::Error(e)) => Err(*e),
        Some(FormulaValue::Array(_)) => Err(CellError::Value),
        Some(v) => Ok(v.as_string()),
        None => Err(CellError::Value),
    }
}

/// Character count argument for LEFT/RIGHT, 1 when omitted
fn count_arg(args: &[FormulaValue]) -> Result<usize, CellError> {
    let n = match args.get(1) {
        None => return Ok(1),
        Some(v) => v.coerce_number()?.trunc(),
    };
    if n < 0.0 {
        return Err(CellError::Value);
    }
    Ok(n as usize)
}

macro_rules! try_arg {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => return Ok(FormulaValue::Error(e)),
        }
    };
}

/// CONCAT(text1, ...), also registered as CONCATENATE
pub fn fn_concat(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    let mut out = String::new();
    for arg in args {
        arg.for_each_scalar(&mut |v| out.push_str(&v.as_string()));
    }
    Ok(FormulaValue::String(out))
}

/// LEN(text)
pub fn fn_len(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let s = try_arg!(text_arg(args));
    Ok(FormulaValue::Number(s.chars().count() as f64))
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::String(try_arg!(text_arg(args)).to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::String(try_arg!(text_arg(args)).to_lowercase()))
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let s = try_arg!(text_arg(args));
    let n = try_arg!(count_arg(args));
    Ok(FormulaValue::String(s.chars().take(n).collect()))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let s = try_arg!(text_arg(args));
    let n = try_arg!(count_arg(args));
    let skip = s.chars().count().saturating_sub(n);
    Ok(FormulaValue::String(s.chars().skip(skip).collect()))
}

/// TRIM(text), collapses inner runs of spaces
pub fn fn_trim(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let s = try_arg!(text_arg(args));
    Ok(FormulaValue::String(
        s.split_whitespace().collect::<Vec<_>>().join(" "),
    ))
}
