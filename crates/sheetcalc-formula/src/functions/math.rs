//! Math functions

use super::{first_error, FunctionDef};
use crate::error::FormulaResult;
use crate::value::FormulaValue;
use sheetcalc_core::CellError;

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::new("SUM", 1, None, fn_sum),
    FunctionDef::new("AVERAGE", 1, None, fn_average),
    FunctionDef::new("MIN", 1, None, fn_min),
    FunctionDef::new("MAX", 1, None, fn_max),
    FunctionDef::new("COUNT", 1, None, fn_count),
    FunctionDef::new("ABS", 1, Some(1), fn_abs),
    FunctionDef::new("ROUND", 1, Some(2), fn_round),
    FunctionDef::new("MOD", 2, Some(2), fn_mod),
    FunctionDef::new("INT", 1, Some(1), fn_int),
    FunctionDef::new("POWER", 2, Some(2), fn_power),
    FunctionDef::new("SQRT", 1, Some(1), fn_sqrt),
];

/// Numbers among the arguments; text, booleans and blanks inside ranges are skipped
fn numbers(args: &[FormulaValue]) -> Vec<f64> {
    let mut out = Vec::new();
    for arg in args {
        arg.for_each_scalar(&mut |v| {
            if let FormulaValue::Number(n) = v {
                out.push(*n);
            }
        });
    }
    out
}

/// Numeric argument at `index`, or the error value to return instead
fn number_arg(args: &[FormulaValue], index: usize, default: f64) -> Result<f64, CellError> {
    match args.get(index) {
        None => Ok(default),
        Some(v) => v.clone().into_scalar().coerce_number(),
    }
}

macro_rules! try_num {
    ($e:expr) => {
        match $e {
            Ok(n) => n,
            Err(e) => return Ok(FormulaValue::Error(e)),
        }
    };
}

/// SUM function
pub fn fn_sum(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Number(numbers(args).iter().sum()))
}

/// AVERAGE function
pub fn fn_average(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    let values = numbers(args);
    if values.is_empty() {
        return Ok(FormulaValue::Error(CellError::Div0));
    }
    Ok(FormulaValue::Number(
        values.iter().sum::<f64>() / values.len() as f64,
    ))
}

/// MIN function, 0 when there are no numbers
pub fn fn_min(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    let min = numbers(args).into_iter().reduce(f64::min);
    Ok(FormulaValue::Number(min.unwrap_or(0.0)))
}

/// MAX function, 0 when there are no numbers
pub fn fn_max(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    let max = numbers(args).into_iter().reduce(f64::max);
    Ok(FormulaValue::Number(max.unwrap_or(0.0)))
}

/// COUNT function
pub fn fn_count(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(numbers(args).len() as f64))
}

/// ABS(number)
pub fn fn_abs(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let n = try_num!(number_arg(args, 0, 0.0));
    Ok(FormulaValue::Number(n.abs()))
}

/// ROUND(number, [num_digits]), half away from zero
pub fn fn_round(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let number = try_num!(number_arg(args, 0, 0.0));
    let digits = try_num!(number_arg(args, 1, 0.0)) as i32;

    let multiplier = 10_f64.powi(digits);
    let result = if number >= 0.0 {
        (number * multiplier + 0.5).floor() / multiplier
    } else {
        (number * multiplier - 0.5).ceil() / multiplier
    };

    Ok(FormulaValue::Number(result))
}

/// MOD(number, divisor), result takes the sign of the divisor
pub fn fn_mod(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let number = try_num!(number_arg(args, 0, 0.0));
    let divisor = try_num!(number_arg(args, 1, 0.0));

    if divisor == 0.0 {
        return Ok(FormulaValue::Error(CellError::Div0));
    }

    Ok(FormulaValue::Number(
        number - divisor * (number / divisor).floor(),
    ))
}

/// INT(number), rounds toward negative infinity
pub fn fn_int(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let n = try_num!(number_arg(args, 0, 0.0));
    Ok(FormulaValue::Number(n.floor()))
}

/// POWER(number, power)
pub fn fn_power(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let number = try_num!(number_arg(args, 0, 0.0));
    let power = try_num!(number_arg(args, 1, 0.0));

    let result = number.powf(power);
    if result.is_finite() {
        Ok(FormulaValue::Number(result))
    } else {
        Ok(FormulaValue::Error(CellError::Num))
    }
}

/// SQRT(number), `#NUM!` for negatives
pub fn fn_sqrt(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let n = try_num!(number_arg(args, 0, 0.0));
    if n < 0.0 {
        return Ok(FormulaValue::Error(CellError::Num));
    }
    Ok(FormulaValue::Number(n.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nums(values: &[f64]) -> Vec<FormulaValue> {
        values.iter().map(|n| FormulaValue::Number(*n)).collect()
    }

    #[test]
    fn test_aggregates_over_ranges() {
        let range = FormulaValue::Array(vec![
            vec![1.0.into(), "text".into()],
            vec![FormulaValue::Empty, 5.0.into()],
        ]);
        let args = [range, 4.0.into()];
        assert_eq!(fn_sum(&args).unwrap(), FormulaValue::Number(10.0));
        assert_eq!(fn_count(&args).unwrap(), FormulaValue::Number(3.0));
        assert_eq!(fn_min(&args).unwrap(), FormulaValue::Number(1.0));
        assert_eq!(fn_max(&args).unwrap(), FormulaValue::Number(5.0));
        assert_eq!(
            fn_average(&args).unwrap().as_number().map(|n| (n * 1000.0).round()),
            Some(3333.0)
        );
    }

    #[test]
    fn test_errors_propagate() {
        let args = [1.0.into(), FormulaValue::Error(CellError::Na)];
        assert_eq!(fn_sum(&args).unwrap(), FormulaValue::Error(CellError::Na));
        assert_eq!(
            fn_average(&[FormulaValue::Array(vec![])]).unwrap(),
            FormulaValue::Error(CellError::Div0)
        );
    }

    #[test]
    fn test_round() {
        assert_eq!(fn_round(&nums(&[2.5])).unwrap(), FormulaValue::Number(3.0));
        assert_eq!(fn_round(&nums(&[-2.5])).unwrap(), FormulaValue::Number(-3.0));
        assert_eq!(
            fn_round(&nums(&[1234.5678, 2.0])).unwrap(),
            FormulaValue::Number(1234.57)
        );
        assert_eq!(
            fn_round(&nums(&[1234.0, -2.0])).unwrap(),
            FormulaValue::Number(1200.0)
        );
    }

    #[test]
    fn test_mod_and_int() {
        assert_eq!(fn_mod(&nums(&[-3.0, 2.0])).unwrap(), FormulaValue::Number(1.0));
        assert_eq!(
            fn_mod(&nums(&[3.0, 0.0])).unwrap(),
            FormulaValue::Error(CellError::Div0)
        );
        assert_eq!(fn_int(&nums(&[-1.5])).unwrap(), FormulaValue::Number(-2.0));
    }

    #[test]
    fn test_power_and_sqrt() {
        assert_eq!(fn_power(&nums(&[2.0, 10.0])).unwrap(), FormulaValue::Number(1024.0));
        assert_eq!(
            fn_power(&nums(&[0.0, -1.0])).unwrap(),
            FormulaValue::Error(CellError::Num)
        );
        assert_eq!(fn_sqrt(&nums(&[16.0])).unwrap(), FormulaValue::Number(4.0));
        assert_eq!(
            fn_sqrt(&nums(&[-1.0])).unwrap(),
            FormulaValue::Error(CellError::Num)
        );
        assert_eq!(
            fn_abs(&["x".into()]).unwrap(),
            FormulaValue::Error(CellError::Value)
        );
    }
}
