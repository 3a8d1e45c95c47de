//! Math functions

use super::{scalars, single};
use crate::error::FormulaResult;
use crate::evaluator::FormulaValue;
use gridwire_core::CellError;

/// Numbers among the arguments; the first error wins
///
/// Text, booleans and empty cells are skipped, as in every spreadsheet.
fn numbers(args: &[FormulaValue]) -> Result<Vec<f64>, CellError> {
    let mut out = Vec::new();
    for value in scalars(args) {
        match value {
            FormulaValue::Number(n) => out.push(*n),
            FormulaValue::Error(e) => return Err(*e),
            _ => {} // Ignore non-numeric
        }
    }
    Ok(out)
}

/// SUM function
pub fn fn_sum(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(match numbers(args) {
        Ok(ns) => FormulaValue::Number(ns.iter().sum()),
        Err(e) => FormulaValue::Error(e),
    })
}

/// AVERAGE function
pub fn fn_average(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(match numbers(args) {
        Ok(ns) if ns.is_empty() => FormulaValue::Error(CellError::Div0),
        Ok(ns) => FormulaValue::Number(ns.iter().sum::<f64>() / ns.len() as f64),
        Err(e) => FormulaValue::Error(e),
    })
}

/// MIN function
pub fn fn_min(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(match numbers(args) {
        Ok(ns) => FormulaValue::Number(ns.into_iter().reduce(f64::min).unwrap_or(0.0)),
        Err(e) => FormulaValue::Error(e),
    })
}

/// MAX function
pub fn fn_max(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(match numbers(args) {
        Ok(ns) => FormulaValue::Number(ns.into_iter().reduce(f64::max).unwrap_or(0.0)),
        Err(e) => FormulaValue::Error(e),
    })
}

/// COUNT function
///
/// Counts numbers only; errors are not counted and do not propagate.
pub fn fn_count(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let count = scalars(args)
        .into_iter()
        .filter(|value| matches!(value, FormulaValue::Number(_)))
        .count();
    Ok(FormulaValue::Number(count as f64))
}

/// ABS(number)
pub fn fn_abs(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let number = match args.first().map(single) {
        Some(Ok(value)) => value.as_number(),
        Some(Err(e)) => return Ok(e),
        None => None,
    };

    Ok(number.map_or(FormulaValue::Error(CellError::Value), |n| {
        FormulaValue::Number(n.abs())
    }))
}

/// ROUND(number, [num_digits])
///
/// Rounds half away from zero: `ROUND(2.5)` is 3, `ROUND(-2.5)` is -3.
pub fn fn_round(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let number = match args.first().map(single) {
        Some(Ok(value)) => match value.as_number() {
            Some(n) => n,
            None => return Ok(FormulaValue::Error(CellError::Value)),
        },
        Some(Err(e)) => return Ok(e),
        None => return Ok(FormulaValue::Error(CellError::Value)),
    };

    let num_digits = match args.get(1).map(single) {
        Some(Ok(value)) => match value.as_number() {
            Some(n) => n.trunc() as i32,
            None => return Ok(FormulaValue::Error(CellError::Value)),
        },
        Some(Err(e)) => return Ok(e),
        None => 0,
    };

    // Negative digits round to the left of the decimal point
    let multiplier = 10_f64.powi(num_digits);
    let result = if number >= 0.0 {
        (number * multiplier + 0.5).floor() / multiplier
    } else {
        (number * multiplier - 0.5).ceil() / multiplier
    };

    Ok(FormulaValue::Number(result))
}
