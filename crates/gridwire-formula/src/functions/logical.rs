//! Logical functions

use super::{scalars, single};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::FormulaValue;
use gridwire_core::CellError;

/// IF(condition, value_if_true, [value_if_false])
pub fn fn_if(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let (condition, if_true) = match args {
        [condition, if_true, ..] => (condition, if_true),
        _ => {
            return Err(FormulaError::Argument(
                "IF requires at least 2 arguments".into(),
            ))
        }
    };

    let condition = match single(condition) {
        Ok(value) => value,
        Err(e) => return Ok(e),
    };

    match condition.as_bool() {
        Some(true) => Ok(if_true.clone()),
        Some(false) => Ok(args.get(2).cloned().unwrap_or(FormulaValue::Boolean(false))),
        None => Ok(FormulaValue::Error(CellError::Value)),
    }
}

/// Truth values among the arguments; text and empty cells are skipped
fn truths(args: &[FormulaValue]) -> Result<Vec<bool>, CellError> {
    let mut out = Vec::new();
    for value in scalars(args) {
        match value {
            FormulaValue::Boolean(b) => out.push(*b),
            FormulaValue::Number(n) => out.push(*n != 0.0),
            FormulaValue::Error(e) => return Err(*e),
            _ => {}
        }
    }
    Ok(out)
}

/// AND function
pub fn fn_and(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(match truths(args) {
        Ok(values) if values.is_empty() => FormulaValue::Error(CellError::Value),
        Ok(values) => FormulaValue::Boolean(values.into_iter().all(|b| b)),
        Err(e) => FormulaValue::Error(e),
    })
}

/// OR function
pub fn fn_or(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(match truths(args) {
        Ok(values) if values.is_empty() => FormulaValue::Error(CellError::Value),
        Ok(values) => FormulaValue::Boolean(values.into_iter().any(|b| b)),
        Err(e) => FormulaValue::Error(e),
    })
}

/// NOT function
pub fn fn_not(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let arg = args
        .first()
        .ok_or_else(|| FormulaError::Argument("NOT requires 1 argument".into()))?;

    let value = match single(arg) {
        Ok(value) => value,
        Err(e) => return Ok(e),
    };

    Ok(value
        .as_bool()
        .map_or(FormulaValue::Error(CellError::Value), |b| {
            FormulaValue::Boolean(!b)
        }))
}
