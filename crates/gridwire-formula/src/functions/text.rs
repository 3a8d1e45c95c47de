//! Text functions

use super::{scalars, single};
use crate::error::FormulaResult;
use crate::evaluator::FormulaValue;

/// Apply `f` to the text of the single argument
fn map_text(args: &[FormulaValue], f: impl FnOnce(String) -> FormulaValue) -> FormulaValue {
    match args.first().map(single) {
        Some(Ok(value)) => f(value.as_string()),
        Some(Err(e)) => e,
        None => f(String::new()),
    }
}

/// CONCATENATE(text1, ...)
pub fn fn_concatenate(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let mut out = String::new();
    for value in scalars(args) {
        if let FormulaValue::Error(e) = value {
            return Ok(FormulaValue::Error(*e));
        }
        out.push_str(&value.as_string());
    }
    Ok(FormulaValue::String(out))
}

/// LEN(text)
pub fn fn_len(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(map_text(args, |s| FormulaValue::Number(s.chars().count() as f64)))
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(map_text(args, |s| FormulaValue::String(s.to_uppercase())))
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(map_text(args, |s| FormulaValue::String(s.to_lowercase())))
}
