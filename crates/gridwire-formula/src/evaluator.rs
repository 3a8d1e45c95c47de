//! Formula evaluator
//!
//! Walks a formula AST, pulling referenced values through a [`CellResolver`].

use crate::adapter::CellResolver;
use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use gridwire_core::{CellError, CellValue};
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

pub(crate) fn function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    /// Row-major block of values produced by a range reference
    Array(Vec<Vec<FormulaValue>>),
    Empty,
}

impl FormulaValue {
    /// Convert to number, if possible
    ///
    /// Numeric text coerces, so a literal typed as `" 2"` still adds.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(1.0),
            FormulaValue::Boolean(false) => Some(0.0),
            FormulaValue::String(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            FormulaValue::Empty => Some(0.0),
            _ => None,
        }
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("TRUE") => Some(true),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("FALSE") => Some(false),
            FormulaValue::Empty => Some(false),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => CellValue::Number(*n).to_string(),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
            FormulaValue::Array(_) => CellError::Value.to_string(),
        }
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Visit every scalar, flattening arrays row-major
    pub(crate) fn for_each_scalar<'v>(&'v self, f: &mut dyn FnMut(&'v FormulaValue)) {
        match self {
            FormulaValue::Array(rows) => {
                for value in rows.iter().flatten() {
                    value.for_each_scalar(f);
                }
            }
            scalar => f(scalar),
        }
    }
}

impl From<CellValue> for FormulaValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Empty => FormulaValue::Empty,
            CellValue::Number(n) => FormulaValue::Number(n),
            CellValue::String(s) => FormulaValue::String(s),
            CellValue::Boolean(b) => FormulaValue::Boolean(b),
            CellValue::Error(e) => FormulaValue::Error(e),
        }
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Empty => CellValue::Empty,
            FormulaValue::Number(n) if n.is_finite() => CellValue::Number(n),
            FormulaValue::Number(_) => CellValue::Error(CellError::Num),
            FormulaValue::String(s) => CellValue::String(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            // A bare range cannot be shown in one cell
            FormulaValue::Array(_) => CellValue::Error(CellError::Value),
        }
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, resolver: &mut dyn CellResolver) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::String(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
        FormulaExpr::Error(e) => Ok(FormulaValue::Error(*e)),

        // === References ===
        FormulaExpr::CellRef(addr) => Ok(resolver.resolve_cell(*addr)),
        FormulaExpr::RangeRef(range) => Ok(FormulaValue::Array(resolver.resolve_range(*range))),
        FormulaExpr::NameRef(_) => Ok(FormulaValue::Error(CellError::Name)),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => {
            evaluate_binary_op(*op, left, right, resolver)
        }
        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, resolver),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, resolver),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    resolver: &mut dyn CellResolver,
) -> FormulaResult<FormulaValue> {
    // Both sides are always evaluated so every reference is read
    let left_val = evaluate(left, resolver);
    let right_val = evaluate(right, resolver);
    let (left_val, right_val) = (left_val?, right_val?);

    // Propagate errors
    if let Some(e) = left_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }
    if let Some(e) = right_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    match op {
        BinaryOperator::Add => arithmetic(&left_val, &right_val, |l, r| l + r),
        BinaryOperator::Subtract => arithmetic(&left_val, &right_val, |l, r| l - r),
        BinaryOperator::Multiply => arithmetic(&left_val, &right_val, |l, r| l * r),
        BinaryOperator::Divide => match (left_val.as_number(), right_val.as_number()) {
            (Some(_), Some(r)) if r == 0.0 => Ok(FormulaValue::Error(CellError::Div0)),
            _ => arithmetic(&left_val, &right_val, |l, r| l / r),
        },
        BinaryOperator::Power => arithmetic(&left_val, &right_val, f64::powf),

        BinaryOperator::Equal => compare(&left_val, &right_val, Ordering::is_eq),
        BinaryOperator::NotEqual => compare(&left_val, &right_val, Ordering::is_ne),
        BinaryOperator::LessThan => compare(&left_val, &right_val, Ordering::is_lt),
        BinaryOperator::LessEqual => compare(&left_val, &right_val, Ordering::is_le),
        BinaryOperator::GreaterThan => compare(&left_val, &right_val, Ordering::is_gt),
        BinaryOperator::GreaterEqual => compare(&left_val, &right_val, Ordering::is_ge),

        BinaryOperator::Concat => Ok(FormulaValue::String(
            left_val.as_string() + &right_val.as_string(),
        )),
    }
}

fn arithmetic(
    left: &FormulaValue,
    right: &FormulaValue,
    f: impl Fn(f64, f64) -> f64,
) -> FormulaResult<FormulaValue> {
    // Non-numeric operands are a value error, not a failed evaluation
    let (Some(l), Some(r)) = (left.as_number(), right.as_number()) else {
        return Ok(FormulaValue::Error(CellError::Value));
    };
    let result = f(l, r);
    if result.is_finite() {
        Ok(FormulaValue::Number(result))
    } else {
        Ok(FormulaValue::Error(CellError::Num))
    }
}

fn compare(
    left: &FormulaValue,
    right: &FormulaValue,
    test: fn(Ordering) -> bool,
) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(test(compare_values(left, right))))
}

/// Compare two values for ordering (spreadsheet-style comparison)
fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    fn rank(value: &FormulaValue) -> u8 {
        // Mixed types: number < string < boolean
        match value {
            FormulaValue::Number(_) | FormulaValue::Empty => 0,
            FormulaValue::String(_) => 1,
            FormulaValue::Boolean(_) => 2,
            FormulaValue::Error(_) | FormulaValue::Array(_) => 3,
        }
    }

    match (left, right) {
        (FormulaValue::String(l), FormulaValue::String(r)) => {
            l.to_lowercase().cmp(&r.to_lowercase())
        }
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(r),
        (l, r) if rank(l) == 0 && rank(r) == 0 => {
            let l = l.as_number().unwrap_or(0.0);
            let r = r.as_number().unwrap_or(0.0);
            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        (l, r) => rank(l).cmp(&rank(r)),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    resolver: &mut dyn CellResolver,
) -> FormulaResult<FormulaValue> {
    let val = evaluate(operand, resolver)?;

    if let Some(e) = val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    let Some(n) = val.as_number() else {
        return Ok(FormulaValue::Error(CellError::Value));
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
    resolver: &mut dyn CellResolver,
) -> FormulaResult<FormulaValue> {
    // Arguments are evaluated first so every reference is read, even when the call fails
    let evaluated: Vec<FormulaResult<FormulaValue>> =
        args.iter().map(|arg| evaluate(arg, resolver)).collect();
    let evaluated_args = evaluated.into_iter().collect::<FormulaResult<Vec<_>>>()?;

    let func = function_registry()
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    (func.implementation)(&evaluated_args)
}
