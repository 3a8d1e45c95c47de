//! Built-in functions

pub mod logical;
pub mod math;
pub mod text;

use crate::error::FormulaResult;
use crate::evaluator::FormulaValue;
use std::collections::HashMap;

/// Function implementation signature
pub type FunctionImpl = fn(&[FormulaValue]) -> FormulaResult<FormulaValue>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    const fn new(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation,
        }
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_text_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Names of every registered function, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.values().map(|def| def.name).collect();
        names.sort_unstable();
        names
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef::new("SUM", 1, None, math::fn_sum));
        self.register(FunctionDef::new("AVERAGE", 1, None, math::fn_average));
        self.register(FunctionDef::new("MIN", 1, None, math::fn_min));
        self.register(FunctionDef::new("MAX", 1, None, math::fn_max));
        self.register(FunctionDef::new("COUNT", 1, None, math::fn_count));
        self.register(FunctionDef::new("ABS", 1, Some(1), math::fn_abs));
        self.register(FunctionDef::new("ROUND", 1, Some(2), math::fn_round));
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef::new("IF", 2, Some(3), logical::fn_if));
        self.register(FunctionDef::new("AND", 1, None, logical::fn_and));
        self.register(FunctionDef::new("OR", 1, None, logical::fn_or));
        self.register(FunctionDef::new("NOT", 1, Some(1), logical::fn_not));
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef::new("CONCATENATE", 1, None, text::fn_concatenate));
        self.register(FunctionDef::new("LEN", 1, Some(1), text::fn_len));
        self.register(FunctionDef::new("UPPER", 1, Some(1), text::fn_upper));
        self.register(FunctionDef::new("LOWER", 1, Some(1), text::fn_lower));
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten arguments into scalars, expanding ranges row-major
pub(crate) fn scalars(args: &[FormulaValue]) -> Vec<&FormulaValue> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        arg.for_each_scalar(&mut |value| out.push(value));
    }
    out
}

/// Single scalar argument, or `#VALUE!` when it is a range
pub(crate) fn single(arg: &FormulaValue) -> Result<&FormulaValue, FormulaValue> {
    match arg {
        FormulaValue::Array(_) => Err(FormulaValue::Error(gridwire_core::CellError::Value)),
        FormulaValue::Error(e) => Err(FormulaValue::Error(*e)),
        value => Ok(value),
    }
}
