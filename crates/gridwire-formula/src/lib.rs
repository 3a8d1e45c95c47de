//! # gridwire-formula
//!
//! Formula evaluation for gridwire.
//!
//! This crate provides:
//! - The evaluator contract ([`FormulaEvaluator`], [`CellResolver`]) a grid
//!   uses to compute formula cells
//! - [`BuiltinEvaluator`], a spreadsheet-style implementation of that contract
//! - Formula parsing (text → AST) and evaluation (AST → value)
//!
//! ## Example
//!
//! ```rust
//! use gridwire_core::{CellAddress, CellValue};
//! use gridwire_formula::{BuiltinEvaluator, CellResolver, FormulaEvaluator, FormulaValue};
//!
//! struct Constant;
//!
//! impl CellResolver for Constant {
//!     fn resolve_cell(&mut self, _address: CellAddress) -> FormulaValue {
//!         FormulaValue::Number(2.0)
//!     }
//! }
//!
//! let value = BuiltinEvaluator.evaluate("SUM(A1:A3)*10", &mut Constant).unwrap();
//! assert_eq!(value, CellValue::Number(60.0));
//! ```

pub mod adapter;
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use adapter::{BuiltinEvaluator, CellResolver, FormulaEvaluator};
pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, FormulaValue};
pub use parser::parse_formula;
