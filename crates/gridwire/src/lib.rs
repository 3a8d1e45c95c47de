//! # gridwire
//!
//! An in-memory reactive grid: named cells holding literals or formulas,
//! kept consistent under edits.
//!
//! ## Features
//!
//! - Cells addressed as `A1`..`Z{rows}` with literal or formula content
//! - Dependency edges recorded while formulas evaluate, never declared
//! - Every-path or topological propagation after each edit
//! - Cycle and depth-limit diagnostics instead of runaway recursion
//! - Pluggable formula evaluation via [`FormulaEvaluator`]
//!
//! ## Example
//!
//! ```rust
//! use gridwire::prelude::*;
//!
//! let mut grid = Grid::new();
//!
//! grid.on_edit("A1", "2").unwrap();
//! grid.on_edit("A2", "3").unwrap();
//! grid.on_edit("A3", "=SUM(A1:A2)").unwrap();
//! assert_eq!(grid.display_value("A3").unwrap(), &CellValue::Number(5.0));
//!
//! // Editing a precedent updates the formula without touching it
//! grid.on_edit("A1", "10").unwrap();
//! assert_eq!(grid.display_value("A3").unwrap(), &CellValue::Number(13.0));
//!
//! // The editor gets the formula back, not its value
//! assert_eq!(grid.raw_text("A3").unwrap(), "=SUM(A1:A2)");
//! ```

pub mod calculation;
pub mod dependency;
pub mod grid;
pub mod prelude;
pub mod store;

pub use calculation::{Diagnostic, RecalcReport};
pub use dependency::{DependencyGraph, RecalcPlan};
pub use grid::Grid;
pub use store::{Cell, CellStore};

// Re-export core types
pub use gridwire_core::{
    CellAddress, CellError, CellRange, CellValue, Error, GridOptions, Propagation, RawContent,
    Result, FORMULA_MARKER, MAX_COLUMNS, MAX_ROWS,
};

// Re-export formula types
pub use gridwire_formula::{
    BuiltinEvaluator, CellResolver, FormulaError, FormulaEvaluator, FormulaResult, FormulaValue,
};
