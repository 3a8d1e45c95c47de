//! Prelude module - common imports for gridwire users
//!
//! ```rust
//! use gridwire::prelude::*;
//! ```

pub use crate::{
    // Formula evaluation
    BuiltinEvaluator,
    CellAddress,
    CellError,
    CellRange,
    CellResolver,
    // Cell types
    CellValue,
    // Recalculation
    Diagnostic,
    // Error types
    Error,
    FormulaError,
    FormulaEvaluator,
    FormulaResult,
    FormulaValue,
    // Main types
    Grid,
    GridOptions,
    Propagation,
    RawContent,
    RecalcReport,
    Result,
};
