//! Formula error types

use gridwire_core::CellError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Reference to invalid cell or unknown name
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl FormulaError {
    /// The marker a cell shows when its formula fails with this error
    pub fn to_cell_error(&self) -> CellError {
        match self {
            FormulaError::Parse(_) => CellError::Error,
            FormulaError::UnknownFunction(_) => CellError::Name,
            FormulaError::InvalidReference(_) => CellError::Ref,
            FormulaError::Evaluation(_)
            | FormulaError::Argument(_)
            | FormulaError::ArgumentCount { .. } => CellError::Value,
        }
    }
}

impl From<FormulaError> for CellError {
    fn from(err: FormulaError) -> Self {
        err.to_cell_error()
    }
}
