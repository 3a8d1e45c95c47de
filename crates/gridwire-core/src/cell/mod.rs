//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The resolved value a cell displays
//! - [`RawContent`] - What the user typed (literal or formula)
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")

mod address;
mod raw;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use raw::{RawContent, FORMULA_MARKER};
pub use value::{CellError, CellValue};
