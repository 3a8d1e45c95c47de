//! # gridwire-core
//!
//! Core data structures for the gridwire reactive grid.
//!
//! This crate provides the fundamental types used throughout gridwire:
//! - [`CellValue`] and [`CellError`] - What a cell displays
//! - [`RawContent`] - What a cell holds before evaluation (literal or formula)
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`GridOptions`] - Grid bounds and propagation settings
//!
//! ## Example
//!
//! ```rust
//! use gridwire_core::{CellAddress, GridOptions, RawContent};
//!
//! let options = GridOptions::default();
//! let addr = options.locate("C1").unwrap();
//! assert_eq!(addr, CellAddress::new(0, 2));
//!
//! assert!(RawContent::classify("=A1+B1").is_formula());
//! ```

pub mod cell;
pub mod error;
pub mod options;

// Re-exports for convenience
pub use cell::{
    CellAddress, CellError, CellRange, CellRangeIterator, CellValue, RawContent, FORMULA_MARKER,
};
pub use error::{Error, Result};
pub use options::{GridOptions, Propagation, MAX_COLUMNS, MAX_ROWS};
