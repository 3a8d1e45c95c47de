//! Grid configuration

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};

/// Largest column count the single-letter id scheme can address (A..Z)
pub const MAX_COLUMNS: u16 = 26;

/// Largest row count a grid accepts; every cell is allocated up front
pub const MAX_ROWS: u32 = 65_536;

/// How an edit is pushed to the cells that read the edited cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Propagation {
    /// Refresh every dependent recursively, once per path that reaches it
    #[default]
    EveryPath,
    /// Refresh the downstream closure once, in dependency order
    Topological,
}

/// Options for a grid
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GridOptions {
    /// Number of rows (ids `A1`..`A{rows}`)
    pub rows: u32,
    /// Number of columns, at most [`MAX_COLUMNS`]
    pub columns: u16,
    /// Propagation strategy used after each edit
    pub strategy: Propagation,
    /// Maximum propagation depth below the edited cell
    pub max_depth: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            rows: 20,
            columns: 6,
            strategy: Propagation::EveryPath,
            max_depth: 10_000,
        }
    }
}

impl GridOptions {
    /// Create options for a grid of the given size, other fields defaulted
    pub fn with_size(rows: u32, columns: u16) -> Self {
        Self {
            rows,
            columns,
            ..Default::default()
        }
    }

    /// Check that the options describe a usable grid
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.rows > MAX_ROWS {
            return Err(Error::InvalidOptions(format!(
                "rows must be between 1 and {}, got {}",
                MAX_ROWS, self.rows
            )));
        }
        if self.columns == 0 || self.columns > MAX_COLUMNS {
            return Err(Error::InvalidOptions(format!(
                "columns must be between 1 and {}, got {}",
                MAX_COLUMNS, self.columns
            )));
        }
        if self.max_depth == 0 {
            return Err(Error::InvalidOptions("max_depth must be at least 1".into()));
        }
        Ok(())
    }

    /// Check whether an address lies inside the grid
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row < self.rows && addr.col < self.columns
    }

    /// Resolve a cell id to an in-bounds address
    ///
    /// Malformed ids fail with [`Error::InvalidAddress`]; well-formed ids
    /// outside the grid fail with [`Error::UnknownCell`].
    pub fn locate(&self, id: &str) -> Result<CellAddress> {
        let addr = CellAddress::parse(id)?;
        if self.contains(&addr) {
            Ok(addr)
        } else {
            Err(Error::UnknownCell(id.trim().to_string()))
        }
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Range covering the whole grid
    pub fn full_range(&self) -> CellRange {
        CellRange::new(
            CellAddress::new(0, 0),
            CellAddress::new(self.rows.saturating_sub(1), self.columns.saturating_sub(1)),
        )
    }

    /// Row-major index of an in-bounds address
    pub fn index_of(&self, addr: &CellAddress) -> usize {
        addr.row as usize * self.columns as usize + addr.col as usize
    }
}
