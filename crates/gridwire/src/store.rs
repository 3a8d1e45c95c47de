//! Cell storage
//!
//! Dense row-major storage with one [`Cell`] per in-bounds address. Every
//! cell exists from construction on, so a lookup either finds a cell or the
//! id is outside the grid.

use gridwire_core::{CellAddress, CellValue, Error, GridOptions, RawContent, Result};

/// Complete data for a single cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// What the user typed (formula marker stripped for formulas)
    pub raw: RawContent,
    /// Last computed value
    pub display: CellValue,
}

/// Storage for every cell of a grid
#[derive(Debug, Clone)]
pub struct CellStore {
    bounds: GridOptions,
    cells: Vec<Cell>,
}

impl CellStore {
    /// Create a store holding a blank cell for every address in `bounds`
    pub fn new(bounds: &GridOptions) -> Self {
        Self {
            bounds: bounds.clone(),
            cells: vec![Cell::default(); bounds.cell_count()],
        }
    }

    /// Grid bounds the store was built for
    pub fn bounds(&self) -> &GridOptions {
        &self.bounds
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the store has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check whether an address has a cell
    pub fn contains(&self, addr: &CellAddress) -> bool {
        self.bounds.contains(addr)
    }

    /// Resolve a cell id to the address of a stored cell
    pub fn locate(&self, id: &str) -> Result<CellAddress> {
        self.bounds.locate(id)
    }

    /// Get a cell by address
    pub fn cell(&self, addr: &CellAddress) -> Option<&Cell> {
        if self.contains(addr) {
            self.cells.get(self.bounds.index_of(addr))
        } else {
            None
        }
    }

    fn cell_mut(&mut self, addr: &CellAddress) -> Result<&mut Cell> {
        if !self.contains(addr) {
            return Err(Error::UnknownCell(addr.to_a1_string()));
        }
        let index = self.bounds.index_of(addr);
        self.cells
            .get_mut(index)
            .ok_or_else(|| Error::UnknownCell(addr.to_a1_string()))
    }

    /// Replace a cell's raw content without recomputing anything
    pub fn set_cell(&mut self, id: &str, raw: RawContent) -> Result<()> {
        let addr = self.locate(id)?;
        self.set_raw_at(&addr, raw)
    }

    /// Replace the raw content at an address
    pub fn set_raw_at(&mut self, addr: &CellAddress, raw: RawContent) -> Result<()> {
        self.cell_mut(addr)?.raw = raw;
        Ok(())
    }

    /// Store a computed value
    pub fn set_display_at(&mut self, addr: &CellAddress, value: CellValue) -> Result<()> {
        self.cell_mut(addr)?.display = value;
        Ok(())
    }

    /// Last computed value of a cell; `Empty` if never computed
    pub fn display_value(&self, id: &str) -> Result<&CellValue> {
        let addr = self.locate(id)?;
        self.display_at(&addr)
    }

    /// Last computed value at an address
    pub fn display_at(&self, addr: &CellAddress) -> Result<&CellValue> {
        self.cell(addr)
            .map(|cell| &cell.display)
            .ok_or_else(|| Error::UnknownCell(addr.to_a1_string()))
    }

    /// Raw content of a cell: the formula source for formula cells
    pub fn raw_content(&self, id: &str) -> Result<&RawContent> {
        let addr = self.locate(id)?;
        self.raw_at(&addr)
    }

    /// Raw content at an address
    pub fn raw_at(&self, addr: &CellAddress) -> Result<&RawContent> {
        self.cell(addr)
            .map(|cell| &cell.raw)
            .ok_or_else(|| Error::UnknownCell(addr.to_a1_string()))
    }

    /// Editor text exactly as typed, `=` restored for formulas
    pub fn raw_text(&self, id: &str) -> Result<String> {
        self.raw_content(id).map(RawContent::editor_text)
    }

    /// Iterate over every cell in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &Cell)> + '_ {
        self.bounds.full_range().cells().zip(self.cells.iter())
    }
}
