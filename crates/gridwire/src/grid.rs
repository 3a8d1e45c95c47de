//! The grid aggregate
//!
//! [`Grid`] owns the cell store, the dependency graph and the formula
//! evaluator together, so the graph always has exactly one node per stored
//! cell and nothing outside the grid can change one without the other.

use crate::dependency::DependencyGraph;
use crate::store::CellStore;
use gridwire_core::{CellAddress, CellValue, GridOptions, RawContent, Result};
use gridwire_formula::{BuiltinEvaluator, FormulaEvaluator};

/// A reactive grid of cells
///
/// # Example
///
/// ```rust
/// use gridwire::Grid;
/// use gridwire_core::CellValue;
///
/// let mut grid = Grid::new();
/// grid.on_edit("C1", "=A1+B1").unwrap();
/// grid.on_edit("A1", "2").unwrap();
/// grid.on_edit("B1", "3").unwrap();
///
/// assert_eq!(grid.display_value("C1").unwrap(), &CellValue::Number(5.0));
/// ```
#[derive(Debug, Clone)]
pub struct Grid<E: FormulaEvaluator = BuiltinEvaluator> {
    pub(crate) options: GridOptions,
    pub(crate) store: CellStore,
    pub(crate) graph: DependencyGraph,
    pub(crate) evaluator: E,
}

impl Grid {
    /// Create a grid with default options and the built-in evaluator
    pub fn new() -> Self {
        Self::build(GridOptions::default(), BuiltinEvaluator)
    }

    /// Create a grid with the built-in evaluator
    pub fn with_options(options: GridOptions) -> Result<Self> {
        Self::with_evaluator(options, BuiltinEvaluator)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: FormulaEvaluator> Grid<E> {
    /// Create a grid that evaluates formulas with `evaluator`
    pub fn with_evaluator(options: GridOptions, evaluator: E) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options, evaluator))
    }

    fn build(options: GridOptions, evaluator: E) -> Self {
        let store = CellStore::new(&options);
        let mut graph = DependencyGraph::new();
        for addr in options.full_range().cells() {
            graph.ensure_node(addr);
        }

        log::debug!(
            "created {}x{} grid ({:?} propagation)",
            options.rows,
            options.columns,
            options.strategy
        );

        Self {
            options,
            store,
            graph,
            evaluator,
        }
    }

    /// Options the grid was built with
    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Read-only view of the cells
    pub fn store(&self) -> &CellStore {
        &self.store
    }

    /// Read-only view of the dependency graph
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Resolve a cell id to its address
    pub fn locate(&self, id: &str) -> Result<CellAddress> {
        self.store.locate(id)
    }

    // === Cell store ===

    /// Replace a cell's raw content without recomputing anything
    ///
    /// Use [`refresh`](Self::refresh) or [`refresh_all`](Self::refresh_all)
    /// afterwards to bring display values up to date.
    pub fn set_cell(&mut self, id: &str, raw: RawContent) -> Result<()> {
        self.store.set_cell(id, raw)
    }

    /// Last computed value of a cell
    pub fn display_value(&self, id: &str) -> Result<&CellValue> {
        self.store.display_value(id)
    }

    /// Raw content of a cell (formula source for formula cells)
    pub fn raw_content(&self, id: &str) -> Result<&RawContent> {
        self.store.raw_content(id)
    }

    /// Editor text of a cell, `=` restored for formulas
    pub fn raw_text(&self, id: &str) -> Result<String> {
        self.store.raw_text(id)
    }

    // === Dependency graph ===

    /// Cells whose formulas read `id`
    pub fn dependents_of(&self, id: &str) -> Result<Vec<CellAddress>> {
        Ok(self.graph.dependents_of(self.locate(id)?))
    }

    /// Cells read by the formula in `id`
    pub fn precedents_of(&self, id: &str) -> Result<Vec<CellAddress>> {
        Ok(self.graph.precedents_of(self.locate(id)?))
    }

    /// Check whether the formula in `to` reads `from`
    pub fn has_edge(&self, from: &str, to: &str) -> Result<bool> {
        Ok(self.graph.has_edge(self.locate(from)?, self.locate(to)?))
    }

    /// Number of dependency edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of graph nodes (always the number of cells)
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // === Enumeration ===

    /// Every cell address, row-major
    pub fn addresses(&self) -> impl Iterator<Item = CellAddress> {
        self.options.full_range().cells()
    }

    /// Every cell id, row-major
    pub fn cell_ids(&self) -> Vec<String> {
        self.addresses().map(|addr| addr.to_a1_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwire_core::{Error, Propagation};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_grid_registers_every_cell() {
        let grid = Grid::new();
        assert_eq!(grid.node_count(), 120);
        assert_eq!(grid.store().len(), 120);
        assert_eq!(grid.edge_count(), 0);
        assert_eq!(grid.cell_ids()[..7], ["A1", "B1", "C1", "D1", "E1", "F1", "A2"]);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let result = Grid::with_options(GridOptions::with_size(0, 3));
        assert!(matches!(result, Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn test_custom_options() {
        let options = GridOptions {
            strategy: Propagation::Topological,
            ..GridOptions::with_size(2, 2)
        };
        let grid = Grid::with_options(options).unwrap();
        assert_eq!(grid.options().strategy, Propagation::Topological);
        assert_eq!(grid.cell_ids(), vec!["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_graph_queries_reject_unknown_ids() {
        let grid = Grid::new();
        assert_eq!(grid.dependents_of("Z1"), Err(Error::UnknownCell("Z1".into())));
        assert!(grid.has_edge("A1", "A99").is_err());
    }
}
