//! Grid recalculation engine
//!
//! Edits go through [`Grid::on_edit`], which stores the new raw content,
//! re-evaluates the edited cell and then pushes the change to everything
//! downstream. While a formula evaluates, each cell it reads is recorded as a
//! dependency edge, so the graph is rebuilt lazily as formulas run.
//!
//! # Example
//!
//! ```rust
//! use gridwire::Grid;
//! use gridwire_core::CellValue;
//!
//! let mut grid = Grid::new();
//! grid.on_edit("A1", "5").unwrap();
//! grid.on_edit("A2", "=A1*2").unwrap();
//! grid.on_edit("A3", "=A2+10").unwrap();
//!
//! let report = grid.on_edit("A1", "1").unwrap();
//! assert_eq!(report.cells_refreshed, 3);
//! assert_eq!(grid.display_value("A3").unwrap(), &CellValue::Number(12.0));
//! ```

use crate::dependency::DependencyGraph;
use crate::grid::Grid;
use crate::store::CellStore;
use ahash::AHashSet;
use gridwire_core::{
    CellAddress, CellError, CellRange, CellValue, Propagation, RawContent, Result,
};
use gridwire_formula::{CellResolver, FormulaEvaluator, FormulaValue};
use std::fmt;

/// Something worth knowing about a recalculation that is not a cell error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Propagation found a dependency cycle and did not go round it again
    ///
    /// Under every-path propagation `path` runs from the first cell of the
    /// cycle back to itself; under topological propagation it lists the
    /// cycle's cells in ascending order.
    Cycle { path: Vec<CellAddress> },
    /// Propagation stopped before refreshing `at` because it was too deep
    DepthLimit { at: CellAddress },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Cycle { path } => {
                let ids: Vec<String> = path.iter().map(CellAddress::to_a1_string).collect();
                write!(f, "circular reference: {}", ids.join(" -> "))
            }
            Diagnostic::DepthLimit { at } => {
                write!(f, "propagation depth limit reached at {}", at)
            }
        }
    }
}

/// Statistics from a recalculation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecalcReport {
    /// The cell whose change started the run (`None` for a full refresh)
    pub edited: Option<CellAddress>,
    /// Number of cell refreshes performed, the edited cell included
    pub cells_refreshed: usize,
    /// Number of distinct refreshed cells that ended with an error value
    pub errors: usize,
    /// Cycles and depth limits met on the way
    pub diagnostics: Vec<Diagnostic>,
    /// Cells in the order they were refreshed
    pub refreshed: Vec<CellAddress>,
}

impl RecalcReport {
    fn new(edited: Option<CellAddress>) -> Self {
        Self {
            edited,
            ..Default::default()
        }
    }

    /// Check whether propagation met a cycle
    pub fn has_cycles(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::Cycle { .. }))
    }

    /// Check whether propagation was cut short by the depth limit
    pub fn hit_depth_limit(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::DepthLimit { .. }))
    }

    fn record(&mut self, cell: CellAddress) {
        self.cells_refreshed += 1;
        self.refreshed.push(cell);
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        if !self.diagnostics.contains(&diagnostic) {
            log::warn!("{}", diagnostic);
            self.diagnostics.push(diagnostic);
        }
    }

    fn tally_errors(&mut self, store: &CellStore) {
        let distinct: AHashSet<CellAddress> = self.refreshed.iter().copied().collect();
        self.errors = distinct
            .iter()
            .filter(|addr| store.display_at(addr).is_ok_and(CellValue::is_error))
            .count();
    }
}

/// Resolver handed to the evaluator while one cell is being evaluated
///
/// Every in-bounds read is recorded as an edge into `current`.
struct RecordingResolver<'a> {
    current: CellAddress,
    store: &'a CellStore,
    graph: &'a mut DependencyGraph,
}

impl CellResolver for RecordingResolver<'_> {
    fn resolve_cell(&mut self, address: CellAddress) -> FormulaValue {
        match self.store.display_at(&address) {
            Ok(value) => {
                self.graph.add_edge(address, self.current);
                value.clone().into()
            }
            Err(_) => FormulaValue::Error(CellError::Ref),
        }
    }

    /// Reads only the part of `range` inside the grid
    ///
    /// A range reaching past the grid yields its in-bounds block followed by
    /// a single `#REF!` row; cells outside the grid are never materialised.
    fn resolve_range(&mut self, range: CellRange) -> Vec<Vec<FormulaValue>> {
        let bounds = self.store.bounds();
        let last_row = range.end.row.min(bounds.rows.saturating_sub(1));
        let last_col = range.end.col.min(bounds.columns.saturating_sub(1));
        let clipped = last_row != range.end.row || last_col != range.end.col;

        if range.start.row > last_row || range.start.col > last_col {
            return vec![vec![FormulaValue::Error(CellError::Ref)]];
        }

        let mut block: Vec<Vec<FormulaValue>> = (range.start.row..=last_row)
            .map(|row| {
                (range.start.col..=last_col)
                    .map(|col| self.resolve_cell(CellAddress::new(row, col)))
                    .collect()
            })
            .collect();
        if clipped {
            log::debug!("range {} reaches past the grid", range);
            block.push(vec![FormulaValue::Error(CellError::Ref)]);
        }
        block
    }
}

/// One step of every-path propagation: a cell and the dependents left to visit
struct Frame {
    cell: CellAddress,
    dependents: Vec<CellAddress>,
    next: usize,
}

impl<E: FormulaEvaluator> Grid<E> {
    /// Set a cell from editor text and propagate the change
    ///
    /// Text starting with `=` becomes a formula; anything else is a literal.
    /// Fails only for ids outside the grid, before anything is modified.
    pub fn on_edit(&mut self, id: &str, raw_text: &str) -> Result<RecalcReport> {
        let addr = self.store.locate(id)?;
        let raw = RawContent::classify(raw_text);
        log::debug!("edit {} := {:?}", addr, raw);
        self.store.set_raw_at(&addr, raw)?;
        self.propagate_from(addr)
    }

    /// Recompute one cell and everything downstream of it
    pub fn refresh(&mut self, id: &str) -> Result<RecalcReport> {
        let addr = self.store.locate(id)?;
        self.propagate_from(addr)
    }

    /// Recompute every cell
    ///
    /// Useful after loading content with [`Grid::set_cell`]. A first pass
    /// evaluates every cell so each formula records its dependencies; formula
    /// cells are then evaluated again in dependency order.
    pub fn refresh_all(&mut self) -> Result<RecalcReport> {
        let mut report = RecalcReport::new(None);

        let cells: Vec<CellAddress> = self.addresses().collect();
        for addr in cells {
            self.refresh_cell(addr, &mut report)?;
        }

        let plan = self.graph.full_order();
        if plan.has_cycles() {
            report.diagnose(Diagnostic::Cycle {
                path: plan.cycles.clone(),
            });
        }
        for addr in plan.order {
            if self.store.raw_at(&addr)?.is_formula() {
                self.refresh_cell(addr, &mut report)?;
            }
        }

        report.tally_errors(&self.store);
        log::debug!(
            "refreshed all cells: {} refreshes, {} errors",
            report.cells_refreshed,
            report.errors
        );
        Ok(report)
    }

    fn propagate_from(&mut self, start: CellAddress) -> Result<RecalcReport> {
        let mut report = RecalcReport::new(Some(start));

        self.refresh_cell(start, &mut report)?;
        match self.options.strategy {
            Propagation::EveryPath => self.propagate_every_path(start, &mut report)?,
            Propagation::Topological => self.propagate_topological(start, &mut report)?,
        }

        report.tally_errors(&self.store);
        log::debug!(
            "edit of {} refreshed {} cells ({} errors)",
            start,
            report.cells_refreshed,
            report.errors
        );
        Ok(report)
    }

    /// Refresh each dependent once per path that reaches it
    ///
    /// The active path is an explicit stack, so depth costs heap rather than
    /// call stack. A dependent already on the active path closes a cycle and
    /// is not re-entered.
    fn propagate_every_path(&mut self, start: CellAddress, report: &mut RecalcReport) -> Result<()> {
        let mut path = vec![Frame {
            cell: start,
            dependents: self.graph.dependents_of(start),
            next: 0,
        }];
        let mut active = AHashSet::from_iter([start]);

        while let Some(frame) = path.last_mut() {
            let Some(&dependent) = frame.dependents.get(frame.next) else {
                active.remove(&frame.cell);
                path.pop();
                continue;
            };
            frame.next += 1;

            // Self-edges never re-trigger the same cell
            if dependent == frame.cell {
                continue;
            }

            if active.contains(&dependent) {
                let from = path
                    .iter()
                    .position(|f| f.cell == dependent)
                    .unwrap_or_default();
                let mut cycle: Vec<CellAddress> = path[from..].iter().map(|f| f.cell).collect();
                cycle.push(dependent);
                report.diagnose(Diagnostic::Cycle { path: cycle });
                continue;
            }

            if path.len() > self.options.max_depth {
                report.diagnose(Diagnostic::DepthLimit { at: dependent });
                continue;
            }

            self.refresh_cell(dependent, report)?;
            active.insert(dependent);
            path.push(Frame {
                cell: dependent,
                dependents: self.graph.dependents_of(dependent),
                next: 0,
            });
        }

        Ok(())
    }

    /// Refresh the downstream closure once, in dependency order
    fn propagate_topological(&mut self, start: CellAddress, report: &mut RecalcReport) -> Result<()> {
        let plan = self.graph.recalc_order(start);
        if plan.has_cycles() {
            report.diagnose(Diagnostic::Cycle {
                path: plan.cycles.clone(),
            });
        }

        for addr in plan.order.iter().copied() {
            match plan.depth_of(&addr) {
                Some(depth) if depth > self.options.max_depth => {
                    // Only the frontier is reported; deeper cells follow from it
                    if depth == self.options.max_depth + 1 {
                        report.diagnose(Diagnostic::DepthLimit { at: addr });
                    }
                }
                _ => self.refresh_cell(addr, report)?,
            }
        }

        Ok(())
    }

    /// Evaluate one cell and store its display value; no propagation
    fn refresh_cell(&mut self, addr: CellAddress, report: &mut RecalcReport) -> Result<()> {
        let value = self.evaluate_cell(addr)?;
        log::debug!("refresh {} = {}", addr, value);
        self.store.set_display_at(&addr, value)?;
        report.record(addr);
        Ok(())
    }

    /// Compute a cell's display value, rebuilding its incoming edges
    fn evaluate_cell(&mut self, addr: CellAddress) -> Result<CellValue> {
        // Stale edges from the previous version of the formula go first
        self.graph.reset_dependencies_of(addr);

        let value = match self.store.raw_at(&addr)? {
            RawContent::Literal(text) => CellValue::from_literal(text),
            RawContent::Formula(source) => {
                let mut resolver = RecordingResolver {
                    current: addr,
                    store: &self.store,
                    graph: &mut self.graph,
                };
                match self.evaluator.evaluate(source, &mut resolver) {
                    Ok(value) => value,
                    Err(err) => {
                        log::debug!("formula in {} failed: {}", addr, err);
                        CellValue::Error(err.to_cell_error())
                    }
                }
            }
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwire_core::{Error, GridOptions};
    use pretty_assertions::assert_eq;

    fn a(id: &str) -> CellAddress {
        CellAddress::parse(id).unwrap()
    }

    fn grid_with(strategy: Propagation) -> Grid {
        Grid::with_options(GridOptions {
            strategy,
            ..GridOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_simple_calculation() {
        let mut grid = Grid::new();
        grid.on_edit("A1", "10").unwrap();
        grid.on_edit("A2", "20").unwrap();
        let report = grid.on_edit("A3", "=A1+A2").unwrap();

        assert_eq!(report.edited, Some(a("A3")));
        assert_eq!(report.cells_refreshed, 1);
        assert_eq!(report.errors, 0);
        assert_eq!(grid.display_value("A3").unwrap(), &CellValue::Number(30.0));
    }

    #[test]
    fn test_chain_calculation() {
        let mut grid = Grid::new();
        grid.on_edit("A1", "5").unwrap();
        grid.on_edit("A2", "=A1*2").unwrap();
        grid.on_edit("A3", "=A2+10").unwrap();
        grid.on_edit("A4", "=A3*A1").unwrap();

        assert_eq!(grid.display_value("A4").unwrap(), &CellValue::Number(100.0));

        let report = grid.on_edit("A1", "1").unwrap();
        assert_eq!(grid.display_value("A2").unwrap(), &CellValue::Number(2.0));
        assert_eq!(grid.display_value("A3").unwrap(), &CellValue::Number(12.0));
        assert_eq!(grid.display_value("A4").unwrap(), &CellValue::Number(12.0));
        // A4 is reached both directly and through A2 -> A3
        assert_eq!(report.refreshed, vec![a("A1"), a("A2"), a("A3"), a("A4"), a("A4")]);
    }

    #[test]
    fn test_topological_refreshes_each_cell_once() {
        let mut grid = grid_with(Propagation::Topological);
        grid.on_edit("A1", "5").unwrap();
        grid.on_edit("A2", "=A1*2").unwrap();
        grid.on_edit("A3", "=A2+10").unwrap();
        grid.on_edit("A4", "=A3*A1").unwrap();

        let report = grid.on_edit("A1", "1").unwrap();
        assert_eq!(report.refreshed, vec![a("A1"), a("A2"), a("A3"), a("A4")]);
        assert_eq!(grid.display_value("A4").unwrap(), &CellValue::Number(12.0));
    }

    #[test]
    fn test_self_reference_does_not_recurse() {
        let mut grid = Grid::new();
        let report = grid.on_edit("A1", "=A1").unwrap();

        assert_eq!(report.refreshed, vec![a("A1")]);
        assert!(!report.has_cycles());
        assert!(grid.has_edge("A1", "A1").unwrap());
        assert_eq!(grid.display_value("A1").unwrap(), &CellValue::Empty);
    }

    #[test]
    fn test_two_cell_cycle_terminates() {
        let mut grid = Grid::new();
        grid.on_edit("A1", "=B1+1").unwrap();
        let report = grid.on_edit("B1", "=A1+1").unwrap();

        assert!(report.has_cycles());
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::Cycle {
                path: vec![a("B1"), a("A1"), a("B1")]
            }]
        );
        assert_eq!(report.refreshed, vec![a("B1"), a("A1")]);
    }

    #[test]
    fn test_depth_limit() {
        let mut grid = Grid::with_options(GridOptions {
            max_depth: 2,
            ..GridOptions::default()
        })
        .unwrap();
        grid.on_edit("A2", "=A1").unwrap();
        grid.on_edit("A3", "=A2").unwrap();
        grid.on_edit("A4", "=A3").unwrap();

        let report = grid.on_edit("A1", "7").unwrap();

        assert!(report.hit_depth_limit());
        assert_eq!(report.diagnostics, vec![Diagnostic::DepthLimit { at: a("A4") }]);
        assert_eq!(grid.display_value("A3").unwrap(), &CellValue::Number(7.0));
        assert_eq!(grid.display_value("A4").unwrap(), &CellValue::Empty);
    }

    #[test]
    fn test_depth_limit_topological() {
        let mut grid = Grid::with_options(GridOptions {
            max_depth: 1,
            strategy: Propagation::Topological,
            ..GridOptions::default()
        })
        .unwrap();
        grid.on_edit("A2", "=A1").unwrap();
        grid.on_edit("A3", "=A2").unwrap();
        grid.on_edit("A4", "=A3").unwrap();

        let report = grid.on_edit("A1", "7").unwrap();

        assert_eq!(report.diagnostics, vec![Diagnostic::DepthLimit { at: a("A3") }]);
        assert_eq!(report.refreshed, vec![a("A1"), a("A2")]);
    }

    #[test]
    fn test_errors_are_values() {
        let mut grid = Grid::new();
        grid.on_edit("A1", "=1/0").unwrap();
        let report = grid.on_edit("B1", "=A1+1").unwrap();

        assert_eq!(report.errors, 1);
        assert_eq!(
            grid.display_value("B1").unwrap(),
            &CellValue::Error(CellError::Div0)
        );

        grid.on_edit("C1", "=1+").unwrap();
        assert_eq!(
            grid.display_value("C1").unwrap(),
            &CellValue::Error(CellError::Error)
        );
        grid.on_edit("D1", "=NOPE(1)").unwrap();
        assert_eq!(
            grid.display_value("D1").unwrap(),
            &CellValue::Error(CellError::Name)
        );
    }

    #[test]
    fn test_out_of_bounds_reference_is_ref_error() {
        let mut grid = Grid::new();
        grid.on_edit("A1", "=Z99").unwrap();

        assert_eq!(
            grid.display_value("A1").unwrap(),
            &CellValue::Error(CellError::Ref)
        );
        assert_eq!(grid.edge_count(), 0);
    }

    #[test]
    fn test_oversized_range_reads_only_in_bounds_cells() {
        let mut grid = Grid::new();
        grid.on_edit("B1", "2").unwrap();
        grid.on_edit("C2", "3").unwrap();

        grid.on_edit("A1", "=COUNT(B1:F30000000)").unwrap();
        assert_eq!(grid.display_value("A1").unwrap(), &CellValue::Number(2.0));
        // B..F over 20 rows
        assert_eq!(grid.precedents_of("A1").unwrap().len(), 100);

        grid.on_edit("A2", "=SUM(B1:F30000000)").unwrap();
        assert_eq!(
            grid.display_value("A2").unwrap(),
            &CellValue::Error(CellError::Ref)
        );

        grid.on_edit("A3", "=COUNT(A50:B60)").unwrap();
        assert_eq!(grid.display_value("A3").unwrap(), &CellValue::Number(0.0));
        assert!(grid.precedents_of("A3").unwrap().is_empty());

        // Editing an in-bounds cell of the range still reaches the formula
        grid.on_edit("F20", "9").unwrap();
        assert_eq!(grid.display_value("A1").unwrap(), &CellValue::Number(3.0));
    }

    #[test]
    fn test_unknown_cell_leaves_grid_untouched() {
        let mut grid = Grid::new();
        grid.on_edit("B1", "=A1").unwrap();

        assert_eq!(
            grid.on_edit("G1", "=A1"),
            Err(Error::UnknownCell("G1".into()))
        );
        assert!(matches!(grid.refresh("??"), Err(Error::InvalidAddress(_))));
        assert_eq!(grid.edge_count(), 1);
    }

    #[test]
    fn test_refresh_all_after_bulk_load() {
        let mut grid = Grid::new();
        grid.set_cell("A1", RawContent::classify("=B1*2")).unwrap();
        grid.set_cell("B1", RawContent::classify("=C1+1")).unwrap();
        grid.set_cell("C1", RawContent::classify("4")).unwrap();

        assert_eq!(grid.display_value("A1").unwrap(), &CellValue::Empty);

        let report = grid.refresh_all().unwrap();

        assert_eq!(report.edited, None);
        assert!(!report.has_cycles());
        assert_eq!(grid.display_value("B1").unwrap(), &CellValue::Number(5.0));
        assert_eq!(grid.display_value("A1").unwrap(), &CellValue::Number(10.0));
        assert!(grid.has_edge("B1", "A1").unwrap());
    }

    #[test]
    fn test_refresh_all_reports_cycles() {
        let mut grid = Grid::new();
        grid.set_cell("A1", RawContent::classify("=B1")).unwrap();
        grid.set_cell("B1", RawContent::classify("=A1")).unwrap();

        let report = grid.refresh_all().unwrap();
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::Cycle {
                path: vec![a("A1"), a("B1")]
            }]
        );
    }

    #[test]
    fn test_diagnostic_display() {
        let cycle = Diagnostic::Cycle {
            path: vec![a("A1"), a("B1"), a("A1")],
        };
        assert_eq!(cycle.to_string(), "circular reference: A1 -> B1 -> A1");
        assert_eq!(
            Diagnostic::DepthLimit { at: a("C3") }.to_string(),
            "propagation depth limit reached at C3"
        );
    }
}
