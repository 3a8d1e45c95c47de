//! The contract between a grid and whatever evaluates its formulas
//!
//! A grid never parses formulas itself. It hands the formula source (without
//! the leading `=`) to a [`FormulaEvaluator`] together with a [`CellResolver`]
//! that answers reads of other cells. Every read the evaluator performs goes
//! through the resolver, which is how the grid learns what a formula depends
//! on.

use crate::error::FormulaResult;
use crate::evaluator::{evaluate, FormulaValue};
use crate::parser::parse_formula;
use gridwire_core::{CellAddress, CellRange, CellValue};

/// Answers cell and range reads on behalf of one evaluating cell
pub trait CellResolver {
    /// Current display value of `address`
    fn resolve_cell(&mut self, address: CellAddress) -> FormulaValue;

    /// Values of every cell in `range`, row-major and inclusive
    ///
    /// The default reads each cell through [`resolve_cell`](Self::resolve_cell).
    fn resolve_range(&mut self, range: CellRange) -> Vec<Vec<FormulaValue>> {
        (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| self.resolve_cell(CellAddress::new(row, col)))
                    .collect()
            })
            .collect()
    }
}

/// Turns formula source into a display value
pub trait FormulaEvaluator {
    /// Evaluate `source` (formula text without the leading `=`)
    fn evaluate(&self, source: &str, resolver: &mut dyn CellResolver) -> FormulaResult<CellValue>;
}

/// The bundled evaluator: Excel-style syntax and a small function library
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEvaluator;

impl BuiltinEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl FormulaEvaluator for BuiltinEvaluator {
    fn evaluate(&self, source: &str, resolver: &mut dyn CellResolver) -> FormulaResult<CellValue> {
        let ast = parse_formula(source)?;
        let value = evaluate(&ast, resolver)?;
        log::trace!("evaluated '{}' to {:?}", source, value);
        Ok(value.into())
    }
}

impl<F> FormulaEvaluator for F
where
    F: Fn(&str, &mut dyn CellResolver) -> FormulaResult<CellValue>,
{
    fn evaluate(&self, source: &str, resolver: &mut dyn CellResolver) -> FormulaResult<CellValue> {
        self(source, resolver)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FormulaError;
    use gridwire_core::CellError;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Resolver over a fixed map that remembers every address it was asked for
    #[derive(Default)]
    pub(crate) struct MapResolver {
        pub cells: HashMap<CellAddress, CellValue>,
        pub reads: Vec<CellAddress>,
    }

    impl MapResolver {
        pub fn with(mut self, id: &str, value: CellValue) -> Self {
            self.cells.insert(CellAddress::parse(id).unwrap(), value);
            self
        }
    }

    impl CellResolver for MapResolver {
        fn resolve_cell(&mut self, address: CellAddress) -> FormulaValue {
            self.reads.push(address);
            self.cells.get(&address).cloned().unwrap_or_default().into()
        }
    }

    #[test]
    fn test_builtin_evaluates_to_cell_value() {
        let mut resolver = MapResolver::default()
            .with("A1", CellValue::Number(2.0))
            .with("B1", CellValue::Number(3.0));

        let value = BuiltinEvaluator.evaluate("A1+B1", &mut resolver).unwrap();
        assert_eq!(value, CellValue::Number(5.0));
    }

    #[test]
    fn test_builtin_reports_parse_errors() {
        let err = BuiltinEvaluator
            .evaluate("1+", &mut MapResolver::default())
            .unwrap_err();
        assert!(matches!(err, FormulaError::Parse(_)));
        assert_eq!(err.to_cell_error(), CellError::Error);
    }

    #[test]
    fn test_default_range_resolution_is_row_major() {
        let mut resolver = MapResolver::default();
        let range = CellRange::parse("A1:B2").unwrap();
        let block = resolver.resolve_range(range);

        assert_eq!(block.len(), 2);
        assert_eq!(block[0].len(), 2);
        assert_eq!(
            resolver.reads,
            range.cells().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_closure_evaluator() {
        let constant = |_: &str, _: &mut dyn CellResolver| -> FormulaResult<CellValue> {
            Ok(CellValue::Number(7.0))
        };
        assert_eq!(
            constant.evaluate("anything", &mut MapResolver::default()),
            Ok(CellValue::Number(7.0))
        );
    }
}
