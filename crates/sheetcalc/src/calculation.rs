//! Cell calculation
//!
//! Evaluates a formula for one cell and stores the result together with the
//! formula text. Each request gets its own [`CalcContext`]: formula cells it
//! references are computed at most once, and circular references stop after
//! the configured number of passes.
//!
//! # Example
//!
//! ```rust
//! use sheetcalc::prelude::*;
//!
//! let workbook = Workbook::new();
//! workbook.set_cell_value("Sheet1", "A1", 2.0).unwrap();
//! workbook.set_calced_cell_formula("Sheet1", "B1", "=A1+3").unwrap();
//!
//! assert_eq!(workbook.get_cell_display("Sheet1", "B1").unwrap(), "5");
//! ```

use crate::error::{CalcError, CalcResult};
use sheetcalc_core::{CellAddress, CellData, CellFormula, CellValue, Workbook};
use sheetcalc_formula::{
    evaluate_formula, CalcContext, CellKey, EvaluationContext, FormulaResult, FormulaValue,
};

/// Options for a single calculation request
#[derive(Debug, Clone, Default)]
pub struct CalculationOptions {
    /// Maximum passes per referenced formula cell; `None` uses
    /// [`WorkbookSettings::max_calc_iterations`](sheetcalc_core::WorkbookSettings)
    pub max_iterations: Option<u32>,
}

impl CalculationOptions {
    pub fn with_max_iterations(max_iterations: u32) -> Self {
        Self {
            max_iterations: Some(max_iterations),
        }
    }
}

/// Extension trait for Workbook to add calculation methods
pub trait WorkbookCalculationExt {
    /// Evaluate `formula` for `sheet!cell` and store the value and the formula
    ///
    /// Both are written even when evaluation fails. A spreadsheet error
    /// result is reported as [`CalcError::Evaluation`]; a formula that cannot
    /// be evaluated at all is stored with a fallback error value and its
    /// failure returned.
    fn set_calced_cell_formula(&self, sheet: &str, cell: &str, formula: &str) -> CalcResult<()>;

    /// [`set_calced_cell_formula`](Self::set_calced_cell_formula) with explicit options
    fn set_calced_cell_formula_with_options(
        &self,
        sheet: &str,
        cell: &str,
        formula: &str,
        options: &CalculationOptions,
    ) -> CalcResult<()>;

    /// Evaluate `formula` as if entered in `sheet!cell`, without storing anything
    fn calc_cell_formula(
        &self,
        sheet: &str,
        cell: &str,
        formula: &str,
        options: &CalculationOptions,
    ) -> CalcResult<FormulaValue>;

    /// Write `values` into 1-based `row`, starting at column A
    ///
    /// Values starting with `=` are calculated and stored as formulas, the
    /// rest are stored as text. Stops at the first failing cell.
    fn set_row_cells<S: AsRef<str>>(&self, sheet: &str, row: u32, values: &[S]) -> CalcResult<()>;
}

impl WorkbookCalculationExt for Workbook {
    fn set_calced_cell_formula(&self, sheet: &str, cell: &str, formula: &str) -> CalcResult<()> {
        self.set_calced_cell_formula_with_options(sheet, cell, formula, &CalculationOptions::default())
    }

    fn set_calced_cell_formula_with_options(
        &self,
        sheet: &str,
        cell: &str,
        formula: &str,
        options: &CalculationOptions,
    ) -> CalcResult<()> {
        let (sheet_idx, worksheet) = self.require_sheet(sheet)?;
        let addr = CellAddress::parse(cell)?;

        let result = evaluate_at(self, sheet_idx, addr, formula, options);

        let (value, outcome) = match result {
            Ok(value) => {
                let value = CellValue::from(value);
                let outcome = match &value {
                    CellValue::Error(error) => Err(CalcError::Evaluation {
                        cell: format!("{}!{}", sheet, addr.to_relative()),
                        error: *error,
                    }),
                    _ => Ok(()),
                };
                (value, outcome)
            }
            Err(e) => {
                tracing::debug!("formula in {sheet}!{cell} failed: {e}");
                (CellValue::Error(e.fallback_error()), Err(e.into()))
            }
        };

        let formula = (!formula.is_empty()).then(|| CellFormula::normal(formula));
        worksheet.lock().set(addr.row, addr.col, CellData { value, formula });

        outcome
    }

    fn calc_cell_formula(
        &self,
        sheet: &str,
        cell: &str,
        formula: &str,
        options: &CalculationOptions,
    ) -> CalcResult<FormulaValue> {
        let (sheet_idx, _) = self.require_sheet(sheet)?;
        let addr = CellAddress::parse(cell)?;
        Ok(evaluate_at(self, sheet_idx, addr, formula, options)?)
    }

    fn set_row_cells<S: AsRef<str>>(&self, sheet: &str, row: u32, values: &[S]) -> CalcResult<()> {
        for (i, value) in values.iter().enumerate() {
            let col = u32::try_from(i + 1).unwrap_or(u32::MAX);
            let cell = CellAddress::from_coordinates(col, row)?.to_a1_string();
            let value = value.as_ref();

            if value.starts_with('=') {
                self.set_calced_cell_formula(sheet, &cell, value)?;
            } else {
                self.set_cell_value(sheet, &cell, value)?;
            }
        }
        Ok(())
    }
}

/// Evaluate `formula` under a fresh request whose entry is the target cell
fn evaluate_at(
    workbook: &Workbook,
    sheet_idx: usize,
    addr: CellAddress,
    formula: &str,
    options: &CalculationOptions,
) -> FormulaResult<FormulaValue> {
    let max_iterations = options
        .max_iterations
        .unwrap_or(workbook.settings().max_calc_iterations);

    let calc = CalcContext::new(CellKey::new(sheet_idx, addr.row, addr.col), max_iterations);
    let ctx = EvaluationContext::new(Some(workbook), sheet_idx, addr.row, addr.col).with_calc(&calc);

    tracing::trace!("calculating {formula} at sheet {sheet_idx} {addr}");
    evaluate_formula(formula, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetcalc_core::CellError;
    use sheetcalc_formula::FormulaError;

    #[test]
    fn test_store_value_and_formula() {
        let workbook = Workbook::new();
        workbook.set_cell_value("Sheet1", "A1", 10.0).unwrap();
        workbook.set_cell_value("Sheet1", "A2", 20.0).unwrap();

        workbook
            .set_calced_cell_formula("Sheet1", "A3", "=A1+A2")
            .unwrap();

        let ws = workbook.worksheet(0).unwrap();
        assert_eq!(ws.get_value("A3").unwrap(), CellValue::Number(30.0));
        assert_eq!(
            ws.formula("A3").unwrap(),
            Some(CellFormula::normal("=A1+A2"))
        );
    }

    #[test]
    fn test_error_value_stored_then_reported() {
        let workbook = Workbook::new();
        let err = workbook
            .set_calced_cell_formula("Sheet1", "B2", "=1/0")
            .unwrap_err();

        assert_eq!(err.cell_error(), Some(CellError::Div0));
        assert!(matches!(err, CalcError::Evaluation { ref cell, .. } if cell == "Sheet1!B2"));
        assert_eq!(
            workbook.get_cell_display("Sheet1", "B2").unwrap(),
            "#DIV/0!"
        );
        assert_eq!(
            workbook.worksheet(0).unwrap().formula("B2").unwrap(),
            Some(CellFormula::normal("=1/0"))
        );
    }

    #[test]
    fn test_unparseable_formula_stores_fallback() {
        let workbook = Workbook::new();
        let err = workbook
            .set_calced_cell_formula("Sheet1", "C1", "=(1+")
            .unwrap_err();

        assert!(matches!(err, CalcError::Formula(FormulaError::Parse(_))));
        assert_eq!(workbook.get_cell_display("Sheet1", "C1").unwrap(), "#NAME?");
        assert_eq!(
            workbook.worksheet(0).unwrap().formula("C1").unwrap(),
            Some(CellFormula::normal("=(1+"))
        );
    }

    #[test]
    fn test_unknown_sheet_or_cell_stores_nothing() {
        let workbook = Workbook::new();
        assert!(matches!(
            workbook.set_calced_cell_formula("Nope", "A1", "=1"),
            Err(CalcError::Core(sheetcalc_core::Error::SheetNotFound(_)))
        ));
        assert!(matches!(
            workbook.set_calced_cell_formula("Sheet1", "A0", "=1"),
            Err(CalcError::Core(_))
        ));
        assert!(workbook.worksheet(0).unwrap().is_empty());
    }

    #[test]
    fn test_calc_cell_formula_does_not_store() {
        let workbook = Workbook::new();
        workbook.set_cell_value("Sheet1", "A1", "ab").unwrap();

        let value = workbook
            .calc_cell_formula("Sheet1", "B1", "=A1&\"c\"", &CalculationOptions::default())
            .unwrap();
        assert_eq!(value, FormulaValue::from("abc"));
        assert_eq!(workbook.worksheet(0).unwrap().cell_count(), 1);
    }

    #[test]
    fn test_options_override_workbook_setting() {
        let mut workbook = Workbook::new();
        workbook.settings_mut().max_calc_iterations = 0;
        let ws = workbook.worksheet(0).unwrap();
        ws.set_cell_formula("A1", "=5").unwrap();

        // With no passes allowed the referenced formula cell never runs
        let starved = workbook
            .calc_cell_formula("Sheet1", "B1", "=A1", &CalculationOptions::default())
            .unwrap();
        assert_eq!(starved, FormulaValue::Error(CellError::Num));

        let value = workbook
            .calc_cell_formula("Sheet1", "B1", "=A1", &CalculationOptions::with_max_iterations(1))
            .unwrap();
        assert_eq!(value, FormulaValue::Number(5.0));
    }

    #[test]
    fn test_set_row_cells() {
        let workbook = Workbook::new();
        workbook
            .set_row_cells("Sheet1", 3, &["hello", "=2*21", "", "x"])
            .unwrap();

        assert_eq!(workbook.get_cell_display("Sheet1", "A3").unwrap(), "hello");
        assert_eq!(workbook.get_cell_display("Sheet1", "B3").unwrap(), "42");
        assert_eq!(workbook.get_cell_display("Sheet1", "C3").unwrap(), "");
        assert_eq!(workbook.get_cell_display("Sheet1", "D3").unwrap(), "x");
        assert!(matches!(
            workbook.get_cell_value("Sheet1", "A3").unwrap(),
            CellValue::String(_)
        ));
        assert!(workbook.set_row_cells("Sheet1", 0, &["a"]).is_err());
    }
}
