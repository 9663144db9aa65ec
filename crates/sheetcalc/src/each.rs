//! Cell enumeration
//!
//! Walks every populated cell of a sheet in row-major order under the sheet
//! lock, reporting each cell's formula and, optionally, its stored value.
//! Callbacks return `true` to stop early. They run while the sheet is
//! locked, so they must not access the same sheet.

use std::borrow::Cow;

use ahash::AHashMap;
use sheetcalc_core::{CellAddress, CellData, CellFormula, CellStorage, Workbook};
use sheetcalc_formula::resolve_shared_formula;

use crate::error::CalcResult;

/// Extension trait for Workbook to enumerate cells
pub trait WorkbookEnumerationExt {
    /// Call `f(cell, formula)` for every populated cell of `sheet`
    ///
    /// Cells without a formula report `""`. Shared-formula followers report
    /// the group template shifted to their position.
    fn each_cell_formula<F>(&self, sheet: &str, f: F) -> CalcResult<()>
    where
        F: FnMut(&str, &str) -> bool;

    /// Call `f(cell, formula, value)` for every populated cell of `sheet`
    ///
    /// `value` is the stored value as display text, with shared strings
    /// resolved.
    fn each_cell_formula_value<F>(&self, sheet: &str, f: F) -> CalcResult<()>
    where
        F: FnMut(&str, &str, &str) -> bool;
}

impl WorkbookEnumerationExt for Workbook {
    fn each_cell_formula<F>(&self, sheet: &str, mut f: F) -> CalcResult<()>
    where
        F: FnMut(&str, &str) -> bool,
    {
        let mut shared = SharedFormulaCache::default();
        scan_cells(self, sheet, |row, col, data| {
            let formula = shared.formula_text(row, col, data)?;
            Ok(f(&cell_name(row, col), &formula))
        })
    }

    fn each_cell_formula_value<F>(&self, sheet: &str, mut f: F) -> CalcResult<()>
    where
        F: FnMut(&str, &str, &str) -> bool,
    {
        let mut shared = SharedFormulaCache::default();
        scan_cells(self, sheet, |row, col, data| {
            let value = self.display_value(&data.value)?;
            let formula = shared.formula_text(row, col, data)?;
            Ok(f(&cell_name(row, col), &formula, &value))
        })
    }
}

/// Visit cells by 0-based position under the sheet lock until `visit` asks
/// to stop or fails
pub(crate) fn scan_cells<F>(workbook: &Workbook, sheet: &str, visit: F) -> CalcResult<()>
where
    F: FnMut(u32, u16, &CellData) -> CalcResult<bool>,
{
    let (_, worksheet) = workbook.require_sheet(sheet)?;
    let cells = worksheet.lock();
    visit_cells(&cells, visit)
}

/// Visit cells of an already locked sheet in row-major order
pub(crate) fn visit_cells<F>(cells: &CellStorage, mut visit: F) -> CalcResult<()>
where
    F: FnMut(u32, u16, &CellData) -> CalcResult<bool>,
{
    for (row, col, data) in cells.iter() {
        if visit(row, col, data)? {
            break;
        }
    }
    Ok(())
}

fn cell_name(row: u32, col: u16) -> String {
    CellAddress::new(row, col).to_a1_string()
}

/// Template and position of the first cell seen for a shared-formula index
struct SharedFormulaEntry {
    template: String,
    row: u32,
    col: u16,
}

/// Shared-formula templates seen so far in one enumeration pass
#[derive(Default)]
pub(crate) struct SharedFormulaCache {
    entries: AHashMap<u32, SharedFormulaEntry>,
}

impl SharedFormulaCache {
    /// Formula text to report for a cell
    ///
    /// The first cell seen for a shared index reports its stored text as is
    /// and becomes the base that later cells of the group are shifted from.
    pub(crate) fn formula_text<'a>(
        &mut self,
        row: u32,
        col: u16,
        data: &'a CellData,
    ) -> CalcResult<Cow<'a, str>> {
        let (index, text) = match &data.formula {
            None => return Ok(Cow::Borrowed("")),
            Some(CellFormula::Normal(text)) => return Ok(Cow::Borrowed(text)),
            Some(CellFormula::Shared { index, text }) => (*index, text),
        };

        match self.entries.get(&index) {
            Some(entry) => {
                let d_col = col as i64 - entry.col as i64;
                let d_row = row as i64 - entry.row as i64;
                Ok(Cow::Owned(resolve_shared_formula(d_col, d_row, &entry.template)?))
            }
            None => {
                self.entries.insert(
                    index,
                    SharedFormulaEntry {
                        template: text.clone(),
                        row,
                        col,
                    },
                );
                Ok(Cow::Borrowed(text))
            }
        }
    }
}
