//! Bulk value writers
//!
//! Fill a rectangular block starting at a given cell while holding the sheet
//! lock once. These writers skip formula cleanup: a formula already on a
//! target cell stays attached to the new value, so they must only be used on
//! ranges known to hold no formulas.

use sheetcalc_core::{CellAddress, CellValue, Workbook};

use crate::error::CalcResult;

/// Extension trait for Workbook to write blocks of plain values
pub trait WorkbookBulkExt {
    /// Write rows of strings starting at `cell`, interning each one
    ///
    /// Formulas on the target cells are not removed.
    fn set_sheet_bulk_str_unsafe<R, S>(&self, sheet: &str, cell: &str, block: &[R]) -> CalcResult<()>
    where
        R: AsRef<[S]>,
        S: AsRef<str>;

    /// Write rows of numbers starting at `cell`
    ///
    /// Numbers are rounded to two decimals and stored as numbers, not as
    /// fixed-point text: `1.5` is stored as `Number(1.5)` and displays as
    /// `"1.5"`, not `"1.50"`. `None` clears the value. Formulas on the target
    /// cells are not removed.
    fn set_sheet_bulk_float_unsafe<R>(&self, sheet: &str, cell: &str, block: &[R]) -> CalcResult<()>
    where
        R: AsRef<[Option<f64>]>;
}

impl WorkbookBulkExt for Workbook {
    fn set_sheet_bulk_str_unsafe<R, S>(&self, sheet: &str, cell: &str, block: &[R]) -> CalcResult<()>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        fill_block(self, sheet, cell, block, |value: &S| {
            CellValue::StringIndex(self.intern_string(value.as_ref()))
        })
    }

    fn set_sheet_bulk_float_unsafe<R>(&self, sheet: &str, cell: &str, block: &[R]) -> CalcResult<()>
    where
        R: AsRef<[Option<f64>]>,
    {
        fill_block(self, sheet, cell, block, |value: &Option<f64>| match *value {
            Some(n) => CellValue::Number(round_to_cents(n)),
            None => CellValue::Empty,
        })
    }
}

fn fill_block<R, T, F>(workbook: &Workbook, sheet: &str, cell: &str, block: &[R], mut to_value: F) -> CalcResult<()>
where
    R: AsRef<[T]>,
    F: FnMut(&T) -> CellValue,
{
    let start = CellAddress::parse(cell)?;
    let (_, worksheet) = workbook.require_sheet(sheet)?;
    let mut cells = worksheet.lock();

    for (i, row) in block.iter().enumerate() {
        for (j, value) in row.as_ref().iter().enumerate() {
            let addr = CellAddress::from_coordinates(
                coordinate(start.col as u32, j),
                coordinate(start.row, i),
            )?;
            cells.set_value(addr.row, addr.col, to_value(value));
        }
    }

    tracing::debug!("bulk write of {} rows into {sheet}!{cell}", block.len());
    Ok(())
}

/// 1-based coordinate of the cell `offset` steps past 0-based `start`
///
/// Saturates so that oversized blocks fail grid validation.
fn coordinate(start: u32, offset: usize) -> u32 {
    u32::try_from(offset)
        .ok()
        .and_then(|offset| start.checked_add(offset))
        .and_then(|n| n.checked_add(1))
        .unwrap_or(u32::MAX)
}

fn round_to_cents(n: f64) -> f64 {
    format!("{n:.2}").parse().unwrap_or(n)
}
