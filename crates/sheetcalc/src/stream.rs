//! Streaming row iteration
//!
//! A producer thread enumerates a sheet and hands over one row of
//! formula/value pairs at a time through a rendezvous channel, so the
//! consumer never holds more than a single row.
//!
//! The producer holds the sheet lock until it finishes or the iterator is
//! closed. While a [`RowIterator`] is open, other access to the same sheet
//! waits, so a consumer must not write to that sheet before closing it.
//! A producer still waiting for the lock checks for a close between short
//! timed attempts, so closing never waits on another holder of the sheet.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sheetcalc::prelude::*;
//!
//! let workbook = Arc::new(Workbook::new());
//! workbook.set_row_cells("Sheet1", 1, &["a", "=1+1"]).unwrap();
//! workbook.set_row_cells("Sheet1", 2, &["b"]).unwrap();
//!
//! let mut rows = workbook.iterate_row_formula_values("Sheet1");
//! let first = rows.next_row().unwrap().unwrap();
//! assert_eq!(first[1].formula, "=1+1");
//! assert_eq!(first[1].value, "2");
//! assert_eq!(rows.next_row().unwrap().unwrap().len(), 1);
//! assert!(rows.next_row().unwrap().is_none());
//! ```

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sheetcalc_core::Workbook;

use crate::each::{visit_cells, SharedFormulaCache};
use crate::error::{CalcError, CalcResult};

/// How long the producer waits for the sheet lock between close checks
const LOCK_POLL: Duration = Duration::from_millis(10);

/// Formula and display value of one cell
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IteratorCellValue {
    pub formula: String,
    pub value: String,
}

/// Cells of one row, left to right
pub type Row = Vec<IteratorCellValue>;

/// Extension trait for shared workbooks to stream rows
pub trait WorkbookStreamExt {
    /// Start streaming the populated rows of `sheet`
    ///
    /// Problems opening the sheet are reported by the first
    /// [`RowIterator::next_row`].
    fn iterate_row_formula_values(&self, sheet: &str) -> RowIterator;
}

impl WorkbookStreamExt for Arc<Workbook> {
    fn iterate_row_formula_values(&self, sheet: &str) -> RowIterator {
        RowIterator::spawn(Arc::clone(self), sheet.to_string())
    }
}

/// Consumer side of a row stream
///
/// Rows arrive in ascending order, each exactly once. Empty rows are not
/// reported. Dropping the iterator closes it.
pub struct RowIterator {
    receiver: Option<Receiver<Row>>,
    cancel: Arc<AtomicBool>,
    producer: Option<JoinHandle<CalcResult<()>>>,
    failure: Option<CalcError>,
}

impl RowIterator {
    fn spawn(workbook: Arc<Workbook>, sheet: String) -> Self {
        let (sender, receiver) = mpsc::sync_channel(0);
        let cancel = Arc::new(AtomicBool::new(false));

        tracing::debug!("opening row iterator on {sheet}");
        let producer_cancel = Arc::clone(&cancel);
        let spawned = thread::Builder::new()
            .name("sheetcalc-rows".into())
            .spawn(move || produce_rows(&workbook, &sheet, sender, &producer_cancel));

        match spawned {
            Ok(handle) => Self {
                receiver: Some(receiver),
                cancel,
                producer: Some(handle),
                failure: None,
            },
            Err(e) => Self {
                receiver: None,
                cancel,
                producer: None,
                failure: Some(CalcError::Spawn(e)),
            },
        }
    }

    /// Next row, or `None` once the sheet is exhausted or the iterator closed
    ///
    /// A failure of the producer is returned once, after which the iterator
    /// reports `None` forever.
    pub fn next_row(&mut self) -> CalcResult<Option<Row>> {
        if let Some(receiver) = &self.receiver {
            if let Ok(row) = receiver.recv() {
                return Ok(Some(row));
            }
        }
        self.finish().map(|()| None)
    }

    /// Stop the stream and release the sheet
    ///
    /// Safe to call at any point and any number of times. Returns the
    /// producer's failure if it has not been reported yet.
    pub fn close(&mut self) -> CalcResult<()> {
        self.finish()
    }

    fn finish(&mut self) -> CalcResult<()> {
        self.cancel.store(true, Ordering::Release);
        // Dropping the receiver fails a send the producer is blocked in
        if self.receiver.take().is_some() {
            tracing::debug!("row iterator closed");
        }

        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }

        match self.producer.take().map(JoinHandle::join) {
            None => Ok(()),
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(CalcError::ProducerPanicked),
        }
    }
}

impl Iterator for RowIterator {
    type Item = CalcResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl Drop for RowIterator {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!("row iterator dropped with unreported failure: {e}");
        }
    }
}

/// Enumerate `sheet`, sending each completed row
fn produce_rows(
    workbook: &Workbook,
    sheet: &str,
    sender: SyncSender<Row>,
    cancel: &AtomicBool,
) -> CalcResult<()> {
    let (_, worksheet) = workbook.require_sheet(sheet)?;
    let cells = loop {
        if cancel.load(Ordering::Acquire) {
            tracing::debug!("row producer for {sheet} closed while waiting for the sheet");
            return Ok(());
        }
        if let Some(cells) = worksheet.try_lock_for(LOCK_POLL) {
            break cells;
        }
    };

    let mut shared = SharedFormulaCache::default();
    let mut batch = Row::new();
    let mut current_row = None;
    let mut closed = false;

    visit_cells(&cells, |row, col, data| {
        if cancel.load(Ordering::Acquire) {
            closed = true;
            return Ok(true);
        }
        let row_done = current_row.map_or(false, |r| r != row);
        if row_done && sender.send(mem::take(&mut batch)).is_err() {
            closed = true;
            return Ok(true);
        }
        current_row = Some(row);

        let value = workbook.display_value(&data.value)?;
        let formula = shared.formula_text(row, col, data)?;
        batch.push(IteratorCellValue {
            formula: formula.into_owned(),
            value,
        });
        Ok(false)
    })?;

    if !closed && !batch.is_empty() {
        // A consumer that is already gone just drops the last row
        let _ = sender.send(batch);
    }

    tracing::debug!("row producer for {sheet} finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::WorkbookCalculationExt;
    use pretty_assertions::assert_eq;

    fn cell(formula: &str, value: &str) -> IteratorCellValue {
        IteratorCellValue {
            formula: formula.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_rows_grouped_in_order() {
        let workbook = Arc::new(Workbook::new());
        workbook.set_row_cells("Sheet1", 2, &["x", "=1+2"]).unwrap();
        workbook.set_row_cells("Sheet1", 5, &["y"]).unwrap();

        let rows: Vec<Row> = workbook
            .iterate_row_formula_values("Sheet1")
            .collect::<CalcResult<_>>()
            .unwrap();

        assert_eq!(
            rows,
            vec![vec![cell("", "x"), cell("=1+2", "3")], vec![cell("", "y")]]
        );
    }

    #[test]
    fn test_close_before_first_row() {
        let workbook = Arc::new(Workbook::new());
        workbook.set_row_cells("Sheet1", 1, &["a"]).unwrap();
        workbook.set_row_cells("Sheet1", 2, &["b"]).unwrap();

        let mut rows = workbook.iterate_row_formula_values("Sheet1");
        rows.close().unwrap();
        rows.close().unwrap();
        assert_eq!(rows.next_row().unwrap(), None);
        assert_eq!(rows.next_row().unwrap(), None);

        // Sheet is released once closed
        workbook.set_cell_value("Sheet1", "A3", "c").unwrap();
    }

    #[test]
    fn test_empty_sheet() {
        let workbook = Arc::new(Workbook::new());
        let mut rows = workbook.iterate_row_formula_values("Sheet1");
        assert_eq!(rows.next_row().unwrap(), None);
    }

    #[test]
    fn test_failure_reported_once() {
        let workbook = Arc::new(Workbook::new());
        let mut rows = workbook.iterate_row_formula_values("Missing");

        assert!(matches!(
            rows.next_row(),
            Err(CalcError::Core(sheetcalc_core::Error::SheetNotFound(_)))
        ));
        assert_eq!(rows.next_row().unwrap(), None);
        rows.close().unwrap();
    }

    #[test]
    fn test_close_while_sheet_is_held() {
        let workbook = Arc::new(Workbook::new());
        workbook.set_row_cells("Sheet1", 1, &["a"]).unwrap();
        let held = workbook.worksheet(0).unwrap().lock();

        let mut rows = workbook.iterate_row_formula_values("Sheet1");
        let (done, closed) = mpsc::channel();
        thread::spawn(move || {
            let _ = done.send(rows.close());
        });
        let result = closed.recv_timeout(Duration::from_secs(5));
        drop(held);

        assert!(matches!(result, Ok(Ok(()))));
    }
}
