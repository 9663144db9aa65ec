//! Tests for streaming a sheet row by row

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sheetcalc::prelude::*;

fn sample_workbook(rows: u32) -> Arc<Workbook> {
    let workbook = Workbook::new();
    for row in 1..=rows {
        workbook
            .set_row_cells("Sheet1", row, &[format!("r{row}"), format!("={row}*2")])
            .unwrap();
    }
    Arc::new(workbook)
}

/// Run `f` on another thread and wait a bounded time for it to finish
fn within_timeout<T, F>(f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (done, finished) = mpsc::channel();
    thread::spawn(move || {
        let _ = done.send(f());
    });
    finished.recv_timeout(Duration::from_secs(5)).ok()
}

fn cell(formula: &str, value: &str) -> IteratorCellValue {
    IteratorCellValue {
        formula: formula.to_string(),
        value: value.to_string(),
    }
}

/// Rows arrive in order, one batch per populated row
#[test]
fn test_rows_in_order() {
    let workbook = sample_workbook(3);
    let mut rows = workbook.iterate_row_formula_values("Sheet1");

    for row in 1..=3 {
        let batch = rows.next_row().unwrap().unwrap();
        assert_eq!(
            batch,
            vec![
                cell("", &format!("r{row}")),
                cell(&format!("={row}*2"), &(row * 2).to_string()),
            ]
        );
    }
    assert_eq!(rows.next_row().unwrap(), None);
    assert_eq!(rows.next_row().unwrap(), None);
    rows.close().unwrap();
}

/// Gaps between rows are skipped rather than reported as empty batches
#[test]
fn test_sparse_rows() {
    let workbook = Workbook::new();
    workbook.set_cell_value("Sheet1", "B3", 1.0).unwrap();
    workbook.set_cell_value("Sheet1", "A9", 2.0).unwrap();
    let workbook = Arc::new(workbook);

    let rows: Vec<_> = workbook
        .iterate_row_formula_values("Sheet1")
        .collect::<CalcResult<_>>()
        .unwrap();
    assert_eq!(rows, vec![vec![cell("", "1")], vec![cell("", "2")]]);
}

/// Closing before reading ends the stream and releases the sheet
#[test]
fn test_close_before_next() {
    let workbook = sample_workbook(50);
    let mut rows = workbook.iterate_row_formula_values("Sheet1");

    rows.close().unwrap();
    assert_eq!(rows.next_row().unwrap(), None);
    rows.close().unwrap();

    workbook.set_cell_value("Sheet1", "A1", "changed").unwrap();
    assert_eq!(workbook.get_cell_display("Sheet1", "A1").unwrap(), "changed");
}

/// Closing mid-stream unblocks the producer
#[test]
fn test_close_mid_stream() {
    let workbook = sample_workbook(100);
    let mut rows = workbook.iterate_row_formula_values("Sheet1");

    assert!(rows.next_row().unwrap().is_some());
    assert!(rows.next_row().unwrap().is_some());
    rows.close().unwrap();
    assert_eq!(rows.next_row().unwrap(), None);

    workbook
        .set_calced_cell_formula("Sheet1", "C1", "=B100")
        .unwrap();
    assert_eq!(workbook.get_cell_display("Sheet1", "C1").unwrap(), "200");
}

/// Dropping an open iterator releases the sheet as well
#[test]
fn test_drop_mid_stream() {
    let workbook = sample_workbook(20);
    {
        let mut rows = workbook.iterate_row_formula_values("Sheet1");
        assert!(rows.next_row().unwrap().is_some());
    }
    workbook.set_cell_value("Sheet1", "A1", 0.0).unwrap();
}

/// Opening an unknown sheet surfaces the failure on the first read
#[test]
fn test_unknown_sheet() {
    let workbook = sample_workbook(1);
    let mut rows = workbook.iterate_row_formula_values("Missing");

    assert!(matches!(
        rows.next_row(),
        Err(CalcError::Core(Error::SheetNotFound(_)))
    ));
    assert_eq!(rows.next_row().unwrap(), None);
}

/// Bad shared strings stop the stream with an error after earlier rows
#[test]
fn test_failure_after_rows() {
    let workbook = sample_workbook(2);
    workbook
        .worksheet(0)
        .unwrap()
        .set_cell_value_at(4, 0, CellValue::StringIndex(1000))
        .unwrap();

    let results: Vec<_> = workbook.iterate_row_formula_values("Sheet1").collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(
        results[2],
        Err(CalcError::Core(Error::InvalidSharedString(1000, _)))
    ));
}

/// Different sheets can be streamed at the same time
#[test]
fn test_independent_sheets() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet_with_name("Other").unwrap();
    workbook.set_cell_value("Sheet1", "A1", "left").unwrap();
    workbook.set_cell_value("Other", "A1", "right").unwrap();
    let workbook = Arc::new(workbook);

    let mut left = workbook.iterate_row_formula_values("Sheet1");
    let mut right = workbook.iterate_row_formula_values("Other");

    assert_eq!(right.next_row().unwrap(), Some(vec![cell("", "right")]));
    assert_eq!(left.next_row().unwrap(), Some(vec![cell("", "left")]));
    assert_eq!(left.next_row().unwrap(), None);
    assert_eq!(right.next_row().unwrap(), None);
}

/// A second iterator on a busy sheet can be closed while the first one is open
#[test]
fn test_close_second_iterator_on_same_sheet() {
    let workbook = sample_workbook(5);
    let mut first = workbook.iterate_row_formula_values("Sheet1");
    assert_eq!(first.next_row().unwrap().map(|row| row.len()), Some(2));

    let mut second = workbook.iterate_row_formula_values("Sheet1");
    let closed = within_timeout(move || second.close().is_ok());
    assert_eq!(closed, Some(true));

    let remaining: Vec<_> = first.collect::<CalcResult<_>>().unwrap();
    assert_eq!(remaining.len(), 4);
    assert_eq!(remaining[3][1], cell("=5*2", "10"));
}

/// Dropping a second iterator on a busy sheet does not wait for the first
#[test]
fn test_drop_second_iterator_on_same_sheet() {
    let workbook = sample_workbook(3);
    let mut first = workbook.iterate_row_formula_values("Sheet1");
    assert!(first.next_row().unwrap().is_some());

    let second = workbook.iterate_row_formula_values("Sheet1");
    assert_eq!(within_timeout(move || drop(second)), Some(()));

    first.close().unwrap();
    workbook.set_cell_value("Sheet1", "A1", "free").unwrap();
}
