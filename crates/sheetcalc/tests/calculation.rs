//! Tests for evaluating and storing cell formulas

use pretty_assertions::assert_eq;
use sheetcalc::prelude::*;

/// A formula referencing a plain value is stored with its result
#[test]
fn test_formula_result_stored() {
    let workbook = Workbook::new();
    workbook.set_cell_value("Sheet1", "A1", 2.0).unwrap();
    workbook
        .set_calced_cell_formula("Sheet1", "B1", "=A1+3")
        .unwrap();

    assert_eq!(workbook.get_cell_display("Sheet1", "B1").unwrap(), "5");
    assert_eq!(
        workbook.worksheet(0).unwrap().formula("B1").unwrap(),
        Some(CellFormula::normal("=A1+3"))
    );
}

/// Referenced formula cells are recomputed, not read from their stale value
#[test]
fn test_dependent_formula_cells() {
    let workbook = Workbook::new();
    let ws = workbook.worksheet(0).unwrap();
    ws.set_cell_value("A1", 4.0).unwrap();
    ws.set_cell_formula("A2", "=A1*2").unwrap();
    ws.set_cell_formula("A3", "=A2+A2").unwrap();

    workbook
        .set_calced_cell_formula("Sheet1", "A4", "=SUM(A1:A3)")
        .unwrap();
    assert_eq!(workbook.get_cell_value("Sheet1", "A4").unwrap(), CellValue::Number(28.0));
}

/// Long chains of dependent formulas evaluate without exhausting the stack
#[test]
fn test_long_dependency_chain() {
    let workbook = Workbook::new();
    let ws = workbook.worksheet(0).unwrap();
    ws.set_cell_value("A1", 1.0).unwrap();
    for row in 2..=5000 {
        ws.set_cell_formula(&format!("A{row}"), &format!("=A{}+1", row - 1))
            .unwrap();
    }

    workbook
        .set_calced_cell_formula("Sheet1", "B1", "=A5000")
        .unwrap();
    assert_eq!(workbook.get_cell_display("Sheet1", "B1").unwrap(), "5000");
}

/// Rows mix plain text and calculated formulas
#[test]
fn test_set_row_cells() {
    let workbook = Workbook::new();
    workbook
        .set_row_cells("Sheet1", 1, &["hello", "=1+1"])
        .unwrap();

    assert_eq!(workbook.get_cell_display("Sheet1", "A1").unwrap(), "hello");
    assert_eq!(workbook.get_cell_display("Sheet1", "B1").unwrap(), "2");
    assert_eq!(
        workbook.worksheet(0).unwrap().formula("A1").unwrap(),
        None
    );
}

/// A failing cell stops the row but keeps what was written before it
#[test]
fn test_set_row_cells_stops_at_first_error() {
    let workbook = Workbook::new();
    let err = workbook
        .set_row_cells("Sheet1", 2, &["a", "=1/0", "c"])
        .unwrap_err();

    assert_eq!(err.cell_error(), Some(CellError::Div0));
    assert_eq!(workbook.get_cell_display("Sheet1", "A2").unwrap(), "a");
    assert_eq!(workbook.get_cell_display("Sheet1", "B2").unwrap(), "#DIV/0!");
    assert_eq!(workbook.get_cell_display("Sheet1", "C2").unwrap(), "");
}

/// Without cycles the pass limit does not change the result
#[test]
fn test_acyclic_result_independent_of_limit() {
    let workbook = Workbook::new();
    let ws = workbook.worksheet(0).unwrap();
    ws.set_cell_value("A1", 1.5).unwrap();
    ws.set_cell_formula("B1", "=A1*2").unwrap();
    ws.set_cell_formula("C1", "=B1+A1").unwrap();

    for limit in [1, 100] {
        let value = workbook
            .calc_cell_formula(
                "Sheet1",
                "D1",
                "=C1+B1",
                &CalculationOptions::with_max_iterations(limit),
            )
            .unwrap();
        assert_eq!(value, FormulaValue::Number(7.5));
    }
}

/// A cycle through the target cell reads the target's stored value
#[test]
fn test_cycle_through_entry_cell() {
    let workbook = Workbook::new();
    let ws = workbook.worksheet(0).unwrap();
    ws.set_cell_value("A1", 10.0).unwrap();
    ws.set_cell_formula("B1", "=A1+1").unwrap();

    workbook
        .set_calced_cell_formula("Sheet1", "A1", "=B1+1")
        .unwrap();
    assert_eq!(workbook.get_cell_value("Sheet1", "A1").unwrap(), CellValue::Number(12.0));
}

/// A cycle not involving the target terminates with #NUM!
#[test]
fn test_cycle_terminates() {
    let workbook = Workbook::new();
    let ws = workbook.worksheet(0).unwrap();
    ws.set_cell_formula("A1", "=B1+1").unwrap();
    ws.set_cell_formula("B1", "=A1+1").unwrap();

    let err = workbook
        .set_calced_cell_formula_with_options(
            "Sheet1",
            "C1",
            "=A1",
            &CalculationOptions::with_max_iterations(10),
        )
        .unwrap_err();

    assert_eq!(err.cell_error(), Some(CellError::Num));
    assert_eq!(workbook.get_cell_display("Sheet1", "C1").unwrap(), "#NUM!");
}

/// Shared-formula followers evaluate their shifted template
#[test]
fn test_shared_follower_evaluated() {
    let workbook = Workbook::new();
    let ws = workbook.worksheet(0).unwrap();
    ws.set_cell_value("A1", 1.0).unwrap();
    ws.set_cell_value("A2", 5.0).unwrap();
    ws.set_shared_formula("B1", 0, "=A1*10").unwrap();
    ws.set_shared_formula("B2", 0, "").unwrap();

    workbook
        .set_calced_cell_formula("Sheet1", "C1", "=B2")
        .unwrap();
    assert_eq!(workbook.get_cell_display("Sheet1", "C1").unwrap(), "50");
}

/// Unknown functions and names become #NAME? values
#[test]
fn test_unknown_names() {
    let workbook = Workbook::new();
    let err = workbook
        .set_calced_cell_formula("Sheet1", "A1", "=NOSUCHFN(1)")
        .unwrap_err();
    assert_eq!(err.cell_error(), Some(CellError::Name));
    assert_eq!(workbook.get_cell_display("Sheet1", "A1").unwrap(), "#NAME?");
}

/// Lookups of other sheets follow sheet-qualified references
#[test]
fn test_cross_sheet_reference() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet_with_name("Data").unwrap();
    workbook.set_cell_value("Data", "B2", 7.0).unwrap();

    workbook
        .set_calced_cell_formula("Sheet1", "A1", "=Data!B2*2")
        .unwrap();
    assert_eq!(workbook.get_cell_display("Sheet1", "A1").unwrap(), "14");
}
