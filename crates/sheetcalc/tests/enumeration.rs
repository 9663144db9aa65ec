//! Tests for enumerating cell formulas and values

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sheetcalc::prelude::*;

fn formula_values(workbook: &Workbook, sheet: &str) -> Vec<(String, String, String)> {
    let mut cells = Vec::new();
    workbook
        .each_cell_formula_value(sheet, |cell, formula, value| {
            cells.push((cell.to_string(), formula.to_string(), value.to_string()));
            false
        })
        .unwrap();
    cells
}

/// Plain values report an empty formula, formula cells their text and result
#[test]
fn test_formula_and_value_per_cell() {
    let workbook = Workbook::new();
    workbook.set_cell_value("Sheet1", "A1", 2.0).unwrap();
    workbook
        .set_calced_cell_formula("Sheet1", "B1", "=A1+3")
        .unwrap();

    assert_eq!(
        formula_values(&workbook, "Sheet1"),
        vec![
            ("A1".to_string(), String::new(), "2".to_string()),
            ("B1".to_string(), "=A1+3".to_string(), "5".to_string()),
        ]
    );
}

/// A shared follower reports the anchor template shifted to its position
#[test]
fn test_shared_follower_formula() {
    let workbook = Workbook::new();
    let ws = workbook.worksheet(0).unwrap();
    ws.set_shared_formula("C1", 0, "=A1+1").unwrap();
    ws.set_shared_formula("C2", 0, "").unwrap();

    let mut formulas = Vec::new();
    workbook
        .each_cell_formula("Sheet1", |cell, formula| {
            formulas.push(format!("{cell}{formula}"));
            false
        })
        .unwrap();
    assert_eq!(formulas, ["C1=A1+1", "C2=A2+1"]);
}

/// Non-shared formulas come back exactly as written
#[test]
fn test_normal_formula_verbatim() {
    let workbook = Workbook::new();
    let formula = "=IF(A1>0, \"B1\", $C$3)";
    workbook.worksheet(0).unwrap().set_cell_formula("D4", formula).unwrap();

    let cells = formula_values(&workbook, "Sheet1");
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].1, formula);
}

/// Shared-string values are resolved to their text
#[test]
fn test_shared_string_values() {
    let workbook = Workbook::new();
    workbook
        .set_sheet_bulk_str_unsafe("Sheet1", "A1", &[["x", "y"]])
        .unwrap();

    let values: Vec<String> = formula_values(&workbook, "Sheet1")
        .into_iter()
        .map(|(_, _, value)| value)
        .collect();
    assert_eq!(values, ["x", "y"]);
}

/// Enumerating an unknown sheet fails without calling back
#[test]
fn test_unknown_sheet() {
    let workbook = Workbook::new();
    let mut called = false;
    let result = workbook.each_cell_formula("Nope", |_, _| {
        called = true;
        false
    });
    assert!(matches!(result, Err(CalcError::Core(Error::SheetNotFound(_)))));
    assert!(!called);
}

proptest! {
    /// Every populated cell is visited once, in row-major order
    #[test]
    fn test_row_major_visit(cells in prop::collection::btree_set((0u32..60, 0u16..30), 0..50)) {
        let workbook = Workbook::new();
        let ws = workbook.worksheet(0).unwrap();
        for &(row, col) in &cells {
            ws.set_cell_value_at(row, col, 1.0).unwrap();
        }

        let mut visited = Vec::new();
        workbook
            .each_cell_formula("Sheet1", |cell, _| {
                visited.push(cell.to_string());
                false
            })
            .unwrap();

        let expected: Vec<String> = cells
            .iter()
            .map(|&(row, col)| CellAddress::new(row, col).to_a1_string())
            .collect();
        prop_assert_eq!(visited.len(), cells.len());
        prop_assert_eq!(visited, expected);
    }
}
