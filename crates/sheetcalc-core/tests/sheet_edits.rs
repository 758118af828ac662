//! Integration tests for editing a typed sheet end to end.

use pretty_assertions::assert_eq;
use sheetcalc_core::{CellRef, ClipCell, Column, ColumnType, RecalcOptions, Sheet, SheetError};

fn budget() -> Sheet {
    let mut sheet = Sheet::new(vec![
        Column::new("Item", ColumnType::Text),
        Column::new("Qty", ColumnType::Number),
        Column::new("Price", ColumnType::Number),
        Column::new("Total", ColumnType::Number),
    ]);
    for _ in 0..3 {
        sheet.insert_row(sheet.row_count()).unwrap();
    }
    let inputs = [
        (0, 0, "pens"),
        (0, 1, "2"),
        (0, 2, "1.5"),
        (1, 0, "paper"),
        (1, 1, "4"),
        (1, 2, "3"),
        (0, 3, "=B1*C1"),
        (1, 3, "=B2*C2"),
        (2, 3, "=SUM(D1:D2)"),
    ];
    for (row, col, input) in inputs {
        sheet.set_cell(row, col, input).unwrap();
    }
    sheet
}

fn column(sheet: &Sheet, col: usize) -> Vec<&str> {
    sheet.rows.iter().map(|r| r[col].as_str()).collect()
}

#[test]
fn test_edits_propagate_through_dependents() {
    let mut sheet = budget();
    assert_eq!(column(&sheet, 3), vec!["3", "12", "15"]);

    let report = sheet.set_cell(1, 1, "10").unwrap();
    assert_eq!(column(&sheet, 3), vec!["3", "30", "33"]);
    assert_eq!(report.order, vec![CellRef::new(1, 3), CellRef::new(2, 3)]);
    assert!(report.errors.is_empty());
}

#[test]
fn test_type_checks_reject_bad_plain_values() {
    let mut sheet = budget();
    let err = sheet.set_cell(0, 1, "two").unwrap_err();
    assert!(matches!(err, SheetError::InvalidValue { kind: ColumnType::Number, .. }));
    assert_eq!(sheet.value(0, 1), Some("2"));

    // Formulas bypass the column type.
    sheet.set_cell(0, 1, "=1/0").unwrap();
    assert_eq!(sheet.value(0, 1), Some("#DIV/0"));
    assert_eq!(column(&sheet, 3), vec!["#DIV/0", "12", "#DIV/0"]);
}

#[test]
fn test_plain_value_replaces_formula() {
    let mut sheet = budget();
    sheet.set_cell(0, 3, "100").unwrap();
    assert_eq!(sheet.cell_input(0, 3).as_deref(), Some("100"));
    assert!(!sheet.formulas.contains_key("0,3"));
    assert_eq!(sheet.value(2, 3), Some("112"));
}

#[test]
fn test_insert_row_moves_formula_keys() {
    let mut sheet = budget();
    sheet.insert_row(0).unwrap();
    let keys: Vec<&str> = sheet.formulas.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["1,3", "2,3", "3,3"]);
    // References are not rewritten: D2 now reads row 1 of the grid.
    assert_eq!(sheet.cell_input(1, 3).as_deref(), Some("=B1*C1"));
    assert_eq!(sheet.value(1, 3), Some("0"));
}

#[test]
fn test_delete_row_drops_its_formulas() {
    let mut sheet = budget();
    sheet.delete_row(0).unwrap();
    assert_eq!(sheet.row_count(), 2);
    let keys: Vec<&str> = sheet.formulas.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["0,3", "1,3"]);
    assert!(sheet.delete_row(5).is_err());
}

#[test]
fn test_duplicate_row_copies_formulas() {
    let mut sheet = budget();
    sheet.duplicate_row(0).unwrap();
    assert_eq!(sheet.row_count(), 4);
    assert_eq!(sheet.cell_input(1, 3).as_deref(), Some("=B1*C1"));
    assert_eq!(sheet.value(1, 0), Some("pens"));
    assert_eq!(sheet.cell_input(3, 3).as_deref(), Some("=SUM(D1:D2)"));
}

#[test]
fn test_column_edits_keep_types_aligned() {
    let mut sheet = budget();
    sheet
        .insert_column(1, Column::new("Due", ColumnType::Date))
        .unwrap();
    assert_eq!(sheet.column_count(), 5);
    assert!(sheet.set_cell(0, 1, "2024-01-31").is_ok());
    assert!(sheet.set_cell(0, 1, "soon").is_err());
    assert!(sheet.formulas.contains_key("0,4"));

    sheet.move_column(4, 0).unwrap();
    assert_eq!(sheet.columns[0].name, "Total");
    assert!(sheet.formulas.contains_key("0,0"));

    sheet.delete_column(0).unwrap();
    assert!(sheet.formulas.is_empty());
    assert!(matches!(
        sheet.move_column(0, 9),
        Err(SheetError::InvalidMove { from: 0, to: 9, len: 4 })
    ));
}

#[test]
fn test_sort_rows_moves_formulas_with_their_rows() {
    let mut sheet = budget();
    sheet.sort_rows(0, true).unwrap();
    // "paper" < "pens" < "" (the total row has a blank item).
    assert_eq!(column(&sheet, 0), vec!["paper", "pens", ""]);
    assert_eq!(sheet.cell_input(0, 3).as_deref(), Some("=B2*C2"));
    assert_eq!(sheet.cell_input(2, 3).as_deref(), Some("=SUM(D1:D2)"));
}

#[test]
fn test_paste_shifts_formula_references() {
    let mut sheet = budget();
    sheet.insert_row(3).unwrap();
    let clip = [
        ClipCell::new(0, 0, "ink"),
        ClipCell::new(0, 1, "1"),
        ClipCell::new(0, 2, "7"),
        ClipCell::new(0, 3, "=B2*C2"),
    ];
    sheet
        .paste(CellRef::new(3, 0), CellRef::new(1, 0), &clip)
        .unwrap();
    assert_eq!(sheet.cell_input(3, 3).as_deref(), Some("=B4*C4"));
    assert_eq!(sheet.value(3, 3), Some("7"));
}

#[test]
fn test_paste_that_would_go_negative_keeps_text() {
    let mut sheet = budget();
    let clip = [ClipCell::new(0, 0, "=D1+1")];
    sheet
        .paste(CellRef::new(0, 0), CellRef::new(2, 0), &clip)
        .unwrap();
    // Item column is text, so the formula lands there; shifting up two rows is
    // impossible, so the text is kept as copied.
    assert_eq!(sheet.cell_input(0, 0).as_deref(), Some("=D1+1"));
}

#[test]
fn test_paste_out_of_bounds_is_rejected() {
    let mut sheet = budget();
    let before = sheet.clone();
    let clip = [ClipCell::new(0, 0, "x"), ClipCell::new(5, 0, "y")];
    assert!(matches!(
        sheet.paste(CellRef::new(0, 0), CellRef::new(0, 0), &clip),
        Err(SheetError::OutOfBounds { row: 5, col: 0 })
    ));
    assert_eq!(sheet, before);
}

#[test]
fn test_restore_recalculates_snapshot() {
    let mut sheet = budget();
    let rows = sheet.rows.clone();
    let formulas = sheet.formulas.clone();

    sheet.set_cell(0, 1, "100").unwrap();
    assert_eq!(sheet.value(2, 3), Some("162"));

    sheet.restore(rows, formulas);
    assert_eq!(column(&sheet, 3), vec!["3", "12", "15"]);
}

#[test]
fn test_cycles_and_bad_references() {
    let mut sheet = budget();
    sheet.set_cell(0, 1, "=D1").unwrap();
    assert_eq!(sheet.value(0, 1), Some("#CYCLE"));
    assert_eq!(sheet.value(0, 3), Some("#CYCLE"));
    assert_eq!(sheet.value(2, 3), Some("#CYCLE"));

    let mut sheet = budget();
    sheet.set_cell(0, 2, "=Z1").unwrap();
    assert_eq!(sheet.value(0, 2), Some("#REF"));
}

#[test]
fn test_propagation_depth_comes_from_options() {
    let mut sheet = budget().with_options(RecalcOptions {
        max_depth: 1,
        enforce_bounds: true,
    });
    sheet.set_cell(0, 2, "=2").unwrap();
    assert_eq!(sheet.value(0, 3), Some("4"));
    // Two hops away: left as it was.
    assert_eq!(sheet.value(2, 3), Some("15"));

    sheet.recalculate_all();
    assert_eq!(sheet.value(2, 3), Some("16"));
}

#[test]
fn test_json_round_trip_preserves_state() {
    let sheet = budget();
    let json = sheet.to_json().unwrap();
    let back = Sheet::from_json(&json).unwrap();
    assert_eq!(back.rows, sheet.rows);
    assert_eq!(back.formulas, sheet.formulas);
    assert_eq!(back.columns, sheet.columns);
}
