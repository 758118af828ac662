//! Reference shifting for copy/paste.
//!
//! Pasted formulas keep their relative references: `=A1+B2` copied one row
//! down and one column right becomes `=B2+C3`. Range endpoints are ordinary
//! references here, so `SUM(A1:B2)` shifts on both ends.

use regex::Captures;

use super::cell_ref::{CellRef, bare_ref_re};

/// Offset every cell reference in `formula` by a row/column delta.
///
/// If any reference would land on a negative row or column the whole shift is
/// abandoned and the original text comes back unchanged. A leading `=` is kept
/// as is. Tokens that look like references but do not parse (`ZZZZ1`, `A0`)
/// are left alone.
pub fn shift_refs(formula: &str, row_delta: isize, col_delta: isize) -> String {
    if row_delta == 0 && col_delta == 0 {
        return formula.to_string();
    }

    let (prefix, body) = match formula.strip_prefix('=') {
        Some(body) => ("=", body),
        None => ("", formula),
    };

    let mut out_of_range = false;
    let shifted = bare_ref_re().replace_all(body, |caps: &Captures| {
        let text = &caps[0];
        let Ok(cell) = CellRef::parse_a1(text) else {
            return text.to_string();
        };
        match cell.offset(row_delta, col_delta) {
            Some(moved) => moved.to_string(),
            None => {
                out_of_range = true;
                text.to_string()
            }
        }
    });

    if out_of_range {
        return formula.to_string();
    }
    format!("{}{}", prefix, shifted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_positive_delta() {
        assert_eq!(shift_refs("=A1+B2", 1, 1), "=B2+C3");
        assert_eq!(shift_refs("=SUM(A1:B2) * c3", 2, 0), "=SUM(A3:B4) * C5");
    }

    #[test]
    fn test_shift_negative_delta() {
        assert_eq!(shift_refs("=B2-C3", -1, -1), "=A1-B2");
    }

    #[test]
    fn test_shift_out_of_range_keeps_original() {
        assert_eq!(shift_refs("=A1", -5, 0), "=A1");
        // No partial shifts: B2 could move but A1 cannot.
        assert_eq!(shift_refs("=B2+A1", 0, -1), "=B2+A1");
    }

    #[test]
    fn test_shift_leaves_non_references() {
        assert_eq!(shift_refs("=MAX(A1:A2)+10", 0, 1), "=MAX(B1:B2)+10");
        assert_eq!(shift_refs("=ZZZZ1+A1", 1, 0), "=ZZZZ1+A2");
        assert_eq!(shift_refs("=Z1", 0, 1), "=AA1");
    }

    #[test]
    fn test_shift_without_equals() {
        assert_eq!(shift_refs("A1", 1, 0), "A2");
        assert_eq!(shift_refs("", 3, 3), "");
        assert_eq!(shift_refs("=A1", 0, 0), "=A1");
    }
}
