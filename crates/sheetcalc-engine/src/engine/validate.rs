//! Static formula validation.
//!
//! Checks syntax and reference shape without touching cell values, so cells
//! that can never evaluate are short-circuited before any resolution work.

use regex::Regex;
use std::sync::OnceLock;

use super::cell_ref::{CellRef, bare_ref_re};
use super::error::{ErrorCode, FormulaError};
use super::parser::parse_arithmetic;
use crate::builtins;

fn arithmetic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9.+\-*/()\s]*$").expect("arithmetic charset regex must compile")
    })
}

/// Validate formula text. Returns `None` when the formula is well formed,
/// otherwise the code the cell should display (`#ERROR` or `#REF`).
pub fn validate_formula(formula: &str) -> Option<ErrorCode> {
    let Some(body) = formula.strip_prefix('=') else {
        return Some(ErrorCode::Error);
    };
    let body = body.trim();
    if body.is_empty() {
        return Some(ErrorCode::Error);
    }

    // Built-in calls must be FUNC(REF:REF) with two real references.
    let range_re = builtins::range_fn_re();
    for caps in range_re.captures_iter(body) {
        if CellRef::parse_a1(&caps[2]).is_err() || CellRef::parse_a1(&caps[3]).is_err() {
            return Some(ErrorCode::Ref);
        }
    }
    let reduced = range_re.replace_all(body, "(0)");

    if builtins::call_like_re().is_match(&reduced) {
        return Some(ErrorCode::Error);
    }

    if bare_ref_re()
        .find_iter(&reduced)
        .any(|m| CellRef::parse_a1(m.as_str()).is_err())
    {
        return Some(ErrorCode::Ref);
    }
    let reduced = bare_ref_re().replace_all(&reduced, "(0)");

    if !arithmetic_re().is_match(&reduced) {
        return Some(ErrorCode::Error);
    }

    let mut depth = 0i32;
    for ch in reduced.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Some(ErrorCode::Error);
        }
    }
    if depth != 0 {
        return Some(ErrorCode::Error);
    }

    // Placeholders are parenthesised zeros, so `1/A1` trips division by zero here; only
    // structural failures count.
    match parse_arithmetic(&reduced) {
        Err(FormulaError::Syntax(_)) => Some(ErrorCode::Error),
        _ => None,
    }
}
