// Utility helpers for parsing cells and formatting numbers.
//
// Spreadsheet and CSV exports are messy (thousands separators, stray
// spaces, codes with leading zeros); this module turns raw strings into
// typed cells so the rest of the code can assume clean values.
use crate::types::Cell;
use num_format::{Locale, ToFormattedString};

/// Drop thousands separators, but only when they form proper groups
/// (`1,234,567.5`). Anything else with a comma (`3,4`, `12,34,5`) is not a
/// number we can trust and yields `None`.
fn strip_thousands(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    if frac_part.is_some_and(|f| f.contains(',')) {
        return None;
    }
    let digits = int_part
        .strip_prefix(|c: char| c == '-' || c == '+')
        .unwrap_or(int_part);
    let mut groups = digits.split(',');
    let lead = groups.next()?;
    if lead.is_empty() || lead.len() > 3 || !lead.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    Some(s.replace(',', ""))
}

/// Numeric value of a CPK, kilometre or cost field.
///
/// Letters mean the field is a label (`"12 km"`, `"N/A"`), not a number.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    strip_thousands(s)?.parse::<f64>().ok()
}

pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    strip_thousands(s)?.parse::<i64>().ok()
}

/// Infer a typed cell from a raw text field.
///
/// Codes with leading zeros (`"007"`) stay text so unit and route
/// identifiers survive the round trip untouched.
pub fn parse_cell(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() {
        return Cell::Empty;
    }
    if s.eq_ignore_ascii_case("true") {
        return Cell::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Cell::Bool(false);
    }
    let digits = s.trim_start_matches('-');
    if digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.") {
        return Cell::Text(s.to_string());
    }
    if let Some(i) = parse_i64_safe(Some(s)) {
        return Cell::Int(i);
    }
    if let Some(f) = parse_f64_safe(Some(s)) {
        return Cell::Float(f);
    }
    Cell::Text(s.to_string())
}

/// Arithmetic mean; an empty slice averages to 0 so group means never
/// turn into NaN.
pub fn average(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Fixed decimals with `en` thousands separators (`12,500.00`), as shown in
/// table cells, chart bars and column means.
///
/// Integer parts too large for `u64` are printed ungrouped.
pub fn format_number(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let plain = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };
    let mut res = match int_part.parse::<u64>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // No "-0.00": the sign only shows when a non-zero digit survives rounding.
    if n < 0.0 && plain.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        format!("-{}", res)
    } else {
        res
    }
}

/// Row and option counts in the load summary.
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
