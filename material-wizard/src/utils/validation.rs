// Input parsing for numeric and date text fields

use chrono::NaiveDate;
use regex::Regex;

/// Parse a decimal text field. Blank input is `Ok(None)`. Commas are accepted only as thousands
/// separators; negative and non-finite numbers are rejected, so callers only ever see finite
/// values >= 0.
pub fn parse_decimal(input: &str) -> Result<Option<f64>, String> {
    let s = input.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let number_re = Regex::new(r"^((\d{1,3}(,\d{3})+|\d+)(\.\d*)?|\.\d+)$")
        .map_err(|e| format!("Internal error: failed to compile number regex: {}", e))?;
    if !number_re.is_match(s) {
        return Err(format!("'{}' is not a valid number", s));
    }
    let digits: String = s.chars().filter(|c| *c != ',').collect();
    let value = digits
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !value.is_finite() {
        return Err(format!("'{}' is too large", s));
    }
    Ok(Some(value))
}

/// Parse a `YYYY-MM-DD` date field. Blank input is `Ok(None)`.
pub fn parse_date(input: &str) -> Result<Option<NaiveDate>, String> {
    let s = input.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| format!("'{}' is not a date (use YYYY-MM-DD)", s))
}

/// Blank → `None`, otherwise the trimmed value.
pub fn optional_text(input: &str) -> Option<String> {
    let s = input.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
