// Display formatting for money, quantities and dates

use chrono::NaiveDate;

/// `1234567.5` -> `1,234,567.50`, prefixed with `symbol`.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = group_thousands(int_part);
    let sign = if negative { "-" } else { "" };
    format!("{}{}{}.{}", sign, symbol, grouped, frac_part)
}

/// Quantity without trailing zeros: `50.0` -> `50`, `2.50` -> `2.5`.
pub fn format_quantity(quantity: f64) -> String {
    let s = format!("{:.3}", quantity);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

/// `2026-03-14` -> `14 Mar 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
