//! Amount coercion and formatting
//!
//! Submitted pricing values arrive either as JSON numbers or as strings typed
//! into a form, so parsing is lenient: a leading numeric prefix is accepted the
//! way a browser's `parseFloat` would.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Coerce a stored JSON value into an amount
pub fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        serde_json::Value::String(s) => parse_amount_str(s),
        _ => None,
    }
}

fn parse_amount_str(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if let Ok(d) = Decimal::from_str(trimmed) {
        return Some(d);
    }

    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in trimmed.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '-' | '+' if i == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }

    if end == 0 {
        return None;
    }
    Decimal::from_str(&trimmed[..end]).ok()
}

/// Display an amount without trailing zeros (`175`, `263.3`)
pub fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Display an amount with two decimals (`263.30`)
pub fn format_currency(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_numbers_and_strings() {
        assert_eq!(parse_amount(&json!(150)), Some(dec!(150)));
        assert_eq!(parse_amount(&json!(45.5)), Some(dec!(45.5)));
        assert_eq!(parse_amount(&json!("25")), Some(dec!(25)));
        assert_eq!(parse_amount(&json!(" 12.75 ")), Some(dec!(12.75)));
    }

    #[test]
    fn test_parse_leading_prefix() {
        assert_eq!(parse_amount(&json!("150abc")), Some(dec!(150)));
        assert_eq!(parse_amount(&json!("R150")), None);
        assert_eq!(parse_amount(&json!("")), None);
        assert_eq!(parse_amount(&json!(null)), None);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_amount(dec!(175.00)), "175");
        assert_eq!(format_amount(dec!(263.30)), "263.3");
        assert_eq!(format_currency(dec!(263.3)), "263.30");
        assert_eq!(format_currency(dec!(45.5)), "45.50");
    }
}
