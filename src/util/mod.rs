/// Dollar amount with two decimals, e.g. `$4.50`.
pub fn format_money(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${amount:.2}")
    }
}

pub fn plural(count: u32) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Parse a user or API supplied amount, falling back to zero.
/// Accepts a leading `$`, thousands separators and surrounding whitespace.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(format_money(4.5), "$4.50");
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(1234.567), "$1234.57");
        assert_eq!(format_money(f64::NAN), "$0.00");
    }

    #[test]
    fn amounts_parse_with_fallback() {
        assert_eq!(parse_amount("5"), 5.0);
        assert_eq!(parse_amount(" $1,250.75 "), 1250.75);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
    }
}
