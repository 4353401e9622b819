//! es-CO currency formatting: zero decimals, `.` thousands separator,
//! `$ ` prefix ("$ 3.500").

use rust_decimal::Decimal;
use std::str::FromStr;

/// Format a raw price field for display. Only the ASCII digits of the
/// input are considered, so both `3500` and the already-localized
/// `3.500` come out as `$ 3.500`. An input with no digits (or one too
/// large to represent) formats to the empty string; the card still
/// composes without a price.
pub fn format_price_cop(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    let Ok(value) = Decimal::from_str(&digits) else {
        return String::new();
    };
    format!("$ {}", group_thousands(&value.normalize().to_string()))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_price_cop("3500"), "$ 3.500");
        assert_eq!(format_price_cop("1234567"), "$ 1.234.567");
        assert_eq!(format_price_cop("999"), "$ 999");
        assert_eq!(format_price_cop("0"), "$ 0");
    }

    #[test]
    fn strips_non_digits() {
        assert_eq!(format_price_cop(" 3.500 "), "$ 3.500");
        assert_eq!(format_price_cop("$3,500"), "$ 3.500");
        assert_eq!(format_price_cop("COP 12000"), "$ 12.000");
    }

    #[test]
    fn normalizes_leading_zeros() {
        assert_eq!(format_price_cop("0042"), "$ 42");
    }

    #[test]
    fn unparseable_formats_to_empty() {
        assert_eq!(format_price_cop(""), "");
        assert_eq!(format_price_cop("gratis"), "");
        // 40 digits exceed what a Decimal can hold
        assert_eq!(format_price_cop(&"9".repeat(40)), "");
    }
}
