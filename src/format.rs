//! Rounding and display rules shared by the metric widgets and the map labels.
//!
//! Both surfaces must agree on a value, so every displayed number goes through
//! [`round2`]: exact decimal arithmetic, two places, midpoint away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

pub const DISPLAY_DECIMALS: u32 = 2;

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounded value as plain text, trailing zeros dropped: `10.50` -> `10.5`.
pub fn plain(value: Decimal) -> String {
    round2(value).normalize().to_string()
}

/// Rounded value with `,` grouping in the integer part: `1234567.8` -> `1,234,567.8`.
pub fn thousands(value: Decimal) -> String {
    let text = plain(value);

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };

    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn thousands_int(value: i64) -> String {
    thousands(Decimal::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(round2(d("30.555")), d("30.56"));
        // half-to-even would give 30.54 here
        assert_eq!(round2(d("30.545")), d("30.55"));
        assert_eq!(round2(d("-2.345")), d("-2.35"));
        assert_eq!(round2(d("1.004")), d("1.00"));
    }

    #[test]
    fn plain_drops_trailing_zeros() {
        assert_eq!(plain(d("20")), "20");
        assert_eq!(plain(d("10.50")), "10.5");
        assert_eq!(plain(d("10.555")), "10.56");
        assert_eq!(plain(d("1234.5")), "1234.5");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(thousands(d("0")), "0");
        assert_eq!(thousands(d("999")), "999");
        assert_eq!(thousands(d("1000")), "1,000");
        assert_eq!(thousands(d("1234567.891")), "1,234,567.89");
        assert_eq!(thousands(d("-1234.5")), "-1,234.5");
        assert_eq!(thousands_int(161), "161");
        assert_eq!(thousands_int(12_000), "12,000");
    }
}
