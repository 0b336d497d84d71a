use rust_decimal::{Decimal, RoundingStrategy};

/// Totals are reported to two fractional digits using banker's rounding
/// (round half to even).
pub fn round_total(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Renders an amount with a thousands separator and exactly two decimals,
/// e.g. `1234567.5` -> `1,234,567.50`.
pub fn format_amount(value: Decimal) -> String {
    let rounded = round_total(value);
    let rendered = format!("{:.2}", rounded.abs());
    let (integer_part, fraction_part) = rendered.split_once('.').unwrap_or((&rendered, "00"));

    let mut grouped = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (index, digit) in integer_part.chars().enumerate() {
        if index > 0 && (integer_part.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped}.{fraction_part}")
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{format_amount, round_total};

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(round_total(Decimal::new(10_125, 3)), Decimal::new(1012, 2));
        assert_eq!(round_total(Decimal::new(10_135, 3)), Decimal::new(1014, 2));
        assert_eq!(round_total(Decimal::new(3, 0)), Decimal::new(3, 0));
    }

    #[test]
    fn formats_with_thousands_separator() {
        assert_eq!(format_amount(Decimal::new(123_456_750, 2)), "1,234,567.50");
        assert_eq!(format_amount(Decimal::new(300, 0)), "300.00");
        assert_eq!(format_amount(Decimal::new(100_000, 0)), "100,000.00");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_amount(Decimal::new(-1_234_5, 1)), "-1,234.50");
    }
}
