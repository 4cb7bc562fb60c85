//! German-locale rendering of numbers, money and dates, as shown in the fleet manager.

use crate::monthly_costs::YearMonth;
use bigdecimal::{BigDecimal, RoundingMode, Zero};
use jiff::Zoned;

const SHORT_MONTHS: [&str; 12] = [
    "Jan.", "Feb.", "März", "Apr.", "Mai", "Juni", "Juli", "Aug.", "Sept.", "Okt.", "Nov.", "Dez.",
];

/// Rounds half-up to `decimals` places and groups thousands: `1234567.891` -> `1.234.567,89`.
pub fn format_number(value: &BigDecimal, decimals: u8) -> String {
    let decimals = usize::from(decimals);
    let rounded = value.with_scale_round(decimals as i64, RoundingMode::HalfUp);
    let negative = rounded < BigDecimal::zero();
    let (unscaled, scale) = rounded.as_bigint_and_exponent();

    // A zero may come back with a scale other than `decimals`, so pad or trim to it.
    let mut digits = unscaled.to_string().trim_start_matches('-').to_owned();
    if scale < decimals as i64 {
        let missing = (decimals as i64 - scale) as usize;
        digits.extend(std::iter::repeat_n('0', missing));
    } else {
        digits.truncate(digits.len().saturating_sub((scale - decimals as i64) as usize));
    }
    if digits.len() <= decimals {
        digits.insert_str(0, &"0".repeat(decimals + 1 - digits.len()));
    }
    let (integer, fraction) = digits.split_at(digits.len() - decimals);

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if negative {
        out.push('-');
    }
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(digit);
    }
    if !fraction.is_empty() {
        out.push(',');
        out.push_str(fraction);
    }
    out
}

pub fn format_currency(value: &BigDecimal) -> String {
    format!("{} €", format_number(value, 2))
}

pub fn format_date(date: &Zoned) -> String {
    date.strftime("%d.%m.%Y").to_string()
}

/// `Jan. 2024`
pub fn month_label(month: YearMonth) -> String {
    let name = SHORT_MONTHS[(month.month - 1) as usize];
    format!("{} {}", name, month.year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use jiff::tz::TimeZone;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(format_number(&dec("1234567.891"), 2), "1.234.567,89");
        assert_eq!(format_number(&dec("999"), 0), "999");
        assert_eq!(format_number(&dec("1000"), 0), "1.000");
        assert_eq!(format_number(&dec("12500"), 1), "12.500,0");
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(format_number(&dec("0.125"), 2), "0,13");
        assert_eq!(format_number(&dec("8"), 2), "8,00");
        assert_eq!(format_number(&dec("499.5"), 0), "500");
    }

    #[test]
    fn negative_values_keep_their_sign() {
        assert_eq!(format_number(&dec("-1234.5"), 2), "-1.234,50");
        assert_eq!(format_number(&dec("-0.001"), 2), "0,00");
    }

    #[test]
    fn currency_has_euro_suffix() {
        assert_eq!(format_currency(&dec("68.4")), "68,40 €");
        assert_eq!(format_currency(&dec("0")), "0,00 €");
    }

    #[test]
    fn zero_keeps_requested_decimals() {
        assert_eq!(format_number(&BigDecimal::zero(), 0), "0");
        assert_eq!(format_number(&BigDecimal::zero(), 2), "0,00");
        assert_eq!(format_number(&dec("0.000"), 1), "0,0");
        assert_eq!(format_number(&dec("0.004"), 2), "0,00");
        assert_eq!(format_number(&dec("0.05"), 2), "0,05");
        assert_eq!(format_number(&dec("1E+3"), 2), "1.000,00");
    }

    #[test]
    fn dates_and_months_in_german() {
        let zoned = date(2024, 3, 7).to_zoned(TimeZone::UTC).unwrap();
        assert_eq!(format_date(&zoned), "07.03.2024");
        assert_eq!(month_label(YearMonth::new(2024, 3)), "März 2024");
        assert_eq!(month_label(YearMonth::new(2023, 12)), "Dez. 2023");
    }
}
