use bigdecimal::{BigDecimal, ToPrimitive, Zero};

/// Converts a major-unit amount (naira, dollars) into minor units (kobo, cents).
pub fn to_minor_units(amount: &BigDecimal) -> Option<i64> {
    (amount * BigDecimal::from(100)).round(0).to_i64()
}

pub fn from_minor_units(amount: &BigDecimal) -> BigDecimal {
    amount / BigDecimal::from(100)
}

/// Renders an amount with two decimals and thousands separators, e.g. `NGN 12,500.00`.
pub fn format(currency: &str, amount: &BigDecimal) -> String {
    let rounded = amount.round(2).with_scale(2).to_string();
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest.to_string()),
        None => ("", rounded),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{} {}{}.{}", currency, sign, grouped, fraction)
}

pub fn non_negative(amount: BigDecimal) -> BigDecimal {
    if amount < BigDecimal::zero() {
        BigDecimal::zero()
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn converts_to_kobo() {
        let amount = BigDecimal::from_str("12500.50").unwrap();
        assert_eq!(to_minor_units(&amount), Some(1_250_050));
    }

    #[test]
    fn converts_from_kobo() {
        let amount = from_minor_units(&BigDecimal::from(1_250_050));
        assert_eq!(amount, BigDecimal::from_str("12500.50").unwrap());
    }

    #[test]
    fn formats_with_thousands_separators() {
        let amount = BigDecimal::from_str("1234567.5").unwrap();
        assert_eq!(format("NGN", &amount), "NGN 1,234,567.50");
        assert_eq!(format("NGN", &BigDecimal::from(950)), "NGN 950.00");
    }

    #[test]
    fn clamps_negative_amounts_to_zero() {
        assert_eq!(non_negative(BigDecimal::from(-5)), BigDecimal::zero());
        assert_eq!(non_negative(BigDecimal::from(5)), BigDecimal::from(5));
    }
}
