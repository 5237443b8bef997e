//! Helpers for monetary `NUMERIC` values. Amounts stay `BigDecimal` end to end;
//! line costs and displayed totals are rounded to cents.
use bigdecimal::{BigDecimal, RoundingMode};

pub trait MoneyHelpers {
    /// Rounds half-up to two decimal places.
    fn to_money(&self) -> BigDecimal;
}

impl MoneyHelpers for BigDecimal {
    fn to_money(&self) -> BigDecimal {
        self.with_scale_round(2, RoundingMode::HalfUp)
    }
}

/// Formats an amount with two decimals, e.g. `1250.50`.
pub fn format_amount(amount: &BigDecimal) -> String {
    amount.to_money().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_to_money_rounds_half_up() {
        assert_eq!(dec("15.005").to_money(), dec("15.01"));
        assert_eq!(dec("15.004").to_money(), dec("15.00"));
        assert_eq!(dec("45").to_money().to_string(), "45.00");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(&dec("1250.5")), "1250.50");
        assert_eq!(format_amount(&dec("0")), "0.00");
    }
}
