use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// internal precision kept on intermediate amounts
const INTERNAL_DP: u32 = 8;

/// currency minor-unit precision (paise, cents)
pub const CURRENCY_DP: u32 = 2;

/// money amount in a decimal currency unit (e.g. rupees)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    /// one minor unit (0.01)
    pub const MINOR_UNIT: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(INTERNAL_DP))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?.round_dp(INTERNAL_DP)))
    }

    /// create from whole currency units (rupees, dollars)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor units (paise, cents)
    pub fn from_minor(amount: i64) -> Self {
        Money(Decimal::new(amount, CURRENCY_DP))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round to currency precision, half away from zero
    pub fn round_currency(&self) -> Self {
        let mut rounded = self
            .0
            .round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero);
        // always carry two places so "1120" displays as "1120.00"
        rounded.rescale(CURRENCY_DP);
        Money(rounded)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// multiply by a count of installments, saturating at the decimal range
    pub fn times(&self, count: u32) -> Self {
        Money(self.0.saturating_mul(Decimal::from(count)).round_dp(INTERNAL_DP))
    }

    /// `None` when the product leaves the decimal range
    pub fn checked_times(&self, count: u32) -> Option<Self> {
        self.checked_mul(Decimal::from(count))
    }

    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money::from_decimal)
    }

    pub fn checked_mul(&self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).map(Money::from_decimal)
    }

    pub fn checked_div(&self, divisor: Decimal) -> Option<Self> {
        self.0.checked_div(divisor).map(Money::from_decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(INTERNAL_DP))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(INTERNAL_DP);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(INTERNAL_DP))
    }
}

/// annual interest rate, stored as a fraction (0.12 for 12%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal fraction (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from whole percentage (e.g., 5 for 5%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::from(100))
    }

    /// create from a percentage that may carry decimals (e.g., 10.5)
    pub fn from_percentage_decimal(p: Decimal) -> Self {
        Rate(p / Decimal::from(100))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0.saturating_mul(Decimal::ONE_HUNDRED)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.123456789").unwrap();
        assert_eq!(m.to_string(), "100.12345679"); // rounded to 8 places
    }

    #[test]
    fn test_minor_units() {
        let m = Money::from_minor(112_000);
        assert_eq!(m, Money::from_major(1_120));
        assert_eq!(Money::from_minor(1), Money::MINOR_UNIT);
    }

    #[test]
    fn test_round_currency_half_away_from_zero() {
        // banker's rounding would give 0.12 here
        assert_eq!(Money::from(dec!(0.125)).round_currency(), Money::from(dec!(0.13)));
        assert_eq!(Money::from(dec!(0.124)).round_currency(), Money::from(dec!(0.12)));
        assert_eq!(
            Money::from(dec!(1666.6666667)).round_currency(),
            Money::from(dec!(1666.67))
        );
        assert_eq!(Money::from_major(1_120).round_currency().to_string(), "1120.00");
    }

    #[test]
    fn test_times() {
        assert_eq!(Money::from(dec!(1120.00)).times(12), Money::from_major(13_440));
        assert_eq!(Money::from_major(500).times(0), Money::ZERO);
        assert_eq!(Money::from_decimal(Decimal::MAX).times(2).as_decimal(), Decimal::MAX);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Money::from_decimal(Decimal::MAX);

        assert_eq!(huge.checked_times(2), None);
        assert_eq!(huge.checked_add(Money::from_major(1)), None);
        assert_eq!(huge.checked_mul(dec!(1.5)), None);
        assert_eq!(Money::from_major(10).checked_div(Decimal::ZERO), None);
        assert_eq!(
            Money::from_major(1_120).checked_times(12),
            Some(Money::from_major(13_440))
        );
    }

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_percentage(12);
        assert_eq!(rate.as_decimal(), dec!(0.12));
        assert_eq!(Rate::from_percentage_decimal(dec!(10.5)).as_decimal(), dec!(0.105));
        assert_eq!(rate.to_string(), "12%");
    }
}
