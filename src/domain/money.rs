//! Fixed-point money arithmetic.
//!
//! All monetary amounts are carried internally as `i64` minor currency
//! units (paise/cents). rust_decimal is used only at the parse/format
//! boundary, so no floating point ever touches a ledger value.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("amount has more than 2 fractional digits: {0}")]
    TooPrecise(String),
    #[error("amount is negative: {0}")]
    Negative(String),
    #[error("invalid rate: {0}")]
    InvalidRate(String),
}

/// A non-negative monetary amount in minor currency units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Create from minor units directly.
    pub fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Parse a decimal string ("2999", "449.85") into minor units.
    ///
    /// # Errors
    /// Rejects malformed numbers, negative amounts, and amounts with more
    /// than two fractional digits.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let dec = Decimal::from_str(s).map_err(|_| MoneyError::InvalidAmount(s.to_string()))?;
        if dec.is_sign_negative() && !dec.is_zero() {
            return Err(MoneyError::Negative(s.to_string()));
        }
        let scaled = dec * Decimal::ONE_HUNDRED;
        if scaled.fract() != Decimal::ZERO {
            return Err(MoneyError::TooPrecise(s.to_string()));
        }
        // scaled is integral here; to_i64 only fails on i64 overflow.
        let minor = scaled
            .to_i64()
            .ok_or_else(|| MoneyError::InvalidAmount(s.to_string()))?;
        Ok(Money(minor))
    }

    /// Minor-unit value.
    pub fn minor(&self) -> i64 {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Money(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Commission owed for this gross amount at the given rate.
    ///
    /// Computed as `amount * rate / 100` in integer arithmetic over basis
    /// points, rounded half-up to the minor unit.
    pub fn commission_at(&self, rate: RateBps) -> Money {
        let numerator = i128::from(self.0) * i128::from(rate.as_bps());
        let quotient = numerator / 10_000;
        let remainder = numerator % 10_000;
        let rounded = if remainder * 2 >= 10_000 {
            quotient + 1
        } else {
            quotient
        };
        // Gross amounts fit i64 by construction, so rate <= 100% keeps us in range.
        Money(rounded as i64)
    }

    /// Format as a canonical decimal string, trailing zeros trimmed.
    pub fn to_decimal_string(&self) -> String {
        let dec = Decimal::new(self.0, 2).normalize();
        format!("{}", dec)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

/// Commission rate in basis points (1% = 100 bps).
///
/// Stored as an integer so rate arithmetic stays exact; parsed from the
/// percent notation used by the catalog ("15", "2.5").
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RateBps(i64);

impl RateBps {
    pub fn from_bps(bps: i64) -> Self {
        RateBps(bps)
    }

    /// Parse a percentage string into basis points.
    ///
    /// # Errors
    /// Rejects malformed numbers, negative rates, rates above 100%, and
    /// rates finer than a hundredth of a percent.
    pub fn from_percent_str(s: &str) -> Result<Self, MoneyError> {
        let dec = Decimal::from_str(s).map_err(|_| MoneyError::InvalidRate(s.to_string()))?;
        let scaled = dec * Decimal::ONE_HUNDRED;
        if scaled.fract() != Decimal::ZERO
            || scaled.is_sign_negative() && !scaled.is_zero()
            || scaled > Decimal::new(10_000, 0)
        {
            return Err(MoneyError::InvalidRate(s.to_string()));
        }
        let bps = scaled
            .to_i64()
            .ok_or_else(|| MoneyError::InvalidRate(s.to_string()))?;
        Ok(RateBps(bps))
    }

    pub fn as_bps(&self) -> i64 {
        self.0
    }

    /// Percent representation, e.g. 1500 bps -> "15".
    pub fn to_percent_string(&self) -> String {
        let dec = Decimal::new(self.0, 2).normalize();
        format!("{}", dec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_amount() {
        assert_eq!(Money::parse("2999").unwrap().minor(), 299_900);
    }

    #[test]
    fn test_parse_fractional_amount() {
        assert_eq!(Money::parse("449.85").unwrap().minor(), 44_985);
        assert_eq!(Money::parse("2999.50").unwrap().minor(), 299_950);
        assert_eq!(Money::parse("0.01").unwrap().minor(), 1);
        assert_eq!(Money::parse("1.5").unwrap().minor(), 150);
    }

    #[test]
    fn test_parse_rejects_too_precise() {
        assert_eq!(
            Money::parse("1.005"),
            Err(MoneyError::TooPrecise("1.005".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert!(matches!(Money::parse("-5"), Err(MoneyError::Negative(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Money::parse("not-a-number"),
            Err(MoneyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_commission_reference_scenario() {
        // rate=15%, amount=2999 -> 449.85 exactly
        let gross = Money::parse("2999").unwrap();
        let rate = RateBps::from_percent_str("15").unwrap();
        assert_eq!(gross.commission_at(rate), Money::parse("449.85").unwrap());
    }

    #[test]
    fn test_commission_boundary_rates() {
        let gross = Money::parse("100").unwrap();
        assert_eq!(
            gross.commission_at(RateBps::from_percent_str("1").unwrap()),
            Money::parse("1").unwrap()
        );
        assert_eq!(
            gross.commission_at(RateBps::from_percent_str("100").unwrap()),
            gross
        );
    }

    #[test]
    fn test_commission_half_up_rounding() {
        // 0.05 * 10% = 0.005 -> rounds up to 0.01
        let gross = Money::parse("0.05").unwrap();
        let rate = RateBps::from_percent_str("10").unwrap();
        assert_eq!(gross.commission_at(rate).minor(), 1);

        // 0.04 * 10% = 0.004 -> rounds down to 0
        let gross = Money::parse("0.04").unwrap();
        assert_eq!(gross.commission_at(rate).minor(), 0);
    }

    #[test]
    fn test_commission_fractional_minor_units() {
        // 19.99 * 7.5% = 1.49925 -> 1.50 half-up
        let gross = Money::parse("19.99").unwrap();
        let rate = RateBps::from_percent_str("7.5").unwrap();
        assert_eq!(gross.commission_at(rate), Money::parse("1.5").unwrap());
    }

    #[test]
    fn test_rate_parse() {
        assert_eq!(RateBps::from_percent_str("15").unwrap().as_bps(), 1500);
        assert_eq!(RateBps::from_percent_str("2.5").unwrap().as_bps(), 250);
        assert_eq!(RateBps::from_percent_str("100").unwrap().as_bps(), 10_000);
    }

    #[test]
    fn test_rate_parse_rejects_out_of_range() {
        assert!(RateBps::from_percent_str("101").is_err());
        assert!(RateBps::from_percent_str("-1").is_err());
        assert!(RateBps::from_percent_str("0.005").is_err());
    }

    #[test]
    fn test_decimal_string_roundtrip() {
        assert_eq!(Money::parse("449.85").unwrap().to_decimal_string(), "449.85");
        assert_eq!(Money::parse("2999").unwrap().to_decimal_string(), "2999");
        assert_eq!(Money::zero().to_decimal_string(), "0");
    }

    #[test]
    fn test_rate_percent_string() {
        assert_eq!(RateBps::from_bps(1500).to_percent_string(), "15");
        assert_eq!(RateBps::from_bps(250).to_percent_string(), "2.5");
    }

    #[test]
    fn test_money_add() {
        let a = Money::parse("1.25").unwrap();
        let b = Money::parse("2.75").unwrap();
        assert_eq!(a + b, Money::parse("4").unwrap());
    }
}
